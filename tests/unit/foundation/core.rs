use super::*;

#[test]
fn fps_rejects_zero_parts() {
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(30, 0).is_err());
}

#[test]
fn fps_parses_ffmpeg_ratios() {
    assert_eq!(Fps::parse_ratio("30/1").unwrap(), Fps { num: 30, den: 1 });
    assert_eq!(
        Fps::parse_ratio("30000/1001").unwrap(),
        Fps {
            num: 30000,
            den: 1001
        }
    );
    assert_eq!(Fps::parse_ratio("25").unwrap(), Fps { num: 25, den: 1 });
    assert!(Fps::parse_ratio("0/0").is_err());
    assert!(Fps::parse_ratio("abc").is_err());
}

#[test]
fn fps_time_conversions() {
    let fps = Fps::new(30, 1).unwrap();
    assert!((fps.frames_to_secs(45) - 1.5).abs() < 1e-12);
    assert_eq!(fps.secs_to_frames_floor(1.51), 45);
    assert_eq!(fps.secs_to_frames_floor(-3.0), 0);
}

#[test]
fn canvas_rgba_len() {
    let c = Canvas {
        width: 4,
        height: 3,
    };
    assert_eq!(c.rgba_len().unwrap(), 48);
    assert_eq!(c.pixel_count(), 12);
    assert_eq!(c.to_string(), "4x3");
}
