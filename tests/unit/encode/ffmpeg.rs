use super::*;
use crate::foundation::core::Canvas;

#[test]
fn flatten_opaque_is_identity() {
    let src = vec![1u8, 2, 3, 255];
    let mut dst = vec![0u8; 4];
    flatten_to_opaque_rgba8(&mut dst, &src, [10, 20, 30, 255]).unwrap();
    assert_eq!(dst, src);
}

#[test]
fn flatten_transparent_returns_background() {
    let src = vec![200u8, 100, 50, 0];
    let mut dst = vec![0u8; 4];
    flatten_to_opaque_rgba8(&mut dst, &src, [10, 20, 30, 255]).unwrap();
    assert_eq!(dst, vec![10, 20, 30, 255]);
}

#[test]
fn flatten_half_alpha_over_black() {
    let src = vec![255u8, 0, 0, 128];
    let mut dst = vec![0u8; 4];
    flatten_to_opaque_rgba8(&mut dst, &src, [0, 0, 0, 255]).unwrap();
    assert_eq!(dst, vec![128, 0, 0, 255]);
}

#[test]
fn odd_dimensions_are_rejected_before_spawning() {
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(
        std::env::temp_dir().join("pipzoom_never_written.mp4"),
    ));
    let cfg = SinkConfig::new(
        Canvas {
            width: 11,
            height: 10,
        },
        Fps::new(30, 1).unwrap(),
    );
    assert!(matches!(sink.begin(cfg), Err(ComposeError::Validation(_))));
}

#[test]
fn missing_subtitle_file_is_rejected() {
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(
        std::env::temp_dir().join("pipzoom_never_written.mp4"),
    ));
    let mut cfg = SinkConfig::new(
        Canvas {
            width: 16,
            height: 16,
        },
        Fps::new(30, 1).unwrap(),
    );
    cfg.subtitles = Some(
        crate::subtitle::SubtitleTrack::new(
            "/definitely/not/here.srt",
            crate::subtitle::SubtitleStyle::default(),
        )
        .unwrap(),
    );
    assert!(sink.begin(cfg).is_err());
}

#[test]
fn push_before_begin_fails_and_abort_is_idempotent() {
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new("unused.mp4"));
    let frame = FrameRGBA::new_solid(2, 2, [0, 0, 0, 255]).unwrap();
    assert!(sink.push_frame(FrameIndex(0), &frame).is_err());
    sink.abort();
    sink.abort();
    assert!(sink.end().is_err());
}

#[test]
fn command_includes_audio_and_subtitle_wiring() {
    let sink = FfmpegSink::new(FfmpegSinkOpts::new("/tmp/out.mp4"));
    let mut cfg = SinkConfig::new(
        Canvas {
            width: 16,
            height: 16,
        },
        Fps::new(30000, 1001).unwrap(),
    );
    cfg.audio_source = Some(PathBuf::from("/tmp/bg.mp4"));
    cfg.subtitles = Some(
        crate::subtitle::SubtitleTrack::new("/tmp/s.srt", crate::subtitle::SubtitleStyle::default())
            .unwrap(),
    );
    let cmd = sink.build_command(&cfg, Path::new("/tmp/out.partial.mp4"));
    let args: Vec<String> = cmd
        .get_args()
        .map(|a| a.to_string_lossy().into_owned())
        .collect();
    let joined = args.join(" ");
    assert!(joined.contains("-r 30000/1001 -i pipe:0"));
    assert!(joined.contains("-i /tmp/bg.mp4 -map 0:v:0 -map 1:a:0? -c:a aac -shortest"));
    assert!(args.iter().any(|a| a.starts_with("subtitles='/tmp/s.srt'")));
    assert_eq!(args.last().map(String::as_str), Some("/tmp/out.partial.mp4"));
}

#[test]
fn consecutive_frames_are_written_once() {
    let mut out = Vec::new();
    let n = write_gap_filled(&mut out, &[1; 4], &[2; 4], Some(FrameIndex(4)), FrameIndex(5)).unwrap();
    assert_eq!(n, 1);
    assert_eq!(out, vec![2; 4]);
}

#[test]
fn skipped_slots_repeat_the_previous_frame() {
    let mut out = Vec::new();
    let n = write_gap_filled(&mut out, &[1; 4], &[2; 4], Some(FrameIndex(99)), FrameIndex(102))
        .unwrap();
    assert_eq!(n, 3);
    assert_eq!(out, [[1u8; 4], [1; 4], [2; 4]].concat());
}

#[test]
fn leading_gap_repeats_the_first_frame() {
    let mut out = Vec::new();
    let n = write_gap_filled(&mut out, &[], &[7; 4], None, FrameIndex(2)).unwrap();
    assert_eq!(n, 3);
    assert_eq!(out, vec![7; 12]);
}
