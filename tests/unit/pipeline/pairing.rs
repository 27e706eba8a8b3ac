use super::*;
use crate::foundation::core::Fps;
use crate::frame::FrameRGBA;
use crate::source::MemorySource;

/// Foreground clip whose frame `i` has red channel `i`.
fn numbered(fps: Fps, count: u8) -> MemorySource {
    let frames = (0..count)
        .map(|i| FrameRGBA::new_solid(2, 2, [i, 0, 0, 255]).unwrap())
        .collect();
    MemorySource::new(fps, frames)
}

fn start(src: &mut MemorySource, policy: FgEndPolicy) -> (FramePairer, RetryingReader) {
    let mut reader = RetryingReader::new(0, 0);
    let first = match reader.read(src, "fg").unwrap() {
        ReadOutcome::Frame(f) => f,
        other => panic!("unexpected {other:?}"),
    };
    let secs = src.info().fps.frame_duration_secs();
    (FramePairer::new(first, policy, secs), reader)
}

fn tag(frame: &SharedFrame) -> u8 {
    frame.image.data[0]
}

#[test]
fn picks_nearest_foreground_timestamp() {
    // Foreground at 10 fps, background sampled at 25 fps.
    let mut fg = numbered(Fps::new(10, 1).unwrap(), 10);
    let (mut pairer, mut reader) = start(&mut fg, FgEndPolicy::Hold);
    let picks: Vec<u8> = [0.0, 0.04, 0.08, 0.12, 0.16, 0.2]
        .iter()
        .map(|&t| tag(&pairer.frame_for(t, &mut fg, &mut reader).unwrap()))
        .collect();
    assert_eq!(picks, vec![0, 0, 1, 1, 2, 2]);
}

#[test]
fn ties_go_to_the_later_frame() {
    let mut fg = numbered(Fps::new(10, 1).unwrap(), 4);
    let (mut pairer, mut reader) = start(&mut fg, FgEndPolicy::Hold);
    let f = pairer.frame_for(0.25, &mut fg, &mut reader).unwrap();
    assert!(tag(&f) == 2 || tag(&f) == 3);
    let f = pairer.frame_for(0.05, &mut fg, &mut reader).unwrap();
    // Time never moves backwards for the pairer; it keeps the current frame.
    assert_eq!(tag(&f), tag(pairer.current()));
}

#[test]
fn hold_policy_repeats_last_frame() {
    let mut fg = numbered(Fps::new(10, 1).unwrap(), 3);
    let (mut pairer, mut reader) = start(&mut fg, FgEndPolicy::Hold);
    let f = pairer.frame_for(5.0, &mut fg, &mut reader).unwrap();
    assert_eq!(tag(&f), 2);
    let again = pairer.frame_for(9.0, &mut fg, &mut reader).unwrap();
    assert!(Arc::ptr_eq(&f, &again));
    assert_eq!(pairer.loops(), 0);
}

#[test]
fn loop_policy_restarts_with_offset() {
    // Three frames at 10 fps loop every 0.3 s.
    let mut fg = numbered(Fps::new(10, 1).unwrap(), 3);
    let (mut pairer, mut reader) = start(&mut fg, FgEndPolicy::Loop);
    let picks: Vec<u8> = [0.0, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7]
        .iter()
        .map(|&t| tag(&pairer.frame_for(t, &mut fg, &mut reader).unwrap()))
        .collect();
    assert_eq!(picks, vec![0, 1, 2, 0, 1, 2, 0, 1]);
    assert_eq!(pairer.loops(), 2);
}

#[test]
fn skipped_foreground_frames_are_passed_over() {
    let mut fg = numbered(Fps::new(10, 1).unwrap(), 4);
    fg.inject_decode_failures(1, 100);
    let mut reader = RetryingReader::new(0, 5);
    let first = match reader.read(&mut fg, "fg").unwrap() {
        ReadOutcome::Frame(f) => f,
        other => panic!("unexpected {other:?}"),
    };
    let mut pairer = FramePairer::new(first, FgEndPolicy::Hold, 0.1);
    let f = pairer.frame_for(0.1, &mut fg, &mut reader).unwrap();
    assert_ne!(tag(&f), 1);
    let f = pairer.frame_for(0.3, &mut fg, &mut reader).unwrap();
    assert_eq!(tag(&f), 3);
}
