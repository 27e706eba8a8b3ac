use std::collections::HashMap;

use crate::foundation::core::Fps;
use crate::foundation::error::{ComposeError, ComposeResult};
use crate::frame::{Frame, FrameRGBA};
use crate::source::{FrameSource, SourceInfo};

/// In-memory clip. Timestamps are `seq / fps`.
///
/// Decode failures can be injected per slot to exercise retry and skip handling.
#[derive(Clone, Debug)]
pub struct MemorySource {
    info: SourceInfo,
    frames: Vec<FrameRGBA>,
    cursor: usize,
    failures: HashMap<u64, u32>,
    reads: u64,
}

impl MemorySource {
    pub fn new(fps: Fps, frames: Vec<FrameRGBA>) -> Self {
        let (width, height) = frames
            .first()
            .map(|f| (f.width, f.height))
            .unwrap_or((0, 0));
        let count = frames.len() as u64;
        Self {
            info: SourceInfo {
                width,
                height,
                fps,
                duration_secs: fps.frames_to_secs(count),
                frame_count: Some(count),
                path: None,
                has_audio: false,
            },
            frames,
            cursor: 0,
            failures: HashMap::new(),
            reads: 0,
        }
    }

    /// `count` solid frames of one color.
    pub fn solid(
        fps: Fps,
        width: u32,
        height: u32,
        rgba: [u8; 4],
        count: usize,
    ) -> ComposeResult<Self> {
        let frame = FrameRGBA::new_solid(width, height, rgba)?;
        Ok(Self::new(fps, vec![frame; count]))
    }

    /// Make the next `count` reads of slot `seq` fail with [`ComposeError::FrameDecode`].
    pub fn inject_decode_failures(&mut self, seq: u64, count: u32) {
        *self.failures.entry(seq).or_insert(0) += count;
    }

    /// Successful and failed `next_frame` calls so far.
    pub fn reads(&self) -> u64 {
        self.reads
    }

    pub fn position(&self) -> u64 {
        self.cursor as u64
    }
}

impl FrameSource for MemorySource {
    fn info(&self) -> &SourceInfo {
        &self.info
    }

    fn next_frame(&mut self) -> ComposeResult<Option<Frame>> {
        let Some(image) = self.frames.get(self.cursor) else {
            return Ok(None);
        };
        self.reads += 1;
        let seq = self.cursor as u64;
        if let Some(left) = self.failures.get_mut(&seq)
            && *left > 0
        {
            *left -= 1;
            return Err(ComposeError::frame_decode(seq, "injected decode failure"));
        }
        let frame = Frame::new(seq, self.info.fps.frames_to_secs(seq), image.clone());
        self.cursor += 1;
        Ok(Some(frame))
    }

    fn skip_frame(&mut self) -> ComposeResult<()> {
        if self.cursor < self.frames.len() {
            self.cursor += 1;
        }
        Ok(())
    }

    fn rewind(&mut self) -> ComposeResult<()> {
        self.cursor = 0;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/source/memory.rs"]
mod tests;
