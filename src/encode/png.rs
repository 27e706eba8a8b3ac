use std::path::{Path, PathBuf};

use crate::encode::ffmpeg::ensure_parent_dir;
use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{ComposeError, ComposeResult};
use crate::frame::FrameRGBA;

/// Writes each frame as `<prefix>_<index>.png` into a directory. Meant for debugging.
///
/// Files written by an aborted run are removed.
pub struct PngSequenceSink {
    dir: PathBuf,
    prefix: String,
    written: Vec<PathBuf>,
    cfg: Option<SinkConfig>,
}

impl PngSequenceSink {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            written: Vec::new(),
            cfg: None,
        }
    }

    pub fn frame_path(&self, idx: FrameIndex) -> PathBuf {
        self.dir.join(format!("{}_{:06}.png", self.prefix, idx.0))
    }

    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

/// Save one RGBA8 frame as PNG.
pub fn save_png(path: &Path, frame: &FrameRGBA) -> ComposeResult<()> {
    ensure_parent_dir(path)?;
    image::save_buffer_with_format(
        path,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .map_err(|e| ComposeError::resource(format!("write png '{}': {e}", path.display())))
}

impl FrameSink for PngSequenceSink {
    fn begin(&mut self, cfg: SinkConfig) -> ComposeResult<()> {
        if cfg.subtitles.is_some() {
            tracing::warn!("png sequence sink ignores subtitles");
        }
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            ComposeError::resource(format!(
                "create output directory '{}': {e}",
                self.dir.display()
            ))
        })?;
        self.written.clear();
        self.cfg = Some(cfg);
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> ComposeResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| ComposeError::resource("png sink not started"))?;
        if frame.canvas() != cfg.canvas() {
            return Err(ComposeError::dimension_mismatch(
                idx.0,
                format!("frame is {}, sink expects {}", frame.canvas(), cfg.canvas()),
            ));
        }
        let path = self.frame_path(idx);
        save_png(&path, frame)?;
        self.written.push(path);
        Ok(())
    }

    fn end(&mut self) -> ComposeResult<()> {
        self.cfg = None;
        Ok(())
    }

    fn abort(&mut self) {
        for path in self.written.drain(..) {
            let _ = std::fs::remove_file(path);
        }
        self.cfg = None;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/png.rs"]
mod tests;
