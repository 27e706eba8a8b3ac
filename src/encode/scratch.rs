use std::path::{Path, PathBuf};

use crate::foundation::error::{ComposeError, ComposeResult};

/// A file that is deleted on drop unless [`persist`](ScratchFile::persist)ed.
#[derive(Debug)]
pub struct ScratchFile(Option<PathBuf>);

impl ScratchFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(Some(path.into()))
    }

    /// Scratch path next to `target`: `out.mp4` becomes `out.partial.mp4`.
    pub fn beside(target: &Path) -> Self {
        let stem = target
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_owned());
        let name = match target.extension() {
            Some(ext) => format!("{stem}.partial.{}", ext.to_string_lossy()),
            None => format!("{stem}.partial"),
        };
        Self::new(target.with_file_name(name))
    }

    pub fn path(&self) -> Option<&Path> {
        self.0.as_deref()
    }

    /// Move the scratch file to `target`, replacing it, and disarm the guard.
    pub fn persist(mut self, target: &Path) -> ComposeResult<()> {
        let Some(path) = self.0.take() else {
            return Err(ComposeError::resource("scratch file already released"));
        };
        if target.exists() {
            std::fs::remove_file(target).map_err(|e| {
                ComposeError::resource(format!(
                    "failed to replace '{}': {e}",
                    target.display()
                ))
            })?;
        }
        std::fs::rename(&path, target).map_err(|e| {
            let _ = std::fs::remove_file(&path);
            ComposeError::resource(format!(
                "failed to move '{}' to '{}': {e}",
                path.display(),
                target.display()
            ))
        })
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/scratch.rs"]
mod tests;
