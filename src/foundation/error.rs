use crate::effect::CyclePhase;

pub type ComposeResult<T> = Result<T, ComposeError>;

#[derive(thiserror::Error, Debug)]
pub enum ComposeError {
    /// Invalid configuration; raised before any frame is processed.
    #[error("config error: {0}")]
    Config(String),

    #[error("validation error: {0}")]
    Validation(String),

    /// A single frame could not be decoded. Recoverable through retry/skip.
    #[error("frame decode error at frame {seq}: {detail}")]
    FrameDecode { seq: u64, detail: String },

    /// Mask, frame or buffer geometry disagree. Never retried.
    #[error("dimension mismatch at frame {seq}: {detail}")]
    DimensionMismatch { seq: u64, detail: String },

    /// Scratch storage, child process or sink failure.
    #[error("resource error: {0}")]
    Resource(String),

    /// A per-frame failure escalated to the run, with the context needed to locate it.
    #[error(
        "pipeline error at frame {} (t={:.3}s, phase {}): {}",
        .seq,
        .pts,
        phase_label(.phase),
        .source
    )]
    Pipeline {
        seq: u64,
        pts: f64,
        phase: Option<CyclePhase>,
        #[source]
        source: Box<ComposeError>,
    },

    #[error("run cancelled")]
    Cancelled,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn phase_label(phase: &Option<CyclePhase>) -> String {
    match phase {
        Some(p) => p.to_string(),
        None => "n/a".to_owned(),
    }
}

impl ComposeError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn resource(msg: impl Into<String>) -> Self {
        Self::Resource(msg.into())
    }

    pub fn frame_decode(seq: u64, detail: impl Into<String>) -> Self {
        Self::FrameDecode {
            seq,
            detail: detail.into(),
        }
    }

    pub fn dimension_mismatch(seq: u64, detail: impl Into<String>) -> Self {
        Self::DimensionMismatch {
            seq,
            detail: detail.into(),
        }
    }

    pub fn pipeline(seq: u64, pts: f64, phase: Option<CyclePhase>, source: ComposeError) -> Self {
        Self::Pipeline {
            seq,
            pts,
            phase,
            source: Box::new(source),
        }
    }

    /// `true` for errors the per-frame retry/skip policy may absorb.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::FrameDecode { .. })
    }

    /// The innermost error, unwrapping [`ComposeError::Pipeline`] context layers.
    pub fn root(&self) -> &ComposeError {
        match self {
            Self::Pipeline { source, .. } => source.root(),
            other => other,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
