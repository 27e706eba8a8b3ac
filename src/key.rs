//! Chroma key extraction.
//!
//! Pixels are compared with the key color on the hue/chroma plane, so the key tolerates lighting
//! variance across a blue or green screen. The resulting coverage mask is feathered with a small
//! separable Gaussian to keep the edge band stable from frame to frame.

mod color;
mod extract;
mod feather;

pub use color::{KeyColor, sample_key_color};
pub use extract::{ChromaKeyMask, ChromaKeyer, KeyParams, extract};
pub use feather::feather_mask;
