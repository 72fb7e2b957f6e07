use thiserror::Error;

use super::{BlendTreeError, ClipError};

/// Errors produced while reading configuration values from RON text.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not parse RON: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("could not write RON: {0}")]
    RonWrite(#[from] ron::Error),
    #[error("clip {0:?} is not known to the clip lookup")]
    UnknownClip(String),
    #[error("invalid clip: {0}")]
    Clip(#[from] ClipError),
    #[error("invalid blend tree: {0}")]
    BlendTree(#[from] BlendTreeError),
}
