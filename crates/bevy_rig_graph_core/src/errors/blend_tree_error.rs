use thiserror::Error;

use super::InvalidMotion;

/// Construction errors of blend tree definitions. These are reported when the definition is
/// built, before any node uses it.
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BlendTreeError {
    #[error("a blend tree needs at least one motion")]
    Empty,
    #[error("threshold {current} of motion {index} is lower than the previous threshold {previous}")]
    ThresholdOrder {
        index: usize,
        previous: f32,
        current: f32,
    },
    #[error("threshold of motion {0} is not a finite number")]
    NonFiniteThreshold(usize),
    #[error("position of motion {0} is not a finite point")]
    NonFinitePosition(usize),
    #[error("motion {index} has speed {speed}, speeds must be finite and non-zero")]
    InvalidSpeed { index: usize, speed: f32 },
    #[error("motions {first} and {second} share the same position")]
    DuplicatePosition { first: usize, second: usize },
    #[error("motion {index} is unusable: {reason}")]
    InvalidMotion { index: usize, reason: InvalidMotion },
}
