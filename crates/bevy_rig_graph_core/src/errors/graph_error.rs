use thiserror::Error;

use super::{BlendTreeError, ClipError, InvalidMotion};

/// Possible errors that can be produced by configuring or evaluating rig graph nodes
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GraphError {
    #[error("invalid motion: {0}")]
    InvalidMotion(#[from] InvalidMotion),
    #[error("the rig has no root bone, root motion cannot be computed")]
    MissingRoot,
    #[error("port {pin}[{index}] is out of bounds, the port array has {len} entries")]
    PortOutOfBounds {
        pin: &'static str,
        index: usize,
        len: usize,
    },
    #[error("node has no pin named {0:?}")]
    UnknownPin(String),
    #[error("tried to convert to incorrect data type: expected {0}, got {1}")]
    MismatchedDataType(String, String),
    #[error("node handle does not refer to a live node")]
    UnknownNode,
    #[error("node {node} does not accept {message} messages")]
    UnsupportedMessage {
        node: &'static str,
        message: &'static str,
    },
    #[error("connections form a cycle, the graph cannot be ordered")]
    CyclicGraph,
    #[error("a rig must be provided before this operation")]
    RigMissing,
    #[error("streams of different rigs cannot be combined")]
    RigMismatch,
    #[error("a blend tree must be provided before this operation")]
    BlendTreeMissing,
    #[error("invalid blend tree: {0}")]
    BlendTree(#[from] BlendTreeError),
    #[error("invalid clip: {0}")]
    Clip(#[from] ClipError),
}

pub type GraphResult<T> = Result<T, GraphError>;
