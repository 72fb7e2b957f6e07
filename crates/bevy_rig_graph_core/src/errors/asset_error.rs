use thiserror::Error;

use crate::{id::ChannelId, rig::ChannelKind};

/// Errors produced while building a [`RigDefinition`](crate::rig::RigDefinition).
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RigError {
    #[error("bone {0:?} is declared twice")]
    DuplicateBone(ChannelId),
    #[error("{kind:?} channel {id:?} is declared twice")]
    DuplicateChannel { kind: ChannelKind, id: ChannelId },
    #[error("bone {bone} references parent {parent}, parents must be declared before children")]
    ParentOutOfOrder { bone: usize, parent: usize },
    #[error("root bone index {index} is out of range for a rig with {bone_count} bones")]
    RootOutOfRange { index: usize, bone_count: usize },
}

/// Errors produced while building a [`Clip`](crate::clip::Clip).
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClipError {
    #[error("clip duration must be finite and non-negative, got {0}")]
    InvalidDuration(f32),
    #[error("clip sample rate must be finite and positive, got {0}")]
    InvalidSampleRate(f32),
    #[error("{kind:?} curve {id:?} has {found} keys, expected {expected}")]
    KeyCountMismatch {
        kind: ChannelKind,
        id: ChannelId,
        expected: usize,
        found: usize,
    },
    #[error("{kind:?} curve {id:?} is declared twice")]
    DuplicateCurve { kind: ChannelKind, id: ChannelId },
}
