use thiserror::Error;

use crate::id::ChannelId;

/// Why a motion asset cannot be used by a clip pipeline or a blend tree.
#[non_exhaustive]
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum InvalidMotion {
    #[error("no clip was provided")]
    ClipMissing,
    #[error("the clip has no animated channels")]
    EmptyClip,
    #[error("the clip has no translation and rotation curves for motion channel {0:?}")]
    MissingMotionCurves(ChannelId),
    #[error("the rig has no bone for motion channel {0:?}")]
    MotionBoneNotInRig(ChannelId),
    #[error("motion channel {0:?} is not a descendant of the rig root")]
    MotionNotUnderRoot(ChannelId),
    #[error("motion channel {0:?} is the rig root and cannot be extracted in place")]
    MotionIsRoot(ChannelId),
}
