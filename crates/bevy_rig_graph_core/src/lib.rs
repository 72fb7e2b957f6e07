//! # Bevy Rig Graph Core
//!
//! Data model shared by every rig graph node:
//! - [`RigDefinition`](rig::RigDefinition): immutable skeleton and channel bindings, shared as
//!   `Arc<RigDefinition>` by everything that animates the rig.
//! - [`AnimationStream`](stream::AnimationStream): per-instance channel values with a pass mask
//!   and a frame mask. A channel that was not written this pass reads as its default.
//! - [`Clip`](clip::Clip) and [`ClipInstance`](clip::ClipInstance): dense clips and their
//!   binding to a rig, memoized by [`ClipInstanceCache`](clip::ClipInstanceCache).
//! - [`ClipConfiguration`](clip_configuration::ClipConfiguration): the flags that decide how a
//!   clip is sampled (normalized time, looping, root motion).
//! - Stream interpolation in [`interpolation`]: two-input linear blends, additive and difference
//!   streams, and the N-input [`WeightedSum`](interpolation::WeightedSum).

pub mod channel_mask;
pub mod channel_weights;
pub mod clip;
pub mod clip_configuration;
pub mod errors;
pub mod id;
pub mod interpolation;
pub mod rig;
pub mod stream;
#[cfg(any(test, feature = "test-fixtures"))]
pub mod test_fixtures;
pub mod transform;

pub mod prelude {
    pub use super::channel_mask::ChannelMask;
    pub use super::channel_weights::ChannelWeightTable;
    pub use super::clip::{ChannelCurve, Clip, ClipBuilder, ClipInstance, ClipInstanceCache};
    pub use super::clip_configuration::{ClipConfiguration, ClipConfigurationMask};
    pub use super::errors::*;
    pub use super::id::ChannelId;
    pub use super::interpolation::*;
    pub use super::rig::{ChannelKind, RigBuilder, RigDefinition};
    pub use super::stream::{AnimationStream, RootPolicy};
    pub use super::transform::RigidTransformExt;
}
