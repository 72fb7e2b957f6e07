//! # Bevy Rig Graph Nodes
//!
//! The nodes of a rig graph, built on the data model of `bevy_rig_graph_core`:
//! - [`ConfigurableClipNode`](composer::ConfigurableClipNode): samples a clip through a
//!   pipeline rebuilt from its [`ClipConfiguration`](bevy_rig_graph_core::clip_configuration::ClipConfiguration)
//!   (normalized time, looping, in-place extraction, root motion).
//! - [`BlendTree1DNode`](blend_tree::BlendTree1DNode) and
//!   [`BlendTree2DNode`](blend_tree::BlendTree2DNode): blend looping motions by a control
//!   parameter.
//! - [`MixerNode`](mixer::MixerNode) and [`NMixerNode`](mixer::NMixerNode): two-input and
//!   N-input stream mixers.
//! - [`WeightBuilderNode`](weight_builder_node::WeightBuilderNode): per-channel weight tables
//!   for partial blends.
//!
//! Root motion helpers and the [`RootMotionAccumulator`](root_motion::RootMotionAccumulator)
//! live in [`root_motion`], offline baking in [`bake`].

pub mod bake;
pub mod blend_tree;
pub mod composer;
pub mod edge_data;
pub mod mixer;
pub mod node;
pub mod root_motion;
pub mod weight_builder_node;

pub mod prelude {
    pub use super::bake::bake_clip;
    pub use super::blend_tree::*;
    pub use super::composer::{ConfigurableClipNode, StageDesc, desired_shape};
    pub use super::edge_data::{DataRef, DataSpec, DataValue};
    pub use super::mixer::{MixerNode, NMixer, NMixerNode};
    pub use super::node::*;
    pub use super::root_motion::*;
    pub use super::weight_builder_node::WeightBuilderNode;
}
