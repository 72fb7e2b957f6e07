use std::sync::Arc;

use bevy_rig_graph_core::{
    clip::Clip, clip_configuration::ClipConfiguration, id::ChannelId, rig::RigDefinition,
};

use crate::blend_tree::{BlendTree1D, BlendTree2D};

/// Configuration sent to a node outside of evaluation. Nodes rebuild their internal state
/// while handling a message, so messages never interleave with an evaluation.
#[derive(Clone, Debug)]
pub enum NodeMessage {
    Rig(Arc<RigDefinition>),
    Clip(Option<Arc<Clip>>),
    Configuration(ClipConfiguration),
    BlendTree1D(Arc<BlendTree1D>),
    BlendTree2D(Arc<BlendTree2D>),
    Additive(bool),
    SkipRoot(bool),
    DefaultWeight(Option<f32>),
    /// Replaces every per-channel weight override.
    ChannelWeights(Vec<(ChannelId, f32)>),
    PortCount(usize),
}

impl NodeMessage {
    pub fn name(&self) -> &'static str {
        match self {
            NodeMessage::Rig(_) => "Rig",
            NodeMessage::Clip(_) => "Clip",
            NodeMessage::Configuration(_) => "Configuration",
            NodeMessage::BlendTree1D(_) => "BlendTree1D",
            NodeMessage::BlendTree2D(_) => "BlendTree2D",
            NodeMessage::Additive(_) => "Additive",
            NodeMessage::SkipRoot(_) => "SkipRoot",
            NodeMessage::DefaultWeight(_) => "DefaultWeight",
            NodeMessage::ChannelWeights(_) => "ChannelWeights",
            NodeMessage::PortCount(_) => "PortCount",
        }
    }
}
