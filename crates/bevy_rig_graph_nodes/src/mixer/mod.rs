mod n_mixer;

pub use n_mixer::{NMixer, NMixerNode};

use std::sync::Arc;

use bevy_rig_graph_core::{
    channel_weights::ChannelWeightTable,
    errors::{GraphError, GraphResult},
    interpolation::blend_linear,
    rig::RigDefinition,
    stream::AnimationStream,
};

use crate::{
    edge_data::{DataRef, DataSpec},
    node::{NodeContext, NodeMessage, NodeResources, NodeSpec, PinId, RigNode},
};

/// Blends two streams linearly. An input that is not connected is the bind pose.
#[derive(Default)]
pub struct MixerNode {
    default_pose: Option<AnimationStream>,
    output: Option<AnimationStream>,
}

impl MixerNode {
    pub const IN_POSE_A: &'static str = "input_a";
    pub const IN_POSE_B: &'static str = "input_b";
    pub const IN_WEIGHT: &'static str = "weight";
    pub const IN_WEIGHT_TABLE: &'static str = "weight_table";
    pub const OUT_POSE: &'static str = "output";

    pub fn new(rig: &Arc<RigDefinition>) -> Self {
        let mut node = Self::default();
        node.set_rig(rig);
        node
    }

    pub fn set_rig(&mut self, rig: &Arc<RigDefinition>) {
        let default_pose = AnimationStream::default_pose(rig);
        self.output = Some(default_pose.clone());
        self.default_pose = Some(default_pose);
    }

    /// `a * (1 - weight) + b * weight`, with `table` overriding the weight per channel.
    ///
    /// Inputs built for another rig than the node's fail with [`GraphError::RigMismatch`].
    pub fn mix(
        &mut self,
        a: Option<&AnimationStream>,
        b: Option<&AnimationStream>,
        weight: f32,
        table: Option<&ChannelWeightTable>,
    ) -> GraphResult<&AnimationStream> {
        let (Some(default_pose), Some(output)) = (&self.default_pose, &mut self.output) else {
            return Err(GraphError::RigMissing);
        };
        let a = a.unwrap_or(default_pose);
        let b = b.unwrap_or(default_pose);
        blend_linear(a, b, weight, table, output)?;
        Ok(&*output)
    }

    pub fn output(&self) -> Option<&AnimationStream> {
        self.output.as_ref()
    }
}

impl RigNode for MixerNode {
    fn display_name(&self) -> &'static str {
        "∑ Mix"
    }

    fn spec(&self, spec: &mut NodeSpec) {
        spec.add_input_data(Self::IN_POSE_A, DataSpec::Stream)
            .add_input_data(Self::IN_POSE_B, DataSpec::Stream)
            .add_input_data(Self::IN_WEIGHT, DataSpec::F32)
            .add_input_data(Self::IN_WEIGHT_TABLE, DataSpec::WeightTable)
            .add_output_data(Self::OUT_POSE, DataSpec::Stream);
    }

    fn handle_message(&mut self, message: &NodeMessage, _: &NodeResources) -> GraphResult<()> {
        match message {
            NodeMessage::Rig(rig) => {
                self.set_rig(rig);
                Ok(())
            }
            other => Err(GraphError::UnsupportedMessage {
                node: self.display_name(),
                message: other.name(),
            }),
        }
    }

    fn update(&mut self, ctx: NodeContext) -> GraphResult<()> {
        let a = ctx
            .data_back_opt(Self::IN_POSE_A)
            .map(|data| data.as_stream())
            .transpose()?;
        let b = ctx
            .data_back_opt(Self::IN_POSE_B)
            .map(|data| data.as_stream())
            .transpose()?;
        let weight = ctx.f32_back_or(Self::IN_WEIGHT, 0.)?;
        let table = ctx
            .data_back_opt(Self::IN_WEIGHT_TABLE)
            .map(|data| data.as_weight_table())
            .transpose()?;

        self.mix(a, b, weight, table)?;
        Ok(())
    }

    fn output(&self, pin: PinId) -> Option<DataRef<'_>> {
        match pin.name {
            Self::OUT_POSE => self.output().map(DataRef::from),
            _ => None,
        }
    }
}
