use std::sync::Arc;

use bevy_rig_graph_core::{
    errors::{GraphError, GraphResult},
    interpolation::WeightedSum,
    rig::RigDefinition,
    stream::AnimationStream,
};

use crate::{
    edge_data::{DataRef, DataSpec},
    node::{NodeContext, NodeMessage, NodeResources, NodeSpec, PinId, RigNode},
};

/// Mixes any number of weighted streams into an owned output stream.
pub struct NMixer {
    sum: WeightedSum,
    output: AnimationStream,
}

impl NMixer {
    pub fn new(rig: &Arc<RigDefinition>, additive: bool) -> Self {
        Self {
            sum: WeightedSum::new(rig, additive),
            output: AnimationStream::new(rig, additive),
        }
    }

    pub fn rig(&self) -> &Arc<RigDefinition> {
        self.sum.rig()
    }

    /// Starts a new mix.
    pub fn clear(&mut self) {
        self.sum.clear();
    }

    /// Adds an input. A missing stream contributes the bind pose with its weight.
    pub fn add(&mut self, stream: Option<&AnimationStream>, weight: f32) -> GraphResult<()> {
        match stream {
            Some(stream) => self.sum.add(stream, weight),
            None => {
                self.sum.add_default(weight);
                Ok(())
            }
        }
    }

    pub fn total_weight(&self) -> f32 {
        self.sum.total_weight()
    }

    /// Resolves the inputs added since the last [`clear`](Self::clear).
    pub fn finish(&mut self) -> GraphResult<&AnimationStream> {
        self.sum.write_to(&mut self.output)?;
        Ok(&self.output)
    }

    pub fn output(&self) -> &AnimationStream {
        &self.output
    }
}

/// Mixes a resizable array of weighted inputs, `input[i]` with weight `weights[i]`.
#[derive(Default)]
pub struct NMixerNode {
    port_count: usize,
    additive: bool,
    mixer: Option<NMixer>,
}

impl NMixerNode {
    pub const IN_POSE: &'static str = "input";
    pub const IN_WEIGHT: &'static str = "weights";
    pub const OUT_POSE: &'static str = "output";

    pub fn new(rig: &Arc<RigDefinition>, port_count: usize) -> Self {
        Self {
            port_count,
            additive: false,
            mixer: Some(NMixer::new(rig, false)),
        }
    }

    pub fn port_count(&self) -> usize {
        self.port_count
    }

    pub fn set_port_count(&mut self, port_count: usize) {
        self.port_count = port_count;
    }

    /// Checks that `index` addresses one of the input ports.
    pub fn check_port(&self, pin: &'static str, index: usize) -> GraphResult<()> {
        if index < self.port_count {
            Ok(())
        } else {
            Err(GraphError::PortOutOfBounds {
                pin,
                index,
                len: self.port_count,
            })
        }
    }

    pub fn output(&self) -> Option<&AnimationStream> {
        self.mixer.as_ref().map(NMixer::output)
    }
}

impl RigNode for NMixerNode {
    fn display_name(&self) -> &'static str {
        "∑ N-Mix"
    }

    fn spec(&self, spec: &mut NodeSpec) {
        for index in 0..self.port_count {
            spec.add_input_data(PinId::indexed(Self::IN_POSE, index), DataSpec::Stream)
                .add_input_data(PinId::indexed(Self::IN_WEIGHT, index), DataSpec::F32);
        }
        spec.add_output_data(Self::OUT_POSE, DataSpec::Stream);
    }

    fn handle_message(&mut self, message: &NodeMessage, _: &NodeResources) -> GraphResult<()> {
        match message {
            NodeMessage::Rig(rig) => {
                self.mixer = Some(NMixer::new(rig, self.additive));
                Ok(())
            }
            NodeMessage::Additive(additive) => {
                self.additive = *additive;
                if let Some(mixer) = &mut self.mixer {
                    let rig = mixer.rig().clone();
                    *mixer = NMixer::new(&rig, *additive);
                }
                Ok(())
            }
            NodeMessage::PortCount(port_count) => {
                self.set_port_count(*port_count);
                Ok(())
            }
            other => Err(GraphError::UnsupportedMessage {
                node: self.display_name(),
                message: other.name(),
            }),
        }
    }

    fn update(&mut self, ctx: NodeContext) -> GraphResult<()> {
        let port_count = self.port_count;
        let Some(mixer) = &mut self.mixer else {
            return Err(GraphError::RigMissing);
        };

        mixer.clear();
        for index in 0..port_count {
            let weight = ctx.f32_back_or(PinId::indexed(Self::IN_WEIGHT, index), 0.)?;
            let stream = ctx
                .data_back_opt(PinId::indexed(Self::IN_POSE, index))
                .map(|data| data.as_stream())
                .transpose()?;
            mixer.add(stream, weight)?;
        }
        mixer.finish()?;
        Ok(())
    }

    fn output(&self, pin: PinId) -> Option<DataRef<'_>> {
        match pin.name {
            Self::OUT_POSE => self.output().map(DataRef::from),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use bevy::math::{Quat, Vec3};
    use bevy_rig_graph_core::test_fixtures::{one_bone_rig, test_rig};

    use super::*;
    use crate::node::InputList;

    fn posed(rig: &Arc<RigDefinition>) -> AnimationStream {
        let mut stream = AnimationStream::default_pose(rig);
        stream.set_translation(3, Vec3::new(0.2, 0.4, 0.1));
        stream.set_rotation(3, Quat::from_rotation_x(0.7));
        stream.set_scale(3, Vec3::splat(2.));
        stream.set_float(0, 0.9);
        stream.set_int(0, 3);
        stream
    }

    #[test]
    fn zero_weights_give_bind_pose() {
        let rig = test_rig();
        let pose = posed(&rig);
        let mut node = NMixerNode::new(&rig, 3);
        let inputs = InputList::new()
            .with(PinId::indexed(NMixerNode::IN_POSE, 0), &pose)
            .with(PinId::indexed(NMixerNode::IN_WEIGHT, 0), 0.4_f32)
            .with(PinId::indexed(NMixerNode::IN_POSE, 1), &pose)
            .with(PinId::indexed(NMixerNode::IN_WEIGHT, 1), -0.4_f32);
        node.update(NodeContext::new(&inputs)).unwrap();
        assert_eq!(node.output().unwrap(), &AnimationStream::default_pose(&rig));
    }

    #[test]
    fn single_full_weight_passes_through() {
        let rig = test_rig();
        let pose = posed(&rig);
        let mut node = NMixerNode::new(&rig, 2);
        let inputs = InputList::new()
            .with(PinId::indexed(NMixerNode::IN_POSE, 1), &pose)
            .with(PinId::indexed(NMixerNode::IN_WEIGHT, 1), 1_f32);
        node.update(NodeContext::new(&inputs)).unwrap();

        let output = node.output().unwrap();
        assert_eq!(output.translations(), pose.translations());
        assert_eq!(output.scales(), pose.scales());
        assert_eq!(output.floats(), pose.floats());
        assert_eq!(output.ints(), pose.ints());
        assert!(output.rotation(3).abs_diff_eq(pose.rotation(3), 1e-6));
        assert!((output.rotation(3).length() - 1.).abs() < 1e-6);
    }

    #[test]
    fn disconnected_inputs_weigh_bind_pose() {
        let rig = test_rig();
        let pose = posed(&rig);
        let mut mixer = NMixer::new(&rig, false);
        mixer.add(Some(&pose), 0.5).unwrap();
        mixer.add(None, 0.5).unwrap();
        let output = mixer.finish().unwrap();
        assert!(
            output
                .translation(3)
                .abs_diff_eq(Vec3::new(0.1, 0.4, 0.05), 1e-6)
        );
    }

    #[test]
    fn ports_are_bounded() {
        let rig = test_rig();
        let mut node = NMixerNode::new(&rig, 2);
        assert!(node.check_port(NMixerNode::IN_POSE, 1).is_ok());
        assert_eq!(
            node.check_port(NMixerNode::IN_POSE, 2),
            Err(GraphError::PortOutOfBounds {
                pin: NMixerNode::IN_POSE,
                index: 2,
                len: 2
            })
        );

        node.handle_message(&NodeMessage::PortCount(4), &NodeResources::default())
            .unwrap();
        assert!(node.check_port(NMixerNode::IN_WEIGHT, 3).is_ok());
        assert_eq!(node.node_spec().inputs().len(), 8);
    }

    #[test]
    fn inputs_of_another_rig_are_refused() {
        let rig = test_rig();
        let pose = posed(&rig);
        let other = AnimationStream::default_pose(&one_bone_rig());
        let mut node = NMixerNode::new(&rig, 2);
        let inputs = InputList::new()
            .with(PinId::indexed(NMixerNode::IN_POSE, 0), &pose)
            .with(PinId::indexed(NMixerNode::IN_WEIGHT, 0), 0.5_f32)
            .with(PinId::indexed(NMixerNode::IN_POSE, 1), &other)
            .with(PinId::indexed(NMixerNode::IN_WEIGHT, 1), 0.5_f32);
        assert_eq!(
            node.update(NodeContext::new(&inputs)),
            Err(GraphError::RigMismatch)
        );
    }
}
