mod order;
mod pin;

pub use order::topological_order;
pub use pin::*;

use bevy::log::trace;
use bevy_rig_graph_core::errors::{GraphError, GraphResult};
use bevy_rig_graph_nodes::{
    edge_data::{DataRef, DataSpec, DataValue},
    node::{InputResolver, NodeContext, NodeMessage, NodeResources, PinId, RigNode},
};
use indexmap::IndexMap;

use crate::node_kind::NodeKind;

#[derive(Default)]
struct Slot {
    generation: u32,
    node: Option<NodeKind>,
}

/// Host of a rig graph: an arena of nodes, the connections between their pins and constant
/// inputs.
///
/// Nodes are evaluated in topological order. The order is derived again after any change to
/// the nodes or connections, and a connection that would close a cycle is refused.
#[derive(Default)]
pub struct NodeSet {
    slots: Vec<Slot>,
    connections: IndexMap<TargetPin, SourcePin>,
    constants: IndexMap<TargetPin, DataValue>,
    resources: NodeResources,
    order: Option<Vec<NodeId>>,
}

impl NodeSet {
    pub fn new(resources: NodeResources) -> Self {
        Self {
            resources,
            ..Self::default()
        }
    }

    pub fn resources(&self) -> &NodeResources {
        &self.resources
    }

    pub fn add_node(&mut self, node: impl Into<NodeKind>) -> NodeId {
        let node = Some(node.into());
        self.order = None;

        if let Some(index) = self.slots.iter().position(|slot| slot.node.is_none()) {
            let slot = &mut self.slots[index];
            slot.generation = slot.generation.wrapping_add(1);
            slot.node = node;
            return NodeId {
                index: index as u32,
                generation: slot.generation,
            };
        }

        self.slots.push(Slot {
            generation: 0,
            node,
        });
        NodeId {
            index: (self.slots.len() - 1) as u32,
            generation: 0,
        }
    }

    /// Destroys a node together with its connections and constant inputs.
    pub fn remove_node(&mut self, id: NodeId) -> GraphResult<NodeKind> {
        let node = self
            .slot_mut(id)
            .and_then(|slot| slot.node.take())
            .ok_or(GraphError::UnknownNode)?;
        self.connections
            .retain(|target, source| target.node != id && source.node != id);
        self.constants.retain(|target, _| target.node != id);
        self.order = None;
        Ok(node)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: NodeId) -> Option<&NodeKind> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    /// Direct access to a node. Pins changed this way are only checked by the next message
    /// sent through [`send_message`](Self::send_message).
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut NodeKind> {
        self.slot_mut(id).and_then(|slot| slot.node.as_mut())
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.slots.len()).filter_map(|index| self.live_id(index))
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.node.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Connects an output pin to an input pin, replacing the input's previous connection.
    pub fn connect(&mut self, source: SourcePin, target: TargetPin) -> GraphResult<()> {
        let produced = output_spec(self.node_ref(source.node)?, source.pin)?;
        let expected = input_spec(self.node_ref(target.node)?, target.pin)?;
        if produced != expected {
            return Err(mismatch(expected, produced));
        }

        let previous = self.connections.insert(target, source);
        if let Err(error) = self.rebuild_order() {
            match previous {
                Some(previous) => {
                    self.connections.insert(target, previous);
                }
                None => {
                    self.connections.shift_remove(&target);
                }
            }
            self.order = None;
            return Err(error);
        }
        Ok(())
    }

    pub fn disconnect(&mut self, target: TargetPin) -> Option<SourcePin> {
        let source = self.connections.shift_remove(&target)?;
        self.order = None;
        Some(source)
    }

    pub fn connection(&self, target: TargetPin) -> Option<SourcePin> {
        self.connections.get(&target).copied()
    }

    /// Sets a constant input. Connections take precedence over constants.
    pub fn set_data(&mut self, target: TargetPin, value: impl Into<DataValue>) -> GraphResult<()> {
        let value = value.into();
        let expected = input_spec(self.node_ref(target.node)?, target.pin)?;
        if value.spec() != expected {
            return Err(mismatch(expected, value.spec()));
        }
        self.constants.insert(target, value);
        Ok(())
    }

    /// Data type of an input pin.
    pub fn input_data_spec(&self, target: TargetPin) -> GraphResult<DataSpec> {
        input_spec(self.node_ref(target.node)?, target.pin)
    }

    /// Data type of an output pin.
    pub fn output_data_spec(&self, source: SourcePin) -> GraphResult<DataSpec> {
        output_spec(self.node_ref(source.node)?, source.pin)
    }

    pub fn clear_data(&mut self, target: TargetPin) -> Option<DataValue> {
        self.constants.shift_remove(&target)
    }

    /// Sends `message` to a node. Connections and constants of pins the node no longer has
    /// afterwards are dropped.
    pub fn send_message(&mut self, id: NodeId, message: &NodeMessage) -> GraphResult<()> {
        let index = id.index as usize;
        let node = self
            .slots
            .get_mut(index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
            .ok_or(GraphError::UnknownNode)?;

        let result = node.handle_message(message, &self.resources);
        self.prune_pins(id);
        result
    }

    /// Sends `message` to every node, skipping nodes that do not accept it. All nodes receive
    /// the message even if one of them fails, and the first failure is returned.
    pub fn broadcast(&mut self, message: &NodeMessage) -> GraphResult<()> {
        let ids: Vec<NodeId> = self.node_ids().collect();
        let mut result = Ok(());
        for id in ids {
            match self.send_message(id, message) {
                Ok(()) | Err(GraphError::UnsupportedMessage { .. }) => {}
                Err(error) => {
                    if result.is_ok() {
                        result = Err(error);
                    }
                }
            }
        }
        result
    }

    /// Resizes the port arrays of a node.
    pub fn resize_ports(&mut self, id: NodeId, port_count: usize) -> GraphResult<()> {
        self.send_message(id, &NodeMessage::PortCount(port_count))
    }

    pub fn evaluation_order(&mut self) -> GraphResult<&[NodeId]> {
        if self.order.is_none() {
            self.rebuild_order()?;
        }
        Ok(self.order.as_deref().unwrap_or_default())
    }

    /// Updates every node once, upstream nodes first.
    pub fn evaluate(&mut self) -> GraphResult<()> {
        if self.order.is_none() {
            self.rebuild_order()?;
        }
        let order = self.order.take().unwrap_or_default();
        let mut result = Ok(());
        for id in &order {
            result = self.evaluate_node(*id);
            if result.is_err() {
                break;
            }
        }
        self.order = Some(order);
        result
    }

    /// The value of an output pin, as of the last evaluation.
    pub fn output(&self, source: SourcePin) -> Option<DataRef<'_>> {
        self.get(source.node)?.output(source.pin)
    }

    fn evaluate_node(&mut self, id: NodeId) -> GraphResult<()> {
        let index = id.index as usize;
        let mut node = self
            .slots
            .get_mut(index)
            .and_then(|slot| slot.node.take())
            .ok_or(GraphError::UnknownNode)?;

        let result = node.update(NodeContext::new(&NodeInputs {
            set: &*self,
            node: id,
        }));
        self.slots[index].node = Some(node);
        result
    }

    fn rebuild_order(&mut self) -> GraphResult<()> {
        let edges = self.connections.iter().map(|(target, source)| {
            (source.node.index as usize, target.node.index as usize)
        });
        let order: Vec<NodeId> = topological_order(self.slots.len(), edges)?
            .into_iter()
            .filter_map(|index| self.live_id(index))
            .collect();
        trace!("Rig graph evaluation order: {order:?}");
        self.order = Some(order);
        Ok(())
    }

    fn prune_pins(&mut self, id: NodeId) {
        let Some(spec) = self.get(id).map(RigNode::node_spec) else {
            return;
        };
        let before = self.connections.len() + self.constants.len();
        self.connections.retain(|target, source| {
            (target.node != id || spec.input(target.pin).is_some())
                && (source.node != id || spec.output(source.pin).is_some())
        });
        self.constants
            .retain(|target, _| target.node != id || spec.input(target.pin).is_some());

        let removed = before - self.connections.len() - self.constants.len();
        if removed > 0 {
            trace!("Dropped {removed} inputs of node {id} that no longer exist");
            self.order = None;
        }
    }

    fn node_ref(&self, id: NodeId) -> GraphResult<&NodeKind> {
        self.get(id).ok_or(GraphError::UnknownNode)
    }

    fn slot_mut(&mut self, id: NodeId) -> Option<&mut Slot> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
    }

    fn live_id(&self, index: usize) -> Option<NodeId> {
        let slot = self.slots.get(index)?;
        slot.node.as_ref().map(|_| NodeId {
            index: index as u32,
            generation: slot.generation,
        })
    }
}

/// Inputs of one node: connected outputs of other nodes, then constants.
struct NodeInputs<'a> {
    set: &'a NodeSet,
    node: NodeId,
}

impl InputResolver for NodeInputs<'_> {
    fn resolve(&self, pin: PinId) -> Option<DataRef<'_>> {
        let target = TargetPin {
            node: self.node,
            pin,
        };
        if let Some(source) = self.set.connections.get(&target) {
            return self.set.output(*source);
        }
        self.set.constants.get(&target).map(DataValue::as_data_ref)
    }
}

fn input_spec(node: &NodeKind, pin: PinId) -> GraphResult<DataSpec> {
    let spec = node.node_spec();
    spec.input(pin)
        .ok_or_else(|| unknown_pin(spec.inputs(), pin))
}

fn output_spec(node: &NodeKind, pin: PinId) -> GraphResult<DataSpec> {
    let spec = node.node_spec();
    spec.output(pin)
        .ok_or_else(|| unknown_pin(spec.outputs(), pin))
}

/// Out of bounds for an index into an existing port array, unknown otherwise.
fn unknown_pin(pins: &[(PinId, DataSpec)], pin: PinId) -> GraphError {
    if let Some(index) = pin.index {
        let len = pins
            .iter()
            .filter(|(candidate, _)| candidate.name == pin.name && candidate.index.is_some())
            .count();
        if len > 0 {
            return GraphError::PortOutOfBounds {
                pin: pin.name,
                index,
                len,
            };
        }
    }
    GraphError::UnknownPin(pin.to_string())
}

fn mismatch(expected: DataSpec, found: DataSpec) -> GraphError {
    GraphError::MismatchedDataType(format!("{expected:?}"), format!("{found:?}"))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bevy::math::{Vec2, Vec3};
    use bevy_rig_graph_core::{
        clip::Clip,
        clip_configuration::ClipConfiguration,
        rig::RigDefinition,
        stream::AnimationStream,
        test_fixtures::{one_bone_rig, pose_clip, test_rig},
    };
    use bevy_rig_graph_nodes::{
        composer::ConfigurableClipNode,
        mixer::{MixerNode, NMixerNode},
        weight_builder_node::WeightBuilderNode,
    };

    use super::*;

    fn clip_node(set: &mut NodeSet, rig: &Arc<RigDefinition>, clip: Arc<Clip>) -> NodeId {
        let id = set.add_node(ConfigurableClipNode::new(ClipConfiguration::default()));
        set.send_message(id, &NodeMessage::Rig(rig.clone())).unwrap();
        set.send_message(id, &NodeMessage::Clip(Some(clip))).unwrap();
        id
    }

    #[test]
    fn mixes_two_clips() {
        let rig = test_rig();
        let mut set = NodeSet::default();
        let mixer = set.add_node(MixerNode::new(&rig));
        let a = clip_node(&mut set, &rig, pose_clip(1., 0.2));
        let b = clip_node(&mut set, &rig, pose_clip(1., 0.6));

        set.connect(
            a.source(ConfigurableClipNode::OUT_POSE),
            mixer.target(MixerNode::IN_POSE_A),
        )
        .unwrap();
        set.connect(
            b.source(ConfigurableClipNode::OUT_POSE),
            mixer.target(MixerNode::IN_POSE_B),
        )
        .unwrap();
        set.set_data(mixer.target(MixerNode::IN_WEIGHT), 0.5_f32)
            .unwrap();
        set.set_data(a.target(ConfigurableClipNode::IN_TIME), 0.5_f32)
            .unwrap();
        set.set_data(b.target(ConfigurableClipNode::IN_TIME), 0.5_f32)
            .unwrap();

        assert_eq!(set.evaluation_order().unwrap(), &[a, b, mixer]);
        set.evaluate().unwrap();

        let output = set
            .output(mixer.source(MixerNode::OUT_POSE))
            .unwrap()
            .as_stream()
            .unwrap();
        assert!(output.translation(2).abs_diff_eq(Vec3::new(0.4, 0.5, 0.), 1e-5));
        assert!((output.float(0) - 0.4).abs() < 1e-5);
    }

    #[test]
    fn streams_of_another_rig_fail_evaluation() {
        let rig = test_rig();
        let mut set = NodeSet::default();
        let clip = clip_node(&mut set, &one_bone_rig(), pose_clip(1., 0.));
        let mixer = set.add_node(MixerNode::new(&rig));
        let n_mixer = set.add_node(NMixerNode::new(&rig, 1));
        set.connect(
            clip.source(ConfigurableClipNode::OUT_POSE),
            mixer.target(MixerNode::IN_POSE_A),
        )
        .unwrap();
        assert_eq!(set.evaluate(), Err(GraphError::RigMismatch));

        set.disconnect(mixer.target(MixerNode::IN_POSE_A));
        set.connect(
            clip.source(ConfigurableClipNode::OUT_POSE),
            n_mixer.target(PinId::indexed(NMixerNode::IN_POSE, 0)),
        )
        .unwrap();
        set.set_data(n_mixer.target(PinId::indexed(NMixerNode::IN_WEIGHT, 0)), 1_f32)
            .unwrap();
        assert_eq!(set.evaluate(), Err(GraphError::RigMismatch));
    }

    #[test]
    fn pins_are_checked() {
        let rig = test_rig();
        let mut set = NodeSet::default();
        let clip = clip_node(&mut set, &rig, pose_clip(1., 0.));
        let mixer = set.add_node(NMixerNode::new(&rig, 2));
        let weights = set.add_node(WeightBuilderNode::default());

        assert_eq!(
            set.connect(clip.source("pose"), mixer.target(PinId::indexed("input", 0))),
            Err(GraphError::UnknownPin("pose".into()))
        );
        assert_eq!(
            set.connect(
                clip.source(ConfigurableClipNode::OUT_POSE),
                mixer.target(PinId::indexed(NMixerNode::IN_POSE, 2)),
            ),
            Err(GraphError::PortOutOfBounds {
                pin: NMixerNode::IN_POSE,
                index: 2,
                len: 2
            })
        );
        assert_eq!(
            set.connect(
                weights.source(WeightBuilderNode::OUT_WEIGHT_TABLE),
                mixer.target(PinId::indexed(NMixerNode::IN_POSE, 0)),
            ),
            Err(GraphError::MismatchedDataType(
                "Stream".into(),
                "WeightTable".into()
            ))
        );
        assert_eq!(
            set.set_data(clip.target(ConfigurableClipNode::IN_TIME), Vec2::ZERO),
            Err(GraphError::MismatchedDataType("F32".into(), "Vec2".into()))
        );
    }

    #[test]
    fn cycles_are_refused() {
        let rig = test_rig();
        let mut set = NodeSet::default();
        let first = set.add_node(MixerNode::new(&rig));
        let second = set.add_node(MixerNode::new(&rig));

        set.connect(
            first.source(MixerNode::OUT_POSE),
            second.target(MixerNode::IN_POSE_A),
        )
        .unwrap();
        assert_eq!(
            set.connect(
                second.source(MixerNode::OUT_POSE),
                first.target(MixerNode::IN_POSE_A),
            ),
            Err(GraphError::CyclicGraph)
        );
        assert_eq!(set.connection(first.target(MixerNode::IN_POSE_A)), None);
        assert_eq!(set.evaluation_order().unwrap(), &[first, second]);
        set.evaluate().unwrap();
    }

    #[test]
    fn shrinking_ports_drops_their_inputs() {
        let rig = test_rig();
        let mut set = NodeSet::default();
        let clip = clip_node(&mut set, &rig, pose_clip(1., 0.3));
        let mixer = set.add_node(NMixerNode::new(&rig, 3));

        let last_input = mixer.target(PinId::indexed(NMixerNode::IN_POSE, 2));
        let last_weight = mixer.target(PinId::indexed(NMixerNode::IN_WEIGHT, 2));
        set.connect(clip.source(ConfigurableClipNode::OUT_POSE), last_input)
            .unwrap();
        set.set_data(last_weight, 1_f32).unwrap();

        set.resize_ports(mixer, 2).unwrap();
        assert_eq!(set.connection(last_input), None);
        assert!(set.clear_data(last_weight).is_none());

        // Every input of the mixer is now unconnected with zero weight
        set.evaluate().unwrap();
        let output = set
            .output(mixer.source(NMixerNode::OUT_POSE))
            .unwrap()
            .as_stream()
            .unwrap();
        assert_eq!(*output, AnimationStream::default_pose(&rig));
    }

    #[test]
    fn removed_nodes_leave_no_dangling_handles() {
        let rig = test_rig();
        let mut set = NodeSet::default();
        let clip = clip_node(&mut set, &rig, pose_clip(1., 0.));
        let mixer = set.add_node(MixerNode::new(&rig));
        set.connect(
            clip.source(ConfigurableClipNode::OUT_POSE),
            mixer.target(MixerNode::IN_POSE_A),
        )
        .unwrap();

        assert!(set.remove_node(clip).is_ok());
        assert_eq!(set.connection(mixer.target(MixerNode::IN_POSE_A)), None);
        assert!(matches!(set.remove_node(clip), Err(GraphError::UnknownNode)));

        // The slot is reused under a new handle
        let replacement = set.add_node(MixerNode::new(&rig));
        assert_ne!(replacement, clip);
        assert!(!set.contains(clip));
        assert_eq!(set.len(), 2);
        assert_eq!(
            set.send_message(clip, &NodeMessage::Additive(true)),
            Err(GraphError::UnknownNode)
        );
    }

    #[test]
    fn broadcast_skips_nodes_that_ignore_the_message() {
        let rig = test_rig();
        let mut set = NodeSet::default();
        set.add_node(WeightBuilderNode::default());
        set.add_node(NMixerNode::default());
        set.add_node(ConfigurableClipNode::default());

        assert!(set.broadcast(&NodeMessage::Rig(rig)).is_ok());
        assert!(set.broadcast(&NodeMessage::Additive(true)).is_ok());
        set.evaluate().unwrap();
    }
}
