use bevy_rig_graph_core::errors::GraphResult;
use bevy_rig_graph_nodes::{
    blend_tree::{BlendTree1DNode, BlendTree2DNode},
    composer::ConfigurableClipNode,
    edge_data::DataRef,
    mixer::{MixerNode, NMixerNode},
    node::{NodeContext, NodeMessage, NodeResources, NodeSpec, PinId, RigNode},
    weight_builder_node::WeightBuilderNode,
};

/// Every node a [`NodeSet`](crate::node_set::NodeSet) can hold.
pub enum NodeKind {
    Clip(ConfigurableClipNode),
    BlendTree1D(BlendTree1DNode),
    BlendTree2D(BlendTree2DNode),
    Mixer(MixerNode),
    NMixer(NMixerNode),
    WeightBuilder(WeightBuilderNode),
}

impl NodeKind {
    pub fn inner(&self) -> &dyn RigNode {
        match self {
            NodeKind::Clip(node) => node,
            NodeKind::BlendTree1D(node) => node,
            NodeKind::BlendTree2D(node) => node,
            NodeKind::Mixer(node) => node,
            NodeKind::NMixer(node) => node,
            NodeKind::WeightBuilder(node) => node,
        }
    }

    pub fn inner_mut(&mut self) -> &mut dyn RigNode {
        match self {
            NodeKind::Clip(node) => node,
            NodeKind::BlendTree1D(node) => node,
            NodeKind::BlendTree2D(node) => node,
            NodeKind::Mixer(node) => node,
            NodeKind::NMixer(node) => node,
            NodeKind::WeightBuilder(node) => node,
        }
    }
}

impl RigNode for NodeKind {
    fn display_name(&self) -> &'static str {
        self.inner().display_name()
    }

    fn spec(&self, spec: &mut NodeSpec) {
        self.inner().spec(spec)
    }

    fn handle_message(
        &mut self,
        message: &NodeMessage,
        resources: &NodeResources,
    ) -> GraphResult<()> {
        self.inner_mut().handle_message(message, resources)
    }

    fn update(&mut self, ctx: NodeContext) -> GraphResult<()> {
        self.inner_mut().update(ctx)
    }

    fn output(&self, pin: PinId) -> Option<DataRef<'_>> {
        self.inner().output(pin)
    }
}

impl From<ConfigurableClipNode> for NodeKind {
    fn from(value: ConfigurableClipNode) -> Self {
        NodeKind::Clip(value)
    }
}

impl From<BlendTree1DNode> for NodeKind {
    fn from(value: BlendTree1DNode) -> Self {
        NodeKind::BlendTree1D(value)
    }
}

impl From<BlendTree2DNode> for NodeKind {
    fn from(value: BlendTree2DNode) -> Self {
        NodeKind::BlendTree2D(value)
    }
}

impl From<MixerNode> for NodeKind {
    fn from(value: MixerNode) -> Self {
        NodeKind::Mixer(value)
    }
}

impl From<NMixerNode> for NodeKind {
    fn from(value: NMixerNode) -> Self {
        NodeKind::NMixer(value)
    }
}

impl From<WeightBuilderNode> for NodeKind {
    fn from(value: WeightBuilderNode) -> Self {
        NodeKind::WeightBuilder(value)
    }
}
