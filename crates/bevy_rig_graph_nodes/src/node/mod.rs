mod context;
mod message;
mod pin;

pub use context::*;
pub use message::*;
pub use pin::*;

use std::sync::Arc;

use bevy_rig_graph_core::{
    clip::ClipInstanceCache,
    errors::{GraphError, GraphResult},
};

use crate::edge_data::DataRef;

/// Shared resources available to nodes while they handle messages.
#[derive(Clone, Default)]
pub struct NodeResources {
    pub clip_cache: Arc<ClipInstanceCache>,
}

/// A node of a rig graph.
///
/// Nodes own their output buffers: [`update`](Self::update) writes them and
/// [`output`](Self::output) lends them to downstream nodes.
pub trait RigNode: Send + Sync + 'static {
    /// The name of this node.
    fn display_name(&self) -> &'static str;

    fn spec(&self, spec: &mut NodeSpec);

    #[allow(unused_variables)]
    fn handle_message(
        &mut self,
        message: &NodeMessage,
        resources: &NodeResources,
    ) -> GraphResult<()> {
        Err(GraphError::UnsupportedMessage {
            node: self.display_name(),
            message: message.name(),
        })
    }

    fn update(&mut self, ctx: NodeContext) -> GraphResult<()>;

    fn output(&self, pin: PinId) -> Option<DataRef<'_>>;

    fn node_spec(&self) -> NodeSpec {
        let mut spec = NodeSpec::default();
        self.spec(&mut spec);
        spec
    }
}
