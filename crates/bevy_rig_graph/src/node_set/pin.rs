use std::fmt;

use bevy_rig_graph_nodes::node::PinId;

/// Handle to a node of a [`NodeSet`](super::NodeSet). Handles of destroyed nodes never alias
/// the nodes created after them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl NodeId {
    /// Output pin `pin` of this node.
    pub fn source(self, pin: impl Into<PinId>) -> SourcePin {
        SourcePin {
            node: self,
            pin: pin.into(),
        }
    }

    /// Input pin `pin` of this node.
    pub fn target(self, pin: impl Into<PinId>) -> TargetPin {
        TargetPin {
            node: self,
            pin: pin.into(),
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// An output pin of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SourcePin {
    pub node: NodeId,
    pub pin: PinId,
}

/// An input pin of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TargetPin {
    pub node: NodeId,
    pub pin: PinId,
}
