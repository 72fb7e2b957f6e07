//! # Bevy Rig Graph
//!
//! Dynamic animation graphs for rigs in Bevy. A graph is a [`NodeSet`](node_set::NodeSet) of
//! nodes from `bevy_rig_graph_nodes` (configurable clips, blend trees, mixers) connected
//! through typed pins. A [`RigGraphPlayer`](player::RigGraphPlayer) component evaluates a graph
//! every frame and [`RigGraphPlugin`](plugin::RigGraphPlugin) moves the entity by the
//! accumulated root motion.
//!
//! The data model lives in `bevy_rig_graph_core` and the nodes in `bevy_rig_graph_nodes`. The
//! prelude re-exports both.

pub mod node_kind;
pub mod node_set;
pub mod player;
pub mod plugin;
pub mod settings;
pub mod systems;

pub mod prelude {
    pub use super::node_kind::NodeKind;
    pub use super::node_set::{NodeId, NodeSet, SourcePin, TargetPin};
    pub use super::player::RigGraphPlayer;
    pub use super::plugin::{RigGraphPlugin, RigGraphSet};
    pub use super::settings::RigGraphSettings;
    pub use bevy_rig_graph_core::prelude::*;
    pub use bevy_rig_graph_nodes::prelude::*;
}
