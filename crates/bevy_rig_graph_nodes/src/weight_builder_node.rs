use std::sync::Arc;

use bevy::log::warn;
use bevy_rig_graph_core::{
    channel_weights::ChannelWeightTable,
    errors::{GraphError, GraphResult},
    id::ChannelId,
    rig::{ChannelKind, RigDefinition},
};

use crate::{
    edge_data::{DataRef, DataSpec},
    node::{NodeContext, NodeMessage, NodeResources, NodeSpec, PinId, RigNode},
};

/// Builds a [`ChannelWeightTable`] from messages, for mixers that blend part of a rig.
#[derive(Default)]
pub struct WeightBuilderNode {
    rig: Option<Arc<RigDefinition>>,
    table: ChannelWeightTable,
}

impl WeightBuilderNode {
    pub const OUT_WEIGHT_TABLE: &'static str = "weight_table";

    pub fn new(table: ChannelWeightTable) -> Self {
        Self { rig: None, table }
    }

    pub fn table(&self) -> &ChannelWeightTable {
        &self.table
    }

    /// Replaces every per-channel override, keeping the default weight.
    pub fn set_channel_weights(&mut self, weights: &[(ChannelId, f32)]) {
        self.table.clear();
        for (id, weight) in weights {
            self.table.set_weight(*id, *weight);
        }
        self.warn_unknown_channels();
    }

    fn warn_unknown_channels(&self) {
        let Some(rig) = &self.rig else {
            return;
        };
        for (id, _) in self.table.overrides() {
            let known = [ChannelKind::Translation, ChannelKind::Float, ChannelKind::Int]
                .into_iter()
                .any(|kind| rig.binding_index(kind, id).is_some());
            if !known {
                warn!("Weight table overrides channel {id:?}, which the rig does not have");
            }
        }
    }
}

impl RigNode for WeightBuilderNode {
    fn display_name(&self) -> &'static str {
        "⚖ Channel Weights"
    }

    fn spec(&self, spec: &mut NodeSpec) {
        spec.add_output_data(Self::OUT_WEIGHT_TABLE, DataSpec::WeightTable);
    }

    fn handle_message(&mut self, message: &NodeMessage, _: &NodeResources) -> GraphResult<()> {
        match message {
            NodeMessage::Rig(rig) => {
                self.rig = Some(rig.clone());
                self.warn_unknown_channels();
            }
            NodeMessage::DefaultWeight(weight) => self.table.set_default_weight(*weight),
            NodeMessage::ChannelWeights(weights) => self.set_channel_weights(weights),
            other => {
                return Err(GraphError::UnsupportedMessage {
                    node: self.display_name(),
                    message: other.name(),
                });
            }
        }
        Ok(())
    }

    fn update(&mut self, _: NodeContext) -> GraphResult<()> {
        Ok(())
    }

    fn output(&self, pin: PinId) -> Option<DataRef<'_>> {
        match pin.name {
            Self::OUT_WEIGHT_TABLE => Some(DataRef::WeightTable(&self.table)),
            _ => None,
        }
    }
}
