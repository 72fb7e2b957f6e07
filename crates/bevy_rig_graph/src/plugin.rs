use bevy::{
    app::{App, Plugin, PostUpdate},
    ecs::schedule::{IntoScheduleConfigs, SystemSet},
    transform::TransformSystems,
};
use bevy_rig_graph_core::{
    channel_weights::ChannelWeightTable,
    clip_configuration::{ClipConfiguration, ClipConfigurationMask},
    id::ChannelId,
};
use bevy_rig_graph_nodes::edge_data::DataSpec;

use crate::{
    player::RigGraphPlayer, settings::RigGraphSettings, systems::advance_rig_graph_players,
};

/// Adds rig graph playback to an app
#[derive(Default)]
pub struct RigGraphPlugin;

#[derive(Clone, Debug, Copy, PartialEq, Eq, Hash, SystemSet)]
pub enum RigGraphSet {
    /// Players are advanced and root motion is applied, before transforms propagate.
    Advance,
}

impl Plugin for RigGraphPlugin {
    fn build(&self, app: &mut App) {
        self.register_types(app);
        app.init_resource::<RigGraphSettings>();

        app.configure_sets(
            PostUpdate,
            RigGraphSet::Advance.before(TransformSystems::Propagate),
        );
        app.add_systems(
            PostUpdate,
            advance_rig_graph_players.in_set(RigGraphSet::Advance),
        );
    }
}

impl RigGraphPlugin {
    fn register_types(&self, app: &mut App) {
        app //
            .register_type::<RigGraphPlayer>()
            .register_type::<RigGraphSettings>()
            .register_type::<ClipConfiguration>()
            .register_type::<ClipConfigurationMask>()
            .register_type::<ChannelId>()
            .register_type::<ChannelWeightTable>()
            .register_type::<DataSpec>();
    }
}
