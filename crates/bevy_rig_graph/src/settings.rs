use bevy::{
    ecs::{reflect::ReflectResource, resource::Resource},
    reflect::{Reflect, std_traits::ReflectDefault},
};
use bevy_rig_graph_core::{clip::Clip, errors::GraphResult};
use bevy_rig_graph_nodes::{bake::bake_clip, composer::ConfigurableClipNode};

/// App-wide rig graph settings
#[derive(Resource, Reflect, Clone, Debug, PartialEq)]
#[reflect(Resource, Default)]
pub struct RigGraphSettings {
    /// Sample rate of clips baked with [`RigGraphSettings::bake`], in frames per second.
    pub bake_sample_rate: f32,
    /// Whether accumulated root motion moves the player entity's `Transform`.
    pub apply_root_motion: bool,
}

impl Default for RigGraphSettings {
    fn default() -> Self {
        Self {
            bake_sample_rate: 30.,
            apply_root_motion: true,
        }
    }
}

impl RigGraphSettings {
    /// Bakes a configured composer at [`bake_sample_rate`](Self::bake_sample_rate).
    pub fn bake(&self, composer: &mut ConfigurableClipNode) -> GraphResult<Clip> {
        bake_clip(composer, self.bake_sample_rate)
    }
}
