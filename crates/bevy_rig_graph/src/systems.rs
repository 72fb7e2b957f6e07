use bevy::{
    ecs::system::{Query, Res},
    log::error,
    math::Isometry3d,
    time::Time,
    transform::components::Transform,
};
use bevy_rig_graph_core::transform::RigidTransformExt;

use crate::{player::RigGraphPlayer, settings::RigGraphSettings};

/// Advances and evaluates every [`RigGraphPlayer`], then moves its entity by the accumulated
/// root motion.
///
/// Players are independent of each other and are evaluated in parallel.
pub fn advance_rig_graph_players(
    time: Res<Time>,
    settings: Res<RigGraphSettings>,
    mut players: Query<(&mut RigGraphPlayer, &mut Transform)>,
) {
    let delta_time = time.delta_secs();
    let apply_root_motion = settings.apply_root_motion;

    players
        .par_iter_mut()
        .for_each(|(mut player, mut transform)| {
            if apply_root_motion && !player.is_anchored() {
                player.anchor(Isometry3d::from_parts(
                    transform.translation,
                    transform.rotation,
                ));
            }

            let previous_error = player.last_error().cloned();
            match player.advance(delta_time, apply_root_motion) {
                Ok(Some(root)) => {
                    transform.translation = root.translation3();
                    transform.rotation = root.rotation;
                }
                Ok(None) => {}
                // Only report an error once while it persists
                Err(error) if previous_error.as_ref() != Some(&error) => {
                    error!("Rig graph evaluation failed: {error}");
                }
                Err(_) => {}
            }
        });
}
