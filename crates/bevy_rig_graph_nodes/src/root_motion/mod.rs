//! Root motion stages and the accumulator that turns per-frame root deltas into a transform.

mod accumulator;
mod in_place;

pub use accumulator::RootMotionAccumulator;
pub use in_place::InPlaceExtraction;

use bevy::math::{Isometry3d, Quat, Vec3};
use bevy_rig_graph_core::{stream::AnimationStream, transform::RigidTransformExt};

/// Root motion of one full cycle: `stop ∘ start⁻¹`.
pub fn cycle_transform(start: &AnimationStream, stop: &AnimationStream) -> Option<Isometry3d> {
    Some(stop.root_transform()? * start.root_transform()?.inverse())
}

/// Prepends the motion of `cycle` whole cycles to the root of `main`. Negative cycles apply
/// the inverse cycle motion.
pub fn cycle_root_motion(
    main: &mut AnimationStream,
    start: &AnimationStream,
    stop: &AnimationStream,
    cycle: i32,
) {
    if cycle == 0 {
        return;
    }
    let (Some(cycle_motion), Some(root)) = (cycle_transform(start, stop), main.root_transform())
    else {
        return;
    };
    main.set_root_transform(cycle_motion.powi(cycle) * root);
}

/// Replaces the root of `current` with the motion since `previous`: `previous⁻¹ ∘ current`.
pub fn delta_root_motion(current: &mut AnimationStream, previous: &AnimationStream) {
    let (Some(current_root), Some(previous_root)) =
        (current.root_transform(), previous.root_transform())
    else {
        return;
    };
    current.set_root_transform(previous_root.inverse() * current_root);
}

/// Reads the root channel as a velocity (translation and rotation per second) and replaces it
/// with the motion over `delta_time` seconds.
pub fn root_motion_from_velocity(stream: &mut AnimationStream, delta_time: f32) {
    let Some(velocity) = stream.root_transform() else {
        return;
    };
    let translation: Vec3 = velocity.translation3() * delta_time;
    let rotation = Quat::from_scaled_axis(velocity.rotation.to_scaled_axis() * delta_time);
    stream.set_root_transform(Isometry3d::from_parts(translation, rotation));
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bevy_rig_graph_core::{rig::RigDefinition, test_fixtures::test_rig};

    use super::*;

    fn with_root(rig: &Arc<RigDefinition>, root: Isometry3d) -> AnimationStream {
        let mut stream = AnimationStream::default_pose(rig);
        stream.set_root_transform(root);
        stream
    }

    #[test]
    fn cycles_prepend_whole_cycle_motion() {
        let rig = test_rig();
        let start = with_root(&rig, Isometry3d::from_parts(Vec3::ZERO, Quat::IDENTITY));
        let stop = with_root(
            &rig,
            Isometry3d::from_parts(Vec3::new(0., 0., 2.), Quat::from_rotation_y(0.5)),
        );
        let mid = Isometry3d::from_parts(Vec3::new(0., 0., 1.), Quat::from_rotation_y(0.25));

        let mut main = with_root(&rig, mid);
        cycle_root_motion(&mut main, &start, &stop, 2);
        let cycle = cycle_transform(&start, &stop).unwrap();
        assert!(
            main.root_transform()
                .unwrap()
                .abs_diff_eq(&(cycle * cycle * mid), 1e-5)
        );

        let mut backwards = with_root(&rig, mid);
        cycle_root_motion(&mut backwards, &start, &stop, -1);
        assert!(
            backwards
                .root_transform()
                .unwrap()
                .abs_diff_eq(&(cycle.inverse() * mid), 1e-5)
        );
    }

    #[test]
    fn delta_is_motion_since_previous() {
        let rig = test_rig();
        let previous_root = Isometry3d::from_parts(Vec3::new(1., 0., 0.), Quat::from_rotation_y(1.));
        let step = Isometry3d::from_parts(Vec3::new(0., 0., 0.5), Quat::from_rotation_y(0.1));
        let previous = with_root(&rig, previous_root);
        let mut current = with_root(&rig, previous_root * step);

        delta_root_motion(&mut current, &previous);
        assert!(current.root_transform().unwrap().abs_diff_eq(&step, 1e-5));
    }

    #[test]
    fn velocity_is_integrated_over_time_step() {
        let rig = test_rig();
        let mut stream = with_root(
            &rig,
            Isometry3d::from_parts(Vec3::new(0., 0., 2.), Quat::from_rotation_y(1.)),
        );
        root_motion_from_velocity(&mut stream, 0.25);
        let root = stream.root_transform().unwrap();
        assert!(root.translation3().abs_diff_eq(Vec3::new(0., 0., 0.5), 1e-6));
        assert!(root.rotation.abs_diff_eq(Quat::from_rotation_y(0.25), 1e-6));
    }
}
