//! Small rig and clips shared by the tests of every crate in the workspace.

use std::sync::Arc;

use bevy::{
    math::{Quat, Vec3},
    transform::components::Transform,
};

use crate::{clip::Clip, rig::RigDefinition};

pub const ROOT: &str = "Root";
pub const HIPS: &str = "Root/Hips";
pub const SPINE: &str = "Root/Hips/Spine";
pub const HEAD: &str = "Root/Hips/Spine/Head";
pub const BLINK: &str = "Blink";
pub const PROP: &str = "Prop";

/// Root, Hips, Spine, Head chain with one float and one int channel.
pub fn test_rig() -> Arc<RigDefinition> {
    Arc::new(
        RigDefinition::builder()
            .bone(ROOT, None, Transform::IDENTITY)
            .bone(HIPS, Some(0), Transform::from_xyz(0., 1., 0.))
            .bone(SPINE, Some(1), Transform::from_xyz(0., 0.5, 0.))
            .bone(HEAD, Some(2), Transform::from_xyz(0., 0.4, 0.))
            .float(BLINK, 0.)
            .int(PROP, 0)
            .build()
            .unwrap(),
    )
}

/// A rig with the root bone alone.
pub fn one_bone_rig() -> Arc<RigDefinition> {
    Arc::new(
        RigDefinition::builder()
            .bone(ROOT, None, Transform::IDENTITY)
            .build()
            .unwrap(),
    )
}

/// One second at 4 Hz: the root walks 2 units forward and turns, the hips sway.
pub fn walk_clip() -> Arc<Clip> {
    let keys = 5;
    let at = |i: usize| i as f32 / (keys - 1) as f32;
    Arc::new(
        Clip::builder(1., 4.)
            .translation(
                ROOT,
                (0..keys).map(|i| Vec3::new(0., 0., 2. * at(i))).collect(),
            )
            .rotation(
                ROOT,
                (0..keys).map(|i| Quat::from_rotation_y(0.5 * at(i))).collect(),
            )
            .translation(
                HIPS,
                (0..keys)
                    .map(|i| Vec3::new(0.1 * at(i), 1., 0.))
                    .collect(),
            )
            .rotation(
                HIPS,
                (0..keys).map(|i| Quat::from_rotation_x(0.3 * at(i))).collect(),
            )
            .float(BLINK, (0..keys).map(at).collect())
            .int(PROP, vec![0, 0, 1, 1, 2])
            .build()
            .unwrap(),
    )
}

/// One second at 4 Hz without root curves: the hips carry the motion forward and turn.
pub fn hips_motion_clip() -> Arc<Clip> {
    let keys = 5;
    let at = |i: usize| i as f32 / (keys - 1) as f32;
    Arc::new(
        Clip::builder(1., 4.)
            .translation(
                HIPS,
                (0..keys)
                    .map(|i| Vec3::new(0., 1. - 0.1 * at(i), 3. * at(i)))
                    .collect(),
            )
            .rotation(
                HIPS,
                (0..keys)
                    .map(|i| Quat::from_rotation_y(0.6 * at(i)) * Quat::from_rotation_x(0.2))
                    .collect(),
            )
            .rotation(
                SPINE,
                (0..keys).map(|i| Quat::from_rotation_z(0.1 * at(i))).collect(),
            )
            .build()
            .unwrap(),
    )
}

/// Two seconds at 2 Hz whose root curves hold a constant velocity per second.
pub fn velocity_clip() -> Arc<Clip> {
    Arc::new(
        Clip::builder(2., 2.)
            .translation(ROOT, vec![Vec3::new(0., 0., 1.5); 5])
            .rotation(ROOT, vec![Quat::from_scaled_axis(Vec3::new(0., 0.25, 0.)); 5])
            .build()
            .unwrap(),
    )
}

/// A clip that holds a single pose, `offset` applied to the spine.
pub fn pose_clip(duration: f32, offset: f32) -> Arc<Clip> {
    let keys = crate::clip::frame_count(duration, 10.);
    Arc::new(
        Clip::builder(duration, 10.)
            .translation(SPINE, vec![Vec3::new(offset, 0.5, 0.); keys])
            .rotation(SPINE, vec![Quat::from_rotation_z(offset); keys])
            .float(BLINK, vec![offset; keys])
            .build()
            .unwrap(),
    )
}
