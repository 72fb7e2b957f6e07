use bevy::math::{Isometry3d, Quat, Vec3};
use bevy_rig_graph_core::{
    rig::ChannelKind, stream::AnimationStream, transform::RigidTransformExt,
};

/// Integrates the per-frame root deltas of a stream into one transform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RootMotionAccumulator {
    accumulated: Isometry3d,
    offset: Option<Isometry3d>,
}

impl Default for RootMotionAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl RootMotionAccumulator {
    pub fn new() -> Self {
        Self {
            accumulated: Isometry3d::IDENTITY,
            offset: None,
        }
    }

    pub fn accumulated(&self) -> Isometry3d {
        self.accumulated
    }

    pub fn reset(&mut self, transform: Isometry3d) {
        self.accumulated = transform;
        self.offset = None;
    }

    /// One-shot offset composed before the next delta.
    pub fn set_offset(&mut self, offset: Isometry3d) {
        self.offset = Some(offset);
    }

    /// Composes the stream's root delta into the accumulated transform and resets the root
    /// channel to identity. A root translation that was not written this pass leaves the
    /// translation unchanged, likewise for rotation.
    pub fn accumulate(&mut self, stream: &mut AnimationStream) -> Isometry3d {
        if let Some(offset) = self.offset.take() {
            self.accumulated = self.accumulated * offset;
        }

        let Some(root) = stream.rig().root_bone() else {
            return self.accumulated;
        };
        let translation_written = stream.is_written(ChannelKind::Translation, root);
        let rotation_written = stream.is_written(ChannelKind::Rotation, root);

        let delta = Isometry3d::from_parts(
            if translation_written {
                stream.translation(root)
            } else {
                Vec3::ZERO
            },
            if rotation_written {
                stream.rotation(root)
            } else {
                Quat::IDENTITY
            },
        );
        self.accumulated = self.accumulated * delta;

        if translation_written {
            stream.set_translation(root, Vec3::ZERO);
        }
        if rotation_written {
            stream.set_rotation(root, Quat::IDENTITY);
        }

        self.accumulated
    }
}
