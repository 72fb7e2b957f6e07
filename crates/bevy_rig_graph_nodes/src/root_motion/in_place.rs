use bevy::math::Isometry3d;
use bevy_rig_graph_core::{
    clip::Clip,
    errors::{GraphError, GraphResult, InvalidMotion},
    id::ChannelId,
    rig::{ChannelKind, RigDefinition},
    stream::AnimationStream,
    transform::RigidTransformExt,
};

/// Moves the ground motion of a bone onto the root channel.
///
/// The motion bone's root-space transform is projected onto the ground (translation with
/// `y = 0`, rotation reduced to its twist about +Y). The root channel receives that projection
/// and the motion bone keeps the remainder, so its pose in the root's parent space is unchanged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InPlaceExtraction {
    motion: ChannelId,
    motion_bone: usize,
    root: usize,
}

impl InPlaceExtraction {
    pub fn new(rig: &RigDefinition, clip: &Clip, motion: ChannelId) -> GraphResult<Self> {
        let root = rig.root_bone().ok_or(GraphError::MissingRoot)?;
        let motion_bone = rig
            .bone_index(motion)
            .ok_or(InvalidMotion::MotionBoneNotInRig(motion))?;
        if motion_bone == root {
            return Err(InvalidMotion::MotionIsRoot(motion).into());
        }
        if rig.bind_pose_between(root, motion_bone).is_none() {
            return Err(InvalidMotion::MotionNotUnderRoot(motion).into());
        }
        if !clip.has_curve(ChannelKind::Translation, motion)
            || !clip.has_curve(ChannelKind::Rotation, motion)
        {
            return Err(InvalidMotion::MissingMotionCurves(motion).into());
        }

        Ok(Self {
            motion,
            motion_bone,
            root,
        })
    }

    pub fn motion(&self) -> ChannelId {
        self.motion
    }

    /// Applies the extraction to `stream` and returns the ground projection that was moved.
    pub fn apply(&self, stream: &mut AnimationStream) -> Isometry3d {
        let rig = stream.rig().clone();
        let parent = rig.parent(self.motion_bone).unwrap_or(self.root);
        let chain = stream
            .transform_between(self.root, parent)
            .map(|chain| Isometry3d::from_parts(chain.translation, chain.rotation))
            .unwrap_or(Isometry3d::IDENTITY);

        let local = Isometry3d::from_parts(
            stream.translation(self.motion_bone),
            stream.rotation(self.motion_bone),
        );
        let projection = (chain * local).ground_projection();

        let root = Isometry3d::from_parts(stream.translation(self.root), stream.rotation(self.root));
        stream.set_root_transform(root * projection);

        let residual = chain.inverse() * projection.inverse() * chain * local;
        stream.set_translation(self.motion_bone, residual.translation3());
        stream.set_rotation(self.motion_bone, residual.rotation.normalize());

        projection
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bevy::math::{Quat, Vec3};
    use bevy_rig_graph_core::{
        clip::ClipInstance,
        test_fixtures::{HIPS, ROOT, SPINE, hips_motion_clip, test_rig, walk_clip},
    };

    use super::*;

    fn sampled(time: f32) -> AnimationStream {
        let rig = test_rig();
        let instance = ClipInstance::new(rig.clone(), hips_motion_clip());
        let mut stream = AnimationStream::default_pose(&rig);
        instance.sample(time, &mut stream, false);
        stream
    }

    #[test]
    fn motion_moves_to_root() {
        let mut stream = sampled(0.5);
        let before = stream.transform_between(0, 1).unwrap();
        let extraction =
            InPlaceExtraction::new(stream.rig(), &hips_motion_clip(), ChannelId::from_path(HIPS))
                .unwrap();
        extraction.apply(&mut stream);

        // Hips keep their pose relative to the root's parent
        let root = stream.local_transform(0);
        let after = root * stream.local_transform(1);
        assert!(after.translation.abs_diff_eq(before.translation, 1e-5));
        assert!(after.rotation.abs_diff_eq(before.rotation, 1e-5));

        // The root carries the ground motion, the hips only the vertical part
        assert!(root.translation.abs_diff_eq(Vec3::new(0., 0., 1.5), 1e-5));
        assert!(root.rotation.abs_diff_eq(Quat::from_rotation_y(0.3), 1e-5));
        let hips = stream.local_transform(1);
        assert!(hips.translation.x.abs() < 1e-5 && hips.translation.z.abs() < 1e-5);
    }

    #[test]
    fn invalid_motions_are_rejected() {
        let rig = test_rig();
        let clip = hips_motion_clip();
        assert_eq!(
            InPlaceExtraction::new(&rig, &clip, ChannelId::from_path(ROOT)),
            Err(InvalidMotion::MotionIsRoot(ChannelId::from_path(ROOT)).into())
        );
        assert_eq!(
            InPlaceExtraction::new(&rig, &clip, ChannelId::from_path("Tail")),
            Err(InvalidMotion::MotionBoneNotInRig(ChannelId::from_path("Tail")).into())
        );
        // The spine only has a rotation curve
        assert_eq!(
            InPlaceExtraction::new(&rig, &clip, ChannelId::from_path(SPINE)),
            Err(InvalidMotion::MissingMotionCurves(ChannelId::from_path(SPINE)).into())
        );
        assert!(InPlaceExtraction::new(&rig, &walk_clip(), ChannelId::from_path(HIPS)).is_ok());

        let rootless = Arc::new(RigDefinition::builder().build().unwrap());
        assert_eq!(
            InPlaceExtraction::new(&rootless, &clip, ChannelId::from_path(HIPS)),
            Err(GraphError::MissingRoot)
        );
    }
}
