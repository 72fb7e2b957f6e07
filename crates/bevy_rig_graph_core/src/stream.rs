use std::sync::Arc;

use bevy::{
    math::{Isometry3d, Quat, Vec3},
    transform::components::Transform,
};

use crate::{
    channel_mask::ChannelMask,
    rig::{ChannelKind, RigDefinition},
    transform::RigidTransformExt,
};

/// How [`AnimationStream::begin_pass`] treats the root bone channels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RootPolicy {
    /// Root channels are cleared like every other channel.
    #[default]
    Clear,
    /// Root channels keep their value and mask bits; root motion code clears them explicitly.
    Keep,
}

/// Per-instance buffer of animated channel values for one rig.
///
/// Every channel whose pass mask bit is unset holds the rig default (the bind pose, or the
/// additive identity for additive streams). Writers set both the pass and the frame mask bit;
/// [`begin_pass`](Self::begin_pass) resets unwritten channels and
/// [`begin_frame`](Self::begin_frame) also forgets the frame mask.
#[derive(Clone, Debug)]
pub struct AnimationStream {
    rig: Arc<RigDefinition>,
    additive: bool,
    translations: Vec<Vec3>,
    rotations: Vec<Quat>,
    scales: Vec<Vec3>,
    floats: Vec<f32>,
    ints: Vec<i32>,
    pass_mask: ChannelMask,
    frame_mask: ChannelMask,
}

impl AnimationStream {
    /// The rig's bind pose with no channel marked as written.
    pub fn default_pose(rig: &Arc<RigDefinition>) -> Self {
        Self::with_defaults(rig, false)
    }

    /// Additive identity: zero translation, scale and float offsets, identity rotations.
    pub fn additive_identity(rig: &Arc<RigDefinition>) -> Self {
        Self::with_defaults(rig, true)
    }

    pub fn new(rig: &Arc<RigDefinition>, additive: bool) -> Self {
        Self::with_defaults(rig, additive)
    }

    fn with_defaults(rig: &Arc<RigDefinition>, additive: bool) -> Self {
        let channel_count = rig.channel_count();
        let mut stream = Self {
            rig: rig.clone(),
            additive,
            translations: Vec::with_capacity(rig.bone_count()),
            rotations: Vec::with_capacity(rig.bone_count()),
            scales: Vec::with_capacity(rig.bone_count()),
            floats: Vec::with_capacity(rig.floats().len()),
            ints: Vec::with_capacity(rig.ints().len()),
            pass_mask: ChannelMask::new(channel_count),
            frame_mask: ChannelMask::new(channel_count),
        };
        for index in 0..rig.bone_count() {
            stream.translations.push(stream.default_translation(index));
            stream.rotations.push(stream.default_rotation(index));
            stream.scales.push(stream.default_scale(index));
        }
        for index in 0..rig.floats().len() {
            stream.floats.push(stream.default_float(index));
        }
        for index in 0..rig.ints().len() {
            stream.ints.push(stream.default_int(index));
        }
        stream
    }

    pub fn rig(&self) -> &Arc<RigDefinition> {
        &self.rig
    }

    pub fn is_additive(&self) -> bool {
        self.additive
    }

    pub fn shares_rig(&self, other: &AnimationStream) -> bool {
        Arc::ptr_eq(&self.rig, &other.rig)
    }

    pub fn pass_mask(&self) -> &ChannelMask {
        &self.pass_mask
    }

    pub fn frame_mask(&self) -> &ChannelMask {
        &self.frame_mask
    }

    pub fn is_written(&self, kind: ChannelKind, index: usize) -> bool {
        self.pass_mask.get(self.rig.channel_index(kind, index))
    }

    pub fn translations(&self) -> &[Vec3] {
        &self.translations
    }

    pub fn rotations(&self) -> &[Quat] {
        &self.rotations
    }

    pub fn scales(&self) -> &[Vec3] {
        &self.scales
    }

    pub fn floats(&self) -> &[f32] {
        &self.floats
    }

    pub fn ints(&self) -> &[i32] {
        &self.ints
    }

    pub fn default_translation(&self, index: usize) -> Vec3 {
        match (self.additive, self.rig.bone(index)) {
            (false, Some(bone)) => bone.bind_pose.translation,
            _ => Vec3::ZERO,
        }
    }

    pub fn default_rotation(&self, index: usize) -> Quat {
        match (self.additive, self.rig.bone(index)) {
            (false, Some(bone)) => bone.bind_pose.rotation,
            _ => Quat::IDENTITY,
        }
    }

    pub fn default_scale(&self, index: usize) -> Vec3 {
        match (self.additive, self.rig.bone(index)) {
            (false, Some(bone)) => bone.bind_pose.scale,
            (false, None) => Vec3::ONE,
            (true, _) => Vec3::ZERO,
        }
    }

    pub fn default_float(&self, index: usize) -> f32 {
        match (self.additive, self.rig.floats().get(index)) {
            (false, Some(binding)) => binding.default,
            _ => 0.,
        }
    }

    pub fn default_int(&self, index: usize) -> i32 {
        match (self.additive, self.rig.ints().get(index)) {
            (false, Some(binding)) => binding.default,
            _ => 0,
        }
    }

    pub fn translation(&self, index: usize) -> Vec3 {
        self.translations[index]
    }

    pub fn rotation(&self, index: usize) -> Quat {
        self.rotations[index]
    }

    pub fn scale(&self, index: usize) -> Vec3 {
        self.scales[index]
    }

    pub fn float(&self, index: usize) -> f32 {
        self.floats[index]
    }

    pub fn int(&self, index: usize) -> i32 {
        self.ints[index]
    }

    pub fn set_translation(&mut self, index: usize, value: Vec3) {
        self.translations[index] = value;
        self.mark(ChannelKind::Translation, index);
    }

    pub fn set_rotation(&mut self, index: usize, value: Quat) {
        self.rotations[index] = value;
        self.mark(ChannelKind::Rotation, index);
    }

    pub fn set_scale(&mut self, index: usize, value: Vec3) {
        self.scales[index] = value;
        self.mark(ChannelKind::Scale, index);
    }

    pub fn set_float(&mut self, index: usize, value: f32) {
        self.floats[index] = value;
        self.mark(ChannelKind::Float, index);
    }

    pub fn set_int(&mut self, index: usize, value: i32) {
        self.ints[index] = value;
        self.mark(ChannelKind::Int, index);
    }

    fn mark(&mut self, kind: ChannelKind, index: usize) {
        let channel = self.rig.channel_index(kind, index);
        self.pass_mask.set(channel, true);
        self.frame_mask.set(channel, true);
    }

    /// Local transform of a bone.
    pub fn local_transform(&self, bone: usize) -> Transform {
        Transform {
            translation: self.translations[bone],
            rotation: self.rotations[bone],
            scale: self.scales[bone],
        }
    }

    pub fn set_local_transform(&mut self, bone: usize, transform: Transform) {
        self.set_translation(bone, transform.translation);
        self.set_rotation(bone, transform.rotation);
        self.set_scale(bone, transform.scale);
    }

    /// Composes local transforms from `ancestor` (exclusive) down to `bone` (inclusive).
    pub fn transform_between(&self, ancestor: usize, bone: usize) -> Option<Transform> {
        let mut current = bone;
        let mut transform = Transform::IDENTITY;
        while current != ancestor {
            transform = self.local_transform(current) * transform;
            current = self.rig.parent(current)?;
        }
        Some(transform)
    }

    /// Translation and rotation of the root bone, if the rig has one.
    pub fn root_transform(&self) -> Option<Isometry3d> {
        let root = self.rig.root_bone()?;
        Some(Isometry3d::from_parts(
            self.translations[root],
            self.rotations[root],
        ))
    }

    /// Writes translation and rotation of the root bone. Returns false if the rig has no root.
    pub fn set_root_transform(&mut self, transform: Isometry3d) -> bool {
        let Some(root) = self.rig.root_bone() else {
            return false;
        };
        self.set_translation(root, transform.translation3());
        self.set_rotation(root, transform.rotation);
        true
    }

    /// Starts a new evaluation pass: every unwritten or cleared channel holds its default again.
    pub fn begin_pass(&mut self, policy: RootPolicy) {
        let root = match policy {
            RootPolicy::Clear => None,
            RootPolicy::Keep => self.rig.root_bone(),
        };
        let kept = root.map(|root| {
            (
                self.pass_mask
                    .get(self.rig.channel_index(ChannelKind::Translation, root)),
                self.pass_mask
                    .get(self.rig.channel_index(ChannelKind::Rotation, root)),
                self.pass_mask
                    .get(self.rig.channel_index(ChannelKind::Scale, root)),
            )
        });

        self.pass_mask.clear();
        if let (Some(root), Some((t, r, s))) = (root, kept) {
            self.pass_mask
                .set(self.rig.channel_index(ChannelKind::Translation, root), t);
            self.pass_mask
                .set(self.rig.channel_index(ChannelKind::Rotation, root), r);
            self.pass_mask
                .set(self.rig.channel_index(ChannelKind::Scale, root), s);
        }
        self.reset_unwritten();
    }

    /// Starts a new frame: like `begin_pass(RootPolicy::Clear)` and also clears the frame mask.
    pub fn begin_frame(&mut self) {
        self.frame_mask.clear();
        self.begin_pass(RootPolicy::Clear);
    }

    /// Resets every channel to its default and clears the pass mask.
    pub fn reset_to_default(&mut self) {
        self.pass_mask.clear();
        self.reset_unwritten();
    }

    /// Turns this stream into an additive or absolute stream of the same rig, reset to defaults.
    pub fn set_additive(&mut self, additive: bool) {
        self.additive = additive;
        self.reset_to_default();
    }

    /// Resets one channel to its default and clears its pass bit.
    pub fn reset_channel(&mut self, kind: ChannelKind, index: usize) {
        let channel = self.rig.channel_index(kind, index);
        self.pass_mask.set(channel, false);
        match kind {
            ChannelKind::Translation => self.translations[index] = self.default_translation(index),
            ChannelKind::Rotation => self.rotations[index] = self.default_rotation(index),
            ChannelKind::Scale => self.scales[index] = self.default_scale(index),
            ChannelKind::Float => self.floats[index] = self.default_float(index),
            ChannelKind::Int => self.ints[index] = self.default_int(index),
        }
    }

    fn reset_unwritten(&mut self) {
        let rig = self.rig.clone();
        for index in 0..rig.bone_count() {
            if !self
                .pass_mask
                .get(rig.channel_index(ChannelKind::Translation, index))
            {
                self.translations[index] = self.default_translation(index);
            }
            if !self
                .pass_mask
                .get(rig.channel_index(ChannelKind::Rotation, index))
            {
                self.rotations[index] = self.default_rotation(index);
            }
            if !self.pass_mask.get(rig.channel_index(ChannelKind::Scale, index)) {
                self.scales[index] = self.default_scale(index);
            }
        }
        for index in 0..rig.floats().len() {
            if !self.pass_mask.get(rig.channel_index(ChannelKind::Float, index)) {
                self.floats[index] = self.default_float(index);
            }
        }
        for index in 0..rig.ints().len() {
            if !self.pass_mask.get(rig.channel_index(ChannelKind::Int, index)) {
                self.ints[index] = self.default_int(index);
            }
        }
    }

    /// Copies values and masks of `other` into this stream, reusing the allocations.
    pub fn copy_from(&mut self, other: &AnimationStream) {
        self.clone_from(other);
    }

    /// Replaces the pass mask. Channels outside `mask` return to their default; the frame mask
    /// keeps every bit it had and gains the new ones.
    pub fn set_written(&mut self, mask: &ChannelMask) {
        self.pass_mask.clone_from(mask);
        self.frame_mask.union_with(mask);
        self.reset_unwritten();
    }

    /// `set_written` with the union of two masks.
    pub fn set_written_union(&mut self, a: &ChannelMask, b: &ChannelMask) {
        self.pass_mask.clone_from(a);
        self.pass_mask.union_with(b);
        self.frame_mask.union_with(&self.pass_mask);
        self.reset_unwritten();
    }

    pub(crate) fn set_additive_flag(&mut self, additive: bool) {
        self.additive = additive;
    }

    pub(crate) fn translations_mut(&mut self) -> &mut [Vec3] {
        &mut self.translations
    }

    pub(crate) fn rotations_mut(&mut self) -> &mut [Quat] {
        &mut self.rotations
    }

    pub(crate) fn scales_mut(&mut self) -> &mut [Vec3] {
        &mut self.scales
    }

    pub(crate) fn floats_mut(&mut self) -> &mut [f32] {
        &mut self.floats
    }

    pub(crate) fn ints_mut(&mut self) -> &mut [i32] {
        &mut self.ints
    }
}

impl PartialEq for AnimationStream {
    /// Bitwise value and mask equality on the same rig.
    fn eq(&self, other: &Self) -> bool {
        self.shares_rig(other)
            && self.additive == other.additive
            && self.translations == other.translations
            && self.rotations == other.rotations
            && self.scales == other.scales
            && self.floats == other.floats
            && self.ints == other.ints
            && self.pass_mask == other.pass_mask
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::test_rig;

    #[test]
    fn default_pose_reads_bind_pose() {
        let rig = test_rig();
        let stream = AnimationStream::default_pose(&rig);
        assert_eq!(stream.translation(1), rig.bones()[1].bind_pose.translation);
        assert_eq!(stream.float(0), rig.floats()[0].default);
        assert_eq!(stream.int(0), rig.ints()[0].default);
        assert!(!stream.pass_mask().any());
    }

    #[test]
    fn additive_identity_is_neutral() {
        let rig = test_rig();
        let stream = AnimationStream::additive_identity(&rig);
        assert_eq!(stream.translation(1), Vec3::ZERO);
        assert_eq!(stream.rotation(1), Quat::IDENTITY);
        assert_eq!(stream.scale(1), Vec3::ZERO);
        assert_eq!(stream.int(0), 0);
    }

    #[test]
    fn begin_pass_resets_written_channels() {
        let rig = test_rig();
        let mut stream = AnimationStream::default_pose(&rig);
        stream.set_translation(1, Vec3::splat(9.));
        stream.set_float(0, 4.);
        assert!(stream.is_written(ChannelKind::Translation, 1));

        stream.begin_pass(RootPolicy::Clear);
        assert!(!stream.is_written(ChannelKind::Translation, 1));
        assert_eq!(stream.translation(1), rig.bones()[1].bind_pose.translation);
        assert_eq!(stream.float(0), rig.floats()[0].default);
        // The frame mask survives passes within a frame
        assert!(
            stream
                .frame_mask()
                .get(rig.channel_index(ChannelKind::Translation, 1))
        );

        stream.begin_frame();
        assert!(!stream.frame_mask().any());
    }

    #[test]
    fn keep_policy_preserves_root() {
        let rig = test_rig();
        let root = rig.root_bone().unwrap();
        let mut stream = AnimationStream::default_pose(&rig);
        stream.set_translation(root, Vec3::X);
        stream.set_translation(1, Vec3::Y);

        stream.begin_pass(RootPolicy::Keep);
        assert_eq!(stream.translation(root), Vec3::X);
        assert!(stream.is_written(ChannelKind::Translation, root));
        assert!(!stream.is_written(ChannelKind::Translation, 1));
    }

    #[test]
    fn transform_between_uses_stream_values() {
        let rig = test_rig();
        let mut stream = AnimationStream::default_pose(&rig);
        stream.set_translation(1, Vec3::new(0., 2., 0.));
        let hips_in_root = stream.transform_between(0, 1).unwrap();
        assert_eq!(hips_in_root.translation, Vec3::new(0., 2., 0.));
    }
}
