use bevy::math::{Quat, Vec3};

use crate::{
    channel_weights::{ChannelWeightTable, channel_weight},
    errors::{GraphError, GraphResult},
    stream::AnimationStream,
};

pub trait InterpolateLinear {
    fn interpolate_linear(&self, other: &Self, f: f32) -> Self;
}

impl InterpolateLinear for Vec3 {
    fn interpolate_linear(&self, other: &Self, f: f32) -> Self {
        self.lerp(*other, f)
    }
}

impl InterpolateLinear for Quat {
    fn interpolate_linear(&self, other: &Self, f: f32) -> Self {
        self.slerp(*other, f)
    }
}

impl InterpolateLinear for f32 {
    fn interpolate_linear(&self, other: &Self, f: f32) -> Self {
        self + (other - self) * f
    }
}

/// Integers do not interpolate: `other` wins once the factor is past one half.
impl InterpolateLinear for i32 {
    fn interpolate_linear(&self, other: &Self, f: f32) -> Self {
        if f > 0.5 { *other } else { *self }
    }
}

/// Two-input blend: `out = a * (1 - w) + b * w` per channel.
///
/// `w` is `weight` unless `table` overrides it for the channel's id. The output pass mask is
/// the union of the input pass masks. All three streams must share the rig.
pub fn blend_linear(
    a: &AnimationStream,
    b: &AnimationStream,
    weight: f32,
    table: Option<&ChannelWeightTable>,
    out: &mut AnimationStream,
) -> GraphResult<()> {
    if !(a.shares_rig(out) && b.shares_rig(out)) {
        return Err(GraphError::RigMismatch);
    }
    let rig = out.rig().clone();

    for (index, bone) in rig.bones().iter().enumerate() {
        let w = channel_weight(table, bone.id, weight);
        out.translations_mut()[index] = a.translations()[index]
            .interpolate_linear(&b.translations()[index], w);
        out.rotations_mut()[index] =
            a.rotations()[index].interpolate_linear(&b.rotations()[index], w);
        out.scales_mut()[index] = a.scales()[index].interpolate_linear(&b.scales()[index], w);
    }
    for (index, binding) in rig.floats().iter().enumerate() {
        let w = channel_weight(table, binding.id, weight);
        out.floats_mut()[index] = a.floats()[index].interpolate_linear(&b.floats()[index], w);
    }
    for (index, binding) in rig.ints().iter().enumerate() {
        let w = channel_weight(table, binding.id, weight);
        out.ints_mut()[index] = a.ints()[index].interpolate_linear(&b.ints()[index], w);
    }

    out.set_written_union(a.pass_mask(), b.pass_mask());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        id::ChannelId,
        rig::ChannelKind,
        test_fixtures::{HIPS, one_bone_rig, test_rig},
    };

    #[test]
    fn halfway_blend() {
        let rig = test_rig();
        let mut a = AnimationStream::default_pose(&rig);
        let mut b = AnimationStream::default_pose(&rig);
        a.set_translation(2, Vec3::ZERO);
        b.set_translation(2, Vec3::new(2., 0., 0.));
        b.set_rotation(2, Quat::from_rotation_y(1.));
        b.set_int(0, 5);

        let mut out = AnimationStream::default_pose(&rig);
        blend_linear(&a, &b, 0.5, None, &mut out).unwrap();
        assert_eq!(out.translation(2), Vec3::new(1., 0., 0.));
        assert!(out.rotation(2).abs_diff_eq(Quat::from_rotation_y(0.5), 1e-6));
        // 0.5 is not past one half
        assert_eq!(out.int(0), 0);
        assert!(out.is_written(ChannelKind::Translation, 2));
        assert!(out.is_written(ChannelKind::Int, 0));
        assert!(!out.is_written(ChannelKind::Translation, 3));

        blend_linear(&a, &b, 0.51, None, &mut out).unwrap();
        assert_eq!(out.int(0), 5);
    }

    #[test]
    fn table_overrides_weight_per_channel() {
        let rig = test_rig();
        let a = AnimationStream::default_pose(&rig);
        let mut b = AnimationStream::default_pose(&rig);
        b.set_translation(1, Vec3::new(0., 1., 4.));
        b.set_translation(2, Vec3::new(0., 0.5, 4.));

        let mut table = ChannelWeightTable::new();
        table.set_weight(ChannelId::from_path(HIPS), 0.);

        let mut out = AnimationStream::default_pose(&rig);
        blend_linear(&a, &b, 1., Some(&table), &mut out).unwrap();
        assert_eq!(out.translation(1), a.translation(1));
        assert_eq!(out.translation(2), Vec3::new(0., 0.5, 4.));
    }

    #[test]
    fn streams_must_share_the_rig() {
        let rig = test_rig();
        let a = AnimationStream::default_pose(&rig);
        let b = AnimationStream::default_pose(&one_bone_rig());
        let mut out = AnimationStream::default_pose(&rig);
        assert_eq!(
            blend_linear(&a, &b, 0.5, None, &mut out),
            Err(GraphError::RigMismatch)
        );
        assert_eq!(out, AnimationStream::default_pose(&rig));
    }
}
