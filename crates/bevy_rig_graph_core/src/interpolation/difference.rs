use crate::stream::AnimationStream;

/// Turns `base` into the additive stream `other - base`, in place.
///
/// Translations, scales and floats subtract; rotations become `other * base⁻¹`; int channels
/// take `other`'s value. The result is marked additive so channels neither stream wrote read as
/// the additive identity.
pub fn difference_in_place(base: &mut AnimationStream, other: &AnimationStream) {
    debug_assert!(base.shares_rig(other));
    let rig = base.rig().clone();

    for index in 0..rig.bone_count() {
        base.translations_mut()[index] = other.translations()[index] - base.translations()[index];
        base.rotations_mut()[index] =
            (other.rotations()[index] * base.rotations()[index].inverse()).normalize();
        base.scales_mut()[index] = other.scales()[index] - base.scales()[index];
    }
    for index in 0..rig.floats().len() {
        base.floats_mut()[index] = other.floats()[index] - base.floats()[index];
    }
    for index in 0..rig.ints().len() {
        base.ints_mut()[index] = other.ints()[index];
    }

    base.set_additive_flag(true);
    let mask = base.pass_mask().clone();
    base.set_written_union(&mask, other.pass_mask());
}

#[cfg(test)]
mod tests {
    use bevy::math::{Quat, Vec3};

    use super::*;
    use crate::test_fixtures::test_rig;

    #[test]
    fn difference_of_start_and_stop() {
        let rig = test_rig();
        let mut start = AnimationStream::default_pose(&rig);
        let mut stop = AnimationStream::default_pose(&rig);
        start.set_translation(0, Vec3::new(1., 0., 0.));
        stop.set_translation(0, Vec3::new(1., 0., 3.));
        stop.set_rotation(0, Quat::from_rotation_y(0.4));

        difference_in_place(&mut start, &stop);
        assert!(start.is_additive());
        assert_eq!(start.translation(0), Vec3::new(0., 0., 3.));
        assert!(start.rotation(0).abs_diff_eq(Quat::from_rotation_y(0.4), 1e-6));
        // Neither stream wrote the spine
        assert_eq!(start.translation(2), Vec3::ZERO);
        assert_eq!(start.scale(2), Vec3::ZERO);
    }
}
