use bevy::math::Quat;

use crate::{
    channel_weights::{ChannelWeightTable, channel_weight},
    stream::AnimationStream,
};

/// Applies an additive stream on top of a base stream, in place.
pub struct AdditiveInterpolator<'a> {
    pub weights: Option<&'a ChannelWeightTable>,
}

impl AdditiveInterpolator<'_> {
    /// `base += f * overlay` per channel. Negative factors subtract the overlay; rotations
    /// are rotated by the overlay (or its inverse) scaled along the geodesic. Int channels
    /// keep the base value.
    pub fn interpolate_stream(&self, base: &mut AnimationStream, overlay: &AnimationStream, f: f32) {
        debug_assert!(base.shares_rig(overlay));
        let rig = base.rig().clone();

        for (index, bone) in rig.bones().iter().enumerate() {
            let w = channel_weight(self.weights, bone.id, f);
            if w == 0. {
                continue;
            }
            base.translations_mut()[index] += w * overlay.translations()[index];
            base.rotations_mut()[index] =
                additive_blend_quat(base.rotations()[index], overlay.rotations()[index], w);
            base.scales_mut()[index] += w * overlay.scales()[index];
        }
        for (index, binding) in rig.floats().iter().enumerate() {
            let w = channel_weight(self.weights, binding.id, f);
            base.floats_mut()[index] += w * overlay.floats()[index];
        }

        let mask = base.pass_mask().clone();
        base.set_written_union(&mask, overlay.pass_mask());
    }
}

/// Base rotated by `overlay` scaled by `alpha`; a negative `alpha` rotates by the inverse.
pub fn additive_blend_quat(base: Quat, overlay: Quat, alpha: f32) -> Quat {
    let scaled = if alpha >= 0. {
        Quat::IDENTITY.slerp(overlay, alpha)
    } else {
        Quat::IDENTITY.slerp(overlay.inverse(), -alpha)
    };
    (scaled * base).normalize()
}
