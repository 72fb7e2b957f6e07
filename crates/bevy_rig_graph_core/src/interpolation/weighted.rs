use std::sync::Arc;

use bevy::math::{Quat, Vec3, Vec4};

use crate::{
    channel_mask::ChannelMask,
    errors::{GraphError, GraphResult},
    rig::RigDefinition,
    stream::AnimationStream,
};

/// Accumulates any number of weighted streams and resolves them into one.
///
/// Translations, scales and floats are weighted sums. Rotations are a weighted linear sum of
/// quaternion components, each flipped into the hemisphere of the bind rotation, normalized
/// once at the end. Int channels keep the candidate value with the largest accumulated weight.
/// Whatever is left of a total weight below one goes to the bind pose, and a total weight of
/// exactly zero resolves to the bind pose.
pub struct WeightedSum {
    reference: AnimationStream,
    translations: Vec<Vec3>,
    rotations: Vec<Vec4>,
    scales: Vec<Vec3>,
    floats: Vec<f32>,
    ints: Vec<Vec<(i32, f32)>>,
    mask: ChannelMask,
    total: f32,
}

impl WeightedSum {
    pub fn new(rig: &Arc<RigDefinition>, additive: bool) -> Self {
        let bones = rig.bone_count();
        Self {
            reference: AnimationStream::new(rig, additive),
            translations: vec![Vec3::ZERO; bones],
            rotations: vec![Vec4::ZERO; bones],
            scales: vec![Vec3::ZERO; bones],
            floats: vec![0.; rig.floats().len()],
            ints: vec![Vec::new(); rig.ints().len()],
            mask: ChannelMask::new(rig.channel_count()),
            total: 0.,
        }
    }

    pub fn rig(&self) -> &Arc<RigDefinition> {
        self.reference.rig()
    }

    pub fn total_weight(&self) -> f32 {
        self.total
    }

    /// Forgets every accumulated input, keeping the allocations.
    pub fn clear(&mut self) {
        self.translations.fill(Vec3::ZERO);
        self.rotations.fill(Vec4::ZERO);
        self.scales.fill(Vec3::ZERO);
        self.floats.fill(0.);
        self.ints.iter_mut().for_each(Vec::clear);
        self.mask.clear();
        self.total = 0.;
    }

    /// Adds `stream` with `weight`. Inputs with zero weight change nothing.
    ///
    /// Fails with [`GraphError::RigMismatch`] when `stream` was built for another rig.
    pub fn add(&mut self, stream: &AnimationStream, weight: f32) -> GraphResult<()> {
        if !stream.shares_rig(&self.reference) {
            return Err(GraphError::RigMismatch);
        }
        if weight == 0. {
            return Ok(());
        }
        self.total += weight;
        self.mask.union_with(stream.pass_mask());

        for index in 0..self.translations.len() {
            self.translations[index] += weight * stream.translations()[index];
            self.rotations[index] += weight
                * aligned(stream.rotations()[index], self.reference.rotations()[index]);
            self.scales[index] += weight * stream.scales()[index];
        }
        for (index, value) in stream.floats().iter().enumerate() {
            self.floats[index] += weight * value;
        }
        for (index, value) in stream.ints().iter().enumerate() {
            vote(&mut self.ints[index], *value, weight);
        }
        Ok(())
    }

    /// Adds the bind pose with `weight`, for inputs that are not connected.
    pub fn add_default(&mut self, weight: f32) {
        if weight == 0. {
            return;
        }
        self.total += weight;
        for index in 0..self.translations.len() {
            self.translations[index] += weight * self.reference.translations()[index];
            self.rotations[index] += weight * Vec4::from(self.reference.rotations()[index]);
            self.scales[index] += weight * self.reference.scales()[index];
        }
        for (index, value) in self.reference.floats().iter().enumerate() {
            self.floats[index] += weight * value;
        }
        for (index, value) in self.reference.ints().iter().enumerate() {
            vote(&mut self.ints[index], *value, weight);
        }
    }

    /// Resolves the accumulated inputs into `out`, which must share the rig.
    pub fn write_to(&self, out: &mut AnimationStream) -> GraphResult<()> {
        if !out.shares_rig(&self.reference) {
            return Err(GraphError::RigMismatch);
        }
        if self.total == 0. {
            out.clone_from(&self.reference);
            return Ok(());
        }

        let residual = (1. - self.total).max(0.);
        let reference = &self.reference;

        for index in 0..self.translations.len() {
            out.translations_mut()[index] =
                self.translations[index] + residual * reference.translations()[index];
            let sum = self.rotations[index] + residual * Vec4::from(reference.rotations()[index]);
            out.rotations_mut()[index] = if sum.length_squared() > f32::EPSILON {
                Quat::from_vec4(sum.normalize())
            } else {
                reference.rotations()[index]
            };
            out.scales_mut()[index] = self.scales[index] + residual * reference.scales()[index];
        }
        for (index, sum) in self.floats.iter().enumerate() {
            out.floats_mut()[index] = sum + residual * reference.floats()[index];
        }
        for (index, candidates) in self.ints.iter().enumerate() {
            let default = (reference.ints()[index], residual);
            if let Some(value) = winner(candidates.iter().chain(Some(&default))) {
                out.ints_mut()[index] = value;
            }
        }
        out.set_additive_flag(reference.is_additive());
        out.set_written(&self.mask);
        Ok(())
    }
}

/// `rotation` or its negation, whichever lies in the hemisphere of `reference`.
fn aligned(rotation: Quat, reference: Quat) -> Vec4 {
    if rotation.dot(reference) < 0. {
        -Vec4::from(rotation)
    } else {
        Vec4::from(rotation)
    }
}

fn vote(candidates: &mut Vec<(i32, f32)>, value: i32, weight: f32) {
    match candidates.iter_mut().find(|(candidate, _)| *candidate == value) {
        Some((_, accumulated)) => *accumulated += weight,
        None => candidates.push((value, weight)),
    }
}

/// Candidate with the largest weight; earlier candidates win exact ties.
fn winner<'a>(candidates: impl Iterator<Item = &'a (i32, f32)>) -> Option<i32> {
    let mut best: Option<(i32, f32)> = None;
    for (value, weight) in candidates {
        match best {
            Some((_, best_weight)) if *weight <= best_weight => {}
            _ => best = Some((*value, *weight)),
        }
    }
    best.map(|(value, _)| value)
}
