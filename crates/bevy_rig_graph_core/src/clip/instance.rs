use std::sync::{Arc, PoisonError, RwLock, Weak};

use bevy::platform::collections::HashMap;

use super::{ChannelCurve, Clip};
use crate::{
    rig::{ChannelKind, RigDefinition},
    stream::AnimationStream,
};

/// Pairs of (clip curve index, rig binding index).
type CurveMap = Vec<(usize, usize)>;

/// A clip bound to a rig: every clip curve the rig knows is mapped to its binding index.
///
/// Curves whose id the rig lacks are dropped at construction.
#[derive(Debug)]
pub struct ClipInstance {
    rig: Arc<RigDefinition>,
    clip: Arc<Clip>,
    translations: CurveMap,
    rotations: CurveMap,
    scales: CurveMap,
    floats: CurveMap,
    ints: CurveMap,
}

impl ClipInstance {
    pub fn new(rig: Arc<RigDefinition>, clip: Arc<Clip>) -> Self {
        let translations = map_curves(&rig, ChannelKind::Translation, &clip.translations);
        let rotations = map_curves(&rig, ChannelKind::Rotation, &clip.rotations);
        let scales = map_curves(&rig, ChannelKind::Scale, &clip.scales);
        let floats = map_curves(&rig, ChannelKind::Float, &clip.floats);
        let ints = map_curves(&rig, ChannelKind::Int, &clip.ints);

        Self {
            rig,
            clip,
            translations,
            rotations,
            scales,
            floats,
            ints,
        }
    }

    pub fn rig(&self) -> &Arc<RigDefinition> {
        &self.rig
    }

    pub fn clip(&self) -> &Arc<Clip> {
        &self.clip
    }

    pub fn duration(&self) -> f32 {
        self.clip.duration()
    }

    /// Writes every mapped curve sampled at `time` into `stream`. Channels the clip does not
    /// animate are left untouched. With `skip_root`, the root bone channels are not written.
    pub fn sample(&self, time: f32, stream: &mut AnimationStream, skip_root: bool) {
        let frame = self.clip.frame_position(time);
        let root = if skip_root {
            self.rig.root_bone()
        } else {
            None
        };
        let keep = |binding: &usize| Some(*binding) != root;

        for (curve, binding) in &self.translations {
            if keep(binding) {
                stream.set_translation(*binding, self.clip.translations[*curve].sample(frame));
            }
        }
        for (curve, binding) in &self.rotations {
            if keep(binding) {
                stream.set_rotation(*binding, self.clip.rotations[*curve].sample(frame));
            }
        }
        for (curve, binding) in &self.scales {
            if keep(binding) {
                stream.set_scale(*binding, self.clip.scales[*curve].sample(frame));
            }
        }
        for (curve, binding) in &self.floats {
            stream.set_float(*binding, self.clip.floats[*curve].sample(frame));
        }
        for (curve, binding) in &self.ints {
            stream.set_int(*binding, self.clip.ints[*curve].sample(frame));
        }
    }
}

fn map_curves<T>(rig: &RigDefinition, kind: ChannelKind, curves: &[ChannelCurve<T>]) -> CurveMap {
    curves
        .iter()
        .enumerate()
        .filter_map(|(curve, ChannelCurve { id, .. })| {
            rig.binding_index(kind, *id).map(|binding| (curve, binding))
        })
        .collect()
}

/// Memoizes [`ClipInstance`]s per (rig, clip) pair, keyed by the identity of the shared assets.
///
/// Only weak handles are kept: an instance lives as long as someone uses it, and its assets
/// are released with it. A live instance holds both assets, so a key cannot be reused by a
/// different allocation while its entry can still be upgraded. Dead entries are pruned
/// whenever a new instance is created.
#[derive(Default)]
pub struct ClipInstanceCache {
    instances: RwLock<HashMap<(usize, usize), Weak<ClipInstance>>>,
}

impl ClipInstanceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create(&self, rig: &Arc<RigDefinition>, clip: &Arc<Clip>) -> Arc<ClipInstance> {
        let key = (
            Arc::as_ptr(rig) as usize,
            Arc::as_ptr(clip) as usize,
        );

        if let Some(instance) = self
            .instances
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .and_then(Weak::upgrade)
        {
            return instance;
        }

        let mut instances = self
            .instances
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(instance) = instances.get(&key).and_then(Weak::upgrade) {
            return instance;
        }
        instances.retain(|_, instance| instance.strong_count() > 0);

        let instance = Arc::new(ClipInstance::new(rig.clone(), clip.clone()));
        instances.insert(key, Arc::downgrade(&instance));
        instance
    }

    /// Number of instances still in use.
    pub fn len(&self) -> usize {
        self.instances
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|instance| instance.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forgets every entry. Instances already handed out stay valid.
    pub fn clear(&self) {
        self.instances
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
