use bevy::log::debug;
use bevy_rig_graph_core::{
    clip::{ChannelCurve, Clip, ClipBuilder, frame_count},
    clip_configuration::ClipConfigurationMask,
    errors::{ClipError, GraphError, GraphResult, InvalidMotion},
    id::ChannelId,
    rig::{ChannelKind, RigDefinition},
    stream::AnimationStream,
};

use crate::composer::ConfigurableClipNode;

/// A curve being baked: the rig binding it reads and the keys collected so far.
struct BakedCurve<T> {
    binding: usize,
    id: ChannelId,
    keys: Vec<T>,
}

impl<T> BakedCurve<T> {
    fn for_source(rig: &RigDefinition, kind: ChannelKind, source: &[ChannelCurve<T>]) -> Vec<Self> {
        source
            .iter()
            .filter_map(|curve| {
                rig.binding_index(kind, curve.id).map(|binding| Self {
                    binding,
                    id: curve.id,
                    keys: Vec::new(),
                })
            })
            .collect()
    }

    fn into_curve(self) -> (ChannelId, Vec<T>) {
        (self.id, self.keys)
    }
}

fn record<T>(curves: &mut [BakedCurve<T>], read: impl Fn(usize) -> T) {
    for curve in curves {
        curve.keys.push(read(curve.binding));
    }
}

/// Adds a root curve in front unless one is already baked.
fn prepend_root<T>(curves: &mut Vec<BakedCurve<T>>, root: usize, id: ChannelId) {
    if !curves.iter().any(|curve| curve.binding == root) {
        curves.insert(
            0,
            BakedCurve {
                binding: root,
                id,
                keys: Vec::new(),
            },
        );
    }
}

/// Samples a configured composer at `sample_rate` into a standalone clip.
///
/// The baked clip animates the channels of the source clip the rig knows, in the same order.
/// When in-place extraction is configured and the source clip has no root curves, root
/// translation and rotation curves are added in front so the extracted motion is kept.
pub fn bake_clip(composer: &mut ConfigurableClipNode, sample_rate: f32) -> GraphResult<Clip> {
    if !sample_rate.is_finite() || sample_rate <= 0. {
        return Err(ClipError::InvalidSampleRate(sample_rate).into());
    }
    let rig = composer.rig().cloned().ok_or(GraphError::RigMissing)?;
    let source = composer
        .clip()
        .cloned()
        .ok_or(InvalidMotion::ClipMissing)?;

    let mut translations =
        BakedCurve::for_source(&rig, ChannelKind::Translation, source.translations());
    let mut rotations = BakedCurve::for_source(&rig, ChannelKind::Rotation, source.rotations());
    let mut scales = BakedCurve::for_source(&rig, ChannelKind::Scale, source.scales());
    let mut floats = BakedCurve::for_source(&rig, ChannelKind::Float, source.floats());
    let mut ints = BakedCurve::for_source(&rig, ChannelKind::Int, source.ints());

    if composer.configuration().in_place() {
        if let Some(root) = rig.root_bone() {
            let id = rig.bones()[root].id;
            prepend_root(&mut translations, root, id);
            prepend_root(&mut rotations, root, id);
        }
    }

    let duration = source.duration();
    let frames = frame_count(duration, sample_rate);
    let normalized = composer
        .configuration()
        .contains(ClipConfigurationMask::NORMALIZED_TIME);
    let to_input = |seconds: f32| {
        if normalized && duration > 0. {
            seconds / duration
        } else {
            seconds
        }
    };
    let delta_time = to_input(sample_rate.recip());

    for frame in 0..frames {
        let time = (frame as f32 / sample_rate).min(duration);
        let stream: &AnimationStream = composer.evaluate(to_input(time), delta_time)?;
        record(&mut translations, |bone| stream.translation(bone));
        record(&mut rotations, |bone| stream.rotation(bone));
        record(&mut scales, |bone| stream.scale(bone));
        record(&mut floats, |index| stream.float(index));
        record(&mut ints, |index| stream.int(index));
    }
    debug!("Baked {frames} frames at {sample_rate} Hz from a {duration}s clip");

    let builder = ClipBuilder::new(duration, sample_rate);
    let builder = translations
        .into_iter()
        .map(BakedCurve::into_curve)
        .fold(builder, |builder, (id, keys)| builder.translation(id, keys));
    let builder = rotations
        .into_iter()
        .map(BakedCurve::into_curve)
        .fold(builder, |builder, (id, keys)| builder.rotation(id, keys));
    let builder = scales
        .into_iter()
        .map(BakedCurve::into_curve)
        .fold(builder, |builder, (id, keys)| builder.scale(id, keys));
    let builder = floats
        .into_iter()
        .map(BakedCurve::into_curve)
        .fold(builder, |builder, (id, keys)| builder.float(id, keys));
    let builder = ints
        .into_iter()
        .map(BakedCurve::into_curve)
        .fold(builder, |builder, (id, keys)| builder.int(id, keys));
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use bevy::math::Vec3;
    use bevy_rig_graph_core::{
        clip_configuration::ClipConfiguration,
        test_fixtures::{HIPS, ROOT, hips_motion_clip, test_rig, walk_clip},
    };

    use super::*;
    use crate::node::NodeResources;

    fn composer(clip: std::sync::Arc<Clip>, config: ClipConfiguration) -> ConfigurableClipNode {
        let resources = NodeResources::default();
        let mut node = ConfigurableClipNode::new(config);
        node.set_rig(test_rig(), &resources).unwrap();
        node.set_clip(Some(clip), &resources).unwrap();
        node
    }

    #[test]
    fn plain_bake_reproduces_source() {
        let source = walk_clip();
        let mut node = composer(source.clone(), ClipConfiguration::default());
        let baked = bake_clip(&mut node, source.sample_rate()).unwrap();

        assert_eq!(baked.duration(), source.duration());
        assert_eq!(baked.translations().len(), source.translations().len());
        for (baked, source) in baked.translations().iter().zip(source.translations()) {
            assert_eq!(baked.id, source.id);
            for (baked_key, source_key) in baked.keys.iter().zip(&source.keys) {
                assert!(baked_key.abs_diff_eq(*source_key, 1e-6));
            }
        }
        assert_eq!(baked.ints()[0].keys, source.ints()[0].keys);
    }

    #[test]
    fn in_place_bake_adds_root_curves() {
        let mut node = composer(
            hips_motion_clip(),
            ClipConfiguration::default().with_motion(HIPS),
        );
        let baked = bake_clip(&mut node, 4.).unwrap();

        let root = ChannelId::from_path(ROOT);
        assert_eq!(baked.translations()[0].id, root);
        assert_eq!(baked.rotations()[0].id, root);
        assert!(
            baked
                .sample_translation(root, 0.5)
                .unwrap()
                .abs_diff_eq(Vec3::new(0., 0., 1.5), 1e-5)
        );
        let hips = baked
            .sample_translation(ChannelId::from_path(HIPS), 1.)
            .unwrap();
        assert!(hips.x.abs() < 1e-5 && hips.z.abs() < 1e-5);
    }

    #[test]
    fn rejects_bad_sample_rate() {
        let mut node = composer(walk_clip(), ClipConfiguration::default());
        assert_eq!(
            bake_clip(&mut node, 0.),
            Err(GraphError::Clip(ClipError::InvalidSampleRate(0.)))
        );
    }
}
