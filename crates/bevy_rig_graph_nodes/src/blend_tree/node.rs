use std::sync::Arc;

use bevy::{log::debug, math::Vec2};
use bevy_rig_graph_core::{
    clip::Clip,
    clip_configuration::{ClipConfiguration, ClipConfigurationMask},
    errors::{GraphError, GraphResult},
    rig::RigDefinition,
    stream::AnimationStream,
};

use super::{
    BlendTree1D, BlendTree2D, blended_duration, compute_blend_tree_1d_weights,
    compute_blend_tree_2d_simple_directional_weights,
};
use crate::{
    composer::ConfigurableClipNode,
    edge_data::{DataRef, DataSpec},
    mixer::NMixer,
    node::{NodeContext, NodeMessage, NodeResources, NodeSpec, PinId, RigNode},
};

/// One looping composer per motion, mixed by a weight vector.
#[derive(Default)]
struct MotionPlayers {
    composers: Vec<ConfigurableClipNode>,
    speeds: Vec<f32>,
    mixer: Option<NMixer>,
    duration: f32,
}

impl MotionPlayers {
    fn rebuild<'a>(
        &mut self,
        rig: Option<&Arc<RigDefinition>>,
        motions: impl Iterator<Item = (Option<&'a Arc<Clip>>, f32)>,
        resources: &NodeResources,
    ) -> GraphResult<()> {
        let config = ClipConfiguration::new(
            ClipConfigurationMask::NORMALIZED_TIME | ClipConfigurationMask::LOOP_TIME,
        );
        self.composers.clear();
        self.speeds.clear();
        self.duration = 0.;
        self.mixer = rig.map(|rig| NMixer::new(rig, false));

        for (clip, speed) in motions {
            let mut composer = ConfigurableClipNode::new(config);
            if let Some(rig) = rig {
                composer.set_rig(rig.clone(), resources)?;
            }
            composer.set_clip(clip.cloned(), resources)?;
            self.composers.push(composer);
            self.speeds.push(speed);
        }
        debug!("Rebuilt blend tree with {} motions", self.composers.len());
        Ok(())
    }

    fn evaluate(&mut self, weights: &[f32], normalized_time: f32, delta_time: f32) -> GraphResult<()> {
        let Some(mixer) = &mut self.mixer else {
            return Err(GraphError::RigMissing);
        };
        if weights.len() != self.composers.len() {
            return Err(GraphError::PortOutOfBounds {
                pin: "motions",
                index: weights.len(),
                len: self.composers.len(),
            });
        }

        mixer.clear();
        for (composer, weight) in self.composers.iter_mut().zip(weights) {
            if *weight == 0. {
                continue;
            }
            let stream = composer.evaluate(normalized_time, delta_time)?;
            mixer.add(Some(stream), *weight)?;
        }
        mixer.finish()?;

        self.duration = blended_duration(
            weights,
            self.composers
                .iter()
                .zip(&self.speeds)
                .map(|(composer, speed)| (composer.duration(), *speed)),
        );
        Ok(())
    }

    fn output(&self) -> Option<&AnimationStream> {
        self.mixer.as_ref().map(NMixer::output)
    }
}

/// Blends the motions of a [`BlendTree1D`] by a scalar `blend_parameter`.
///
/// Every motion loops in normalized time, so motions of different durations stay in phase.
#[derive(Default)]
pub struct BlendTree1DNode {
    tree: Option<Arc<BlendTree1D>>,
    rig: Option<Arc<RigDefinition>>,
    players: MotionPlayers,
    weights: Vec<f32>,
}

impl BlendTree1DNode {
    pub const IN_PARAMETER: &'static str = "blend_parameter";
    pub const IN_TIME: &'static str = "normalized_time";
    pub const IN_DELTA_TIME: &'static str = "delta_time";
    pub const OUT_POSE: &'static str = "output";
    pub const OUT_DURATION: &'static str = "duration";

    pub fn tree(&self) -> Option<&Arc<BlendTree1D>> {
        self.tree.as_ref()
    }

    /// Weights of the last evaluation.
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    pub fn duration(&self) -> f32 {
        self.players.duration
    }

    pub fn output(&self) -> Option<&AnimationStream> {
        self.players.output()
    }

    fn rebuild(&mut self, resources: &NodeResources) -> GraphResult<()> {
        let Some(tree) = self.tree.clone() else {
            return Ok(());
        };
        self.players.rebuild(
            self.rig.as_ref(),
            tree.motions()
                .iter()
                .map(|motion| (motion.clip.as_ref(), motion.speed)),
            resources,
        )
    }

    pub fn evaluate(&mut self, parameter: f32, normalized_time: f32, delta_time: f32) -> GraphResult<()> {
        let Some(tree) = &self.tree else {
            return Err(GraphError::BlendTreeMissing);
        };
        self.weights = compute_blend_tree_1d_weights(tree.thresholds(), parameter);
        self.players
            .evaluate(&self.weights, normalized_time, delta_time)
    }
}

impl RigNode for BlendTree1DNode {
    fn display_name(&self) -> &'static str {
        "⤨ Blend Tree 1D"
    }

    fn spec(&self, spec: &mut NodeSpec) {
        spec.add_input_data(Self::IN_PARAMETER, DataSpec::F32)
            .add_input_data(Self::IN_TIME, DataSpec::F32)
            .add_input_data(Self::IN_DELTA_TIME, DataSpec::F32)
            .add_output_data(Self::OUT_POSE, DataSpec::Stream)
            .add_output_data(Self::OUT_DURATION, DataSpec::F32);
    }

    fn handle_message(
        &mut self,
        message: &NodeMessage,
        resources: &NodeResources,
    ) -> GraphResult<()> {
        match message {
            NodeMessage::Rig(rig) => self.rig = Some(rig.clone()),
            NodeMessage::BlendTree1D(tree) => self.tree = Some(tree.clone()),
            other => {
                return Err(GraphError::UnsupportedMessage {
                    node: self.display_name(),
                    message: other.name(),
                });
            }
        }
        self.rebuild(resources)
    }

    fn update(&mut self, ctx: NodeContext) -> GraphResult<()> {
        let parameter = ctx.f32_back_or(Self::IN_PARAMETER, 0.)?;
        let time = ctx.f32_back_or(Self::IN_TIME, 0.)?;
        let delta_time = ctx.f32_back_or(Self::IN_DELTA_TIME, 0.)?;
        self.evaluate(parameter, time, delta_time)
    }

    fn output(&self, pin: PinId) -> Option<DataRef<'_>> {
        match pin.name {
            Self::OUT_POSE => self.output().map(DataRef::from),
            Self::OUT_DURATION => Some(DataRef::F32(self.duration())),
            _ => None,
        }
    }
}

/// Blends the motions of a [`BlendTree2D`] by a 2D `blend_parameter`.
#[derive(Default)]
pub struct BlendTree2DNode {
    tree: Option<Arc<BlendTree2D>>,
    rig: Option<Arc<RigDefinition>>,
    players: MotionPlayers,
    weights: Vec<f32>,
}

impl BlendTree2DNode {
    pub const IN_PARAMETER: &'static str = "blend_parameter";
    pub const IN_TIME: &'static str = "normalized_time";
    pub const IN_DELTA_TIME: &'static str = "delta_time";
    pub const OUT_POSE: &'static str = "output";
    pub const OUT_DURATION: &'static str = "duration";

    pub fn tree(&self) -> Option<&Arc<BlendTree2D>> {
        self.tree.as_ref()
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    pub fn duration(&self) -> f32 {
        self.players.duration
    }

    pub fn output(&self) -> Option<&AnimationStream> {
        self.players.output()
    }

    fn rebuild(&mut self, resources: &NodeResources) -> GraphResult<()> {
        let Some(tree) = self.tree.clone() else {
            return Ok(());
        };
        self.players.rebuild(
            self.rig.as_ref(),
            tree.motions()
                .iter()
                .map(|motion| (motion.clip.as_ref(), motion.speed)),
            resources,
        )
    }

    pub fn evaluate(
        &mut self,
        parameter: Vec2,
        normalized_time: f32,
        delta_time: f32,
    ) -> GraphResult<()> {
        let Some(tree) = &self.tree else {
            return Err(GraphError::BlendTreeMissing);
        };
        self.weights = compute_blend_tree_2d_simple_directional_weights(tree.positions(), parameter);
        self.players
            .evaluate(&self.weights, normalized_time, delta_time)
    }
}

impl RigNode for BlendTree2DNode {
    fn display_name(&self) -> &'static str {
        "⤨ Blend Tree 2D"
    }

    fn spec(&self, spec: &mut NodeSpec) {
        spec.add_input_data(Self::IN_PARAMETER, DataSpec::Vec2)
            .add_input_data(Self::IN_TIME, DataSpec::F32)
            .add_input_data(Self::IN_DELTA_TIME, DataSpec::F32)
            .add_output_data(Self::OUT_POSE, DataSpec::Stream)
            .add_output_data(Self::OUT_DURATION, DataSpec::F32);
    }

    fn handle_message(
        &mut self,
        message: &NodeMessage,
        resources: &NodeResources,
    ) -> GraphResult<()> {
        match message {
            NodeMessage::Rig(rig) => self.rig = Some(rig.clone()),
            NodeMessage::BlendTree2D(tree) => self.tree = Some(tree.clone()),
            other => {
                return Err(GraphError::UnsupportedMessage {
                    node: self.display_name(),
                    message: other.name(),
                });
            }
        }
        self.rebuild(resources)
    }

    fn update(&mut self, ctx: NodeContext) -> GraphResult<()> {
        let parameter = match ctx.data_back_opt(Self::IN_PARAMETER) {
            Some(value) => value.as_vec2()?,
            None => Vec2::ZERO,
        };
        let time = ctx.f32_back_or(Self::IN_TIME, 0.)?;
        let delta_time = ctx.f32_back_or(Self::IN_DELTA_TIME, 0.)?;
        self.evaluate(parameter, time, delta_time)
    }

    fn output(&self, pin: PinId) -> Option<DataRef<'_>> {
        match pin.name {
            Self::OUT_POSE => self.output().map(DataRef::from),
            Self::OUT_DURATION => Some(DataRef::F32(self.duration())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use bevy::math::Vec3;
    use bevy_rig_graph_core::test_fixtures::{pose_clip, test_rig};

    use super::*;
    use crate::blend_tree::{BlendTreeMotion1D, BlendTreeMotion2D};

    fn tree_1d() -> Arc<BlendTree1D> {
        Arc::new(
            BlendTree1D::new(vec![
                BlendTreeMotion1D {
                    clip: Some(pose_clip(1., 0.)),
                    threshold: 0.,
                    speed: 1.,
                },
                BlendTreeMotion1D {
                    clip: Some(pose_clip(2., 1.)),
                    threshold: 1.,
                    speed: 2.,
                },
            ])
            .unwrap(),
        )
    }

    fn configured_1d() -> BlendTree1DNode {
        let resources = NodeResources::default();
        let mut node = BlendTree1DNode::default();
        node.handle_message(&NodeMessage::BlendTree1D(tree_1d()), &resources)
            .unwrap();
        node.handle_message(&NodeMessage::Rig(test_rig()), &resources)
            .unwrap();
        node
    }

    #[test]
    fn blends_motions_by_parameter() {
        let mut node = configured_1d();
        node.evaluate(0.25, 0.5, 0.).unwrap();

        assert_eq!(node.weights(), &[0.75, 0.25]);
        let output = node.output().unwrap();
        assert!(
            output
                .translation(2)
                .abs_diff_eq(Vec3::new(0.25, 0.5, 0.), 1e-5)
        );
        assert!((output.float(0) - 0.25).abs() < 1e-5);
        // 0.75 * 1s / 1 + 0.25 * 2s / 2
        assert!((node.duration() - 1.).abs() < 1e-6);
    }

    #[test]
    fn needs_a_tree_to_evaluate() {
        let resources = NodeResources::default();
        let mut node = BlendTree1DNode::default();
        node.handle_message(&NodeMessage::Rig(test_rig()), &resources)
            .unwrap();
        assert_eq!(node.evaluate(0.5, 0., 0.), Err(GraphError::BlendTreeMissing));
        assert_eq!(
            BlendTree2DNode::default().evaluate(Vec2::ZERO, 0., 0.),
            Err(GraphError::BlendTreeMissing)
        );
    }

    #[test]
    fn needs_a_rig_to_evaluate() {
        let resources = NodeResources::default();
        let mut node = BlendTree1DNode::default();
        node.handle_message(&NodeMessage::BlendTree1D(tree_1d()), &resources)
            .unwrap();
        assert_eq!(node.evaluate(0.5, 0., 0.), Err(GraphError::RigMissing));
    }

    #[test]
    fn two_dimensional_center_at_origin() {
        let resources = NodeResources::default();
        let tree = BlendTree2D::new(vec![
            BlendTreeMotion2D {
                clip: Some(pose_clip(1., 0.)),
                position: Vec2::ZERO,
                speed: 1.,
            },
            BlendTreeMotion2D {
                clip: Some(pose_clip(1., 1.)),
                position: Vec2::X,
                speed: 1.,
            },
        ])
        .unwrap();
        let mut node = BlendTree2DNode::default();
        node.handle_message(&NodeMessage::Rig(test_rig()), &resources)
            .unwrap();
        node.handle_message(&NodeMessage::BlendTree2D(Arc::new(tree)), &resources)
            .unwrap();

        node.evaluate(Vec2::ZERO, 0.3, 0.).unwrap();
        assert_eq!(node.weights(), &[1., 0.]);
        node.evaluate(Vec2::new(0.5, 0.), 0.3, 0.).unwrap();
        assert_eq!(node.weights(), &[0.5, 0.5]);
        let output = node.output().unwrap();
        assert!((output.float(0) - 0.5).abs() < 1e-5);
    }
}
