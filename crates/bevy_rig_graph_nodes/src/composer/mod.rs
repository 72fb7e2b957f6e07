//! The configurable clip node: samples a clip through a pipeline of stages whose shape is
//! derived from a [`ClipConfiguration`].

mod shape;
mod stages;
mod time;

pub use shape::{Branch, StageDesc, desired_shape};
pub use stages::BranchBuffers;
pub use time::PipelineTime;

use std::sync::Arc;

use bevy::log::debug;
use bevy_rig_graph_core::{
    clip::Clip,
    clip_configuration::ClipConfiguration,
    errors::{GraphError, GraphResult, InvalidMotion},
    rig::{ChannelKind, RigDefinition},
    stream::AnimationStream,
};
use stages::{Stage, StageInputs, StageSlot, finish_delta};

use crate::{
    edge_data::{DataRef, DataSpec},
    node::{NodeContext, NodeMessage, NodeResources, NodeSpec, PinId, RigNode},
};

/// Samples a clip with looping, normalized time and root motion handled by an internal
/// pipeline.
///
/// Every message that affects the pipeline rebuilds it right away: stages whose descriptor is
/// still wanted are kept, the others are dropped and the missing ones created. A node without
/// a clip is inert and outputs the default pose with zero duration.
#[derive(Default)]
pub struct ConfigurableClipNode {
    rig: Option<Arc<RigDefinition>>,
    clip: Option<Arc<Clip>>,
    config: ClipConfiguration,
    additive: bool,
    skip_root: bool,
    stages: Vec<StageSlot>,
    /// Why the last rebuild failed. Evaluation reports it until the next successful rebuild.
    failure: Option<GraphError>,
    current: Option<BranchBuffers>,
    previous: Option<BranchBuffers>,
}

impl ConfigurableClipNode {
    pub const IN_TIME: &'static str = "time";
    pub const IN_DELTA_TIME: &'static str = "delta_time";
    pub const OUT_POSE: &'static str = "output";
    pub const OUT_DURATION: &'static str = "duration";

    pub fn new(config: ClipConfiguration) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn configuration(&self) -> &ClipConfiguration {
        &self.config
    }

    pub fn clip(&self) -> Option<&Arc<Clip>> {
        self.clip.as_ref()
    }

    pub fn rig(&self) -> Option<&Arc<RigDefinition>> {
        self.rig.as_ref()
    }

    /// Descriptors of the current pipeline, in execution order.
    pub fn shape(&self) -> impl Iterator<Item = StageDesc> + '_ {
        self.stages.iter().map(|slot| slot.desc)
    }

    pub fn set_rig(
        &mut self,
        rig: Arc<RigDefinition>,
        resources: &NodeResources,
    ) -> GraphResult<()> {
        self.current = Some(BranchBuffers::new(&rig, self.additive));
        self.previous = None;
        self.rig = Some(rig);
        self.stages.clear();
        self.rebuild(resources)
    }

    pub fn set_clip(&mut self, clip: Option<Arc<Clip>>, resources: &NodeResources) -> GraphResult<()> {
        self.clip = clip;
        self.stages.clear();
        self.rebuild(resources)
    }

    pub fn configure(
        &mut self,
        config: ClipConfiguration,
        resources: &NodeResources,
    ) -> GraphResult<()> {
        self.config = config;
        self.rebuild(resources)
    }

    /// Marks the clip as holding additive values. Unwritten channels read as the additive
    /// identity.
    pub fn set_additive(&mut self, additive: bool) {
        self.additive = additive;
        if let Some(rig) = &self.rig {
            self.current = Some(BranchBuffers::new(rig, additive));
            self.previous = None;
        }
    }

    /// Leaves the root channels at their default in the output.
    pub fn set_skip_root(&mut self, skip_root: bool) {
        self.skip_root = skip_root;
    }

    fn rebuild(&mut self, resources: &NodeResources) -> GraphResult<()> {
        self.failure = None;
        let result = self.reconcile(resources);
        if let Err(error) = &result {
            self.stages.clear();
            self.failure = Some(error.clone());
        }
        result
    }

    fn reconcile(&mut self, resources: &NodeResources) -> GraphResult<()> {
        let (Some(rig), Some(clip)) = (self.rig.clone(), self.clip.clone()) else {
            self.stages.clear();
            return Ok(());
        };
        if clip.is_empty() {
            return Err(InvalidMotion::EmptyClip.into());
        }

        let inputs = StageInputs {
            rig: &rig,
            clip: &clip,
            resources,
        };
        let mut old: Vec<Option<StageSlot>> = self.stages.drain(..).map(Some).collect();
        let mut stages = Vec::new();
        for desc in desired_shape(&self.config) {
            let kept = old
                .iter_mut()
                .find(|slot| slot.as_ref().is_some_and(|slot| slot.desc == desc))
                .and_then(Option::take);
            let slot = match kept {
                Some(slot) => slot,
                None => StageSlot {
                    desc,
                    stage: Stage::build(desc, &inputs)?,
                },
            };
            stages.push(slot);
        }
        self.stages = stages;

        debug!(
            "Rebuilt clip pipeline: {:?}",
            self.stages.iter().map(|slot| slot.desc).collect::<Vec<_>>()
        );
        Ok(())
    }

    /// Duration of the clip in seconds, zero without a clip.
    pub fn duration(&self) -> f32 {
        self.clip.as_ref().map_or(0., |clip| clip.duration())
    }

    /// The stream written by the last evaluation.
    pub fn output(&self) -> Option<&AnimationStream> {
        self.current.as_ref().map(|buffers| &buffers.main)
    }

    /// Evaluates the pipeline at `time`. `delta_time` is the time step since the previous
    /// evaluation, in the same unit as `time`.
    pub fn evaluate(&mut self, time: f32, delta_time: f32) -> GraphResult<&AnimationStream> {
        if let Some(failure) = &self.failure {
            return Err(failure.clone());
        }
        let Some(rig) = &self.rig else {
            return Err(GraphError::RigMissing);
        };
        let current = self
            .current
            .get_or_insert_with(|| BranchBuffers::new(rig, self.additive));
        current.begin_frame();

        if self.clip.is_none() {
            current.main.reset_to_default();
            return Ok(&current.main);
        }

        let duration = self.clip.as_ref().map_or(0., |clip| clip.duration());
        let delta = self
            .stages
            .last()
            .is_some_and(|slot| slot.desc == StageDesc::DeltaRootMotion);

        run_stages(
            &self.stages,
            PipelineTime::new(time, delta_time),
            current,
            duration,
            self.skip_root,
        );
        if delta {
            let previous = self
                .previous
                .get_or_insert_with(|| BranchBuffers::new(rig, self.additive));
            previous.begin_frame();
            run_stages(
                &self.stages,
                PipelineTime::new(time - delta_time, delta_time),
                previous,
                duration,
                self.skip_root,
            );
            finish_delta(current, previous);
        }

        if self.skip_root {
            if let Some(root) = rig.root_bone() {
                for kind in [ChannelKind::Translation, ChannelKind::Rotation, ChannelKind::Scale] {
                    current.main.reset_channel(kind, root);
                }
            }
        }

        Ok(&current.main)
    }
}

fn run_stages(
    stages: &[StageSlot],
    mut time: PipelineTime,
    buffers: &mut BranchBuffers,
    duration: f32,
    skip_root: bool,
) {
    for slot in stages {
        slot.stage.run(&mut time, buffers, duration, skip_root);
    }
}

impl RigNode for ConfigurableClipNode {
    fn display_name(&self) -> &'static str {
        "⏵ Configurable Clip"
    }

    fn spec(&self, spec: &mut NodeSpec) {
        spec.add_input_data(Self::IN_TIME, DataSpec::F32)
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
            NodeMessage::Rig(rig) => self.set_rig(rig.clone(), resources),
            NodeMessage::Clip(clip) => self.set_clip(clip.clone(), resources),
            NodeMessage::Configuration(config) => self.configure(*config, resources),
            NodeMessage::Additive(additive) => {
                self.set_additive(*additive);
                Ok(())
            }
            NodeMessage::SkipRoot(skip_root) => {
                self.set_skip_root(*skip_root);
                Ok(())
            }
            other => Err(GraphError::UnsupportedMessage {
                node: self.display_name(),
                message: other.name(),
            }),
        }
    }

    fn update(&mut self, ctx: NodeContext) -> GraphResult<()> {
        let time = ctx.f32_back_or(Self::IN_TIME, 0.)?;
        let delta_time = ctx.f32_back_or(Self::IN_DELTA_TIME, 0.)?;
        self.evaluate(time, delta_time)?;
        Ok(())
    }

    fn output(&self, pin: PinId) -> Option<DataRef<'_>> {
        match pin.name {
            Self::OUT_POSE => self.output().map(DataRef::from),
            Self::OUT_DURATION => Some(DataRef::F32(self.duration())),
            _ => None,
        }
    }
}
