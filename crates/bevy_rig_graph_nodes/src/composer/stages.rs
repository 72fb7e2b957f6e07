use std::sync::Arc;

use bevy_rig_graph_core::{
    channel_weights::ChannelWeightTable,
    clip::{Clip, ClipInstance},
    errors::{GraphError, GraphResult},
    interpolation::{AdditiveInterpolator, difference_in_place},
    rig::RigDefinition,
    stream::{AnimationStream, RootPolicy},
};

use super::{
    shape::{Branch, StageDesc},
    time::PipelineTime,
};
use crate::{
    node::NodeResources,
    root_motion::{
        InPlaceExtraction, cycle_root_motion, delta_root_motion, root_motion_from_velocity,
    },
};

/// Streams of one evaluation of a composer pipeline.
#[derive(Clone, Debug)]
pub struct BranchBuffers {
    pub main: AnimationStream,
    pub start: AnimationStream,
    pub stop: AnimationStream,
    /// Scratch for the stop minus start difference.
    pub delta: AnimationStream,
}

impl BranchBuffers {
    pub fn new(rig: &Arc<RigDefinition>, additive: bool) -> Self {
        let stream = AnimationStream::new(rig, additive);
        Self {
            main: stream.clone(),
            start: stream.clone(),
            stop: stream.clone(),
            delta: stream,
        }
    }

    pub fn get_mut(&mut self, branch: Branch) -> &mut AnimationStream {
        match branch {
            Branch::Main => &mut self.main,
            Branch::Start => &mut self.start,
            Branch::Stop => &mut self.stop,
        }
    }

    /// Starts a new frame on every branch.
    pub fn begin_frame(&mut self) {
        self.main.begin_frame();
        self.start.begin_frame();
        self.stop.begin_frame();
    }
}

/// What a stage needs to be built.
pub struct StageInputs<'a> {
    pub rig: &'a Arc<RigDefinition>,
    pub clip: &'a Arc<Clip>,
    pub resources: &'a NodeResources,
}

/// A built stage: its descriptor plus whatever state it precomputes from the rig and clip.
#[derive(Debug)]
pub enum Stage {
    NormalizedTime,
    TimeLoop,
    Sample {
        branch: Branch,
        instance: Arc<ClipInstance>,
    },
    InPlace {
        extraction: InPlaceExtraction,
        boundaries: bool,
    },
    LoopValues {
        weights: Option<ChannelWeightTable>,
    },
    CycleRootMotion,
    RootMotionFromVelocity,
    DeltaRootMotion,
}

impl Stage {
    pub fn build(desc: StageDesc, inputs: &StageInputs) -> GraphResult<Self> {
        let needs_root = matches!(
            desc,
            StageDesc::CycleRootMotion
                | StageDesc::RootMotionFromVelocity
                | StageDesc::DeltaRootMotion
        );
        if needs_root && inputs.rig.root_bone().is_none() {
            return Err(GraphError::MissingRoot);
        }

        Ok(match desc {
            StageDesc::NormalizedTime => Stage::NormalizedTime,
            StageDesc::TimeLoop => Stage::TimeLoop,
            StageDesc::Sample(branch) => Stage::Sample {
                branch,
                instance: inputs
                    .resources
                    .clip_cache
                    .get_or_create(inputs.rig, inputs.clip),
            },
            StageDesc::InPlace { motion, boundaries } => Stage::InPlace {
                extraction: InPlaceExtraction::new(inputs.rig, inputs.clip, motion)?,
                boundaries,
            },
            StageDesc::LoopValues { zero_root } => Stage::LoopValues {
                weights: match (zero_root, inputs.rig.root_bone()) {
                    (true, Some(root)) => {
                        let mut table = ChannelWeightTable::new();
                        table.set_weight(inputs.rig.bones()[root].id, 0.);
                        Some(table)
                    }
                    _ => None,
                },
            },
            StageDesc::CycleRootMotion => Stage::CycleRootMotion,
            StageDesc::RootMotionFromVelocity => Stage::RootMotionFromVelocity,
            StageDesc::DeltaRootMotion => Stage::DeltaRootMotion,
        })
    }

    /// Runs the stage. [`Stage::DeltaRootMotion`] needs a second evaluation and is driven by
    /// the composer instead.
    pub fn run(
        &self,
        time: &mut PipelineTime,
        buffers: &mut BranchBuffers,
        duration: f32,
        skip_root: bool,
    ) {
        match self {
            Stage::NormalizedTime => time.denormalize(duration),
            Stage::TimeLoop => time.wrap(duration),
            Stage::Sample { branch, instance } => {
                let sample_time = match branch {
                    Branch::Main => time.time,
                    Branch::Start => 0.,
                    Branch::Stop => duration,
                };
                let stream = buffers.get_mut(*branch);
                stream.begin_pass(RootPolicy::Clear);
                instance.sample(sample_time, stream, skip_root);
            }
            Stage::InPlace {
                extraction,
                boundaries,
            } => {
                extraction.apply(&mut buffers.main);
                if *boundaries {
                    extraction.apply(&mut buffers.start);
                    extraction.apply(&mut buffers.stop);
                }
            }
            Stage::LoopValues { weights } => {
                buffers.delta.copy_from(&buffers.start);
                difference_in_place(&mut buffers.delta, &buffers.stop);
                AdditiveInterpolator {
                    weights: weights.as_ref(),
                }
                .interpolate_stream(&mut buffers.main, &buffers.delta, -time.cycle_fraction);
            }
            Stage::CycleRootMotion => {
                cycle_root_motion(&mut buffers.main, &buffers.start, &buffers.stop, time.cycle)
            }
            Stage::RootMotionFromVelocity => {
                root_motion_from_velocity(&mut buffers.main, time.delta_time)
            }
            Stage::DeltaRootMotion => {}
        }
    }
}

/// Finishes a delta root motion pipeline: `current`'s root becomes the motion since
/// `previous`.
pub fn finish_delta(current: &mut BranchBuffers, previous: &BranchBuffers) {
    delta_root_motion(&mut current.main, &previous.main);
}

/// A slot of the composer's stage arena.
#[derive(Debug)]
pub struct StageSlot {
    pub desc: StageDesc,
    pub stage: Stage,
}
