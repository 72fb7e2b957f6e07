use bevy::{
    ecs::{component::Component, reflect::ReflectComponent},
    math::Isometry3d,
    reflect::{Reflect, std_traits::ReflectDefault},
};
use bevy_rig_graph_core::{
    errors::{GraphError, GraphResult},
    stream::AnimationStream,
};
use bevy_rig_graph_nodes::{edge_data::DataSpec, root_motion::RootMotionAccumulator};

use crate::node_set::{NodeSet, SourcePin, TargetPin};

/// Plays a rig graph on an entity.
///
/// Every frame the elapsed time is written to the time inputs, the graph is evaluated and the
/// output pose is kept. The root motion of the pose is integrated by the player's
/// [`RootMotionAccumulator`], which the plugin applies to the entity's `Transform`.
#[derive(Component, Reflect)]
#[reflect(Component, Default)]
pub struct RigGraphPlayer {
    paused: bool,
    elapsed: f32,
    speed: f32,
    anchored: bool,
    #[reflect(ignore)]
    graph: NodeSet,
    #[reflect(ignore)]
    output: Option<SourcePin>,
    #[reflect(ignore)]
    time_inputs: Vec<TargetPin>,
    #[reflect(ignore)]
    delta_time_inputs: Vec<TargetPin>,
    #[reflect(ignore)]
    accumulator: RootMotionAccumulator,
    #[reflect(ignore)]
    pose: Option<AnimationStream>,
    /// Error of the last evaluation
    #[reflect(ignore)]
    error: Option<GraphError>,
}

impl Default for RigGraphPlayer {
    fn default() -> Self {
        Self::new(NodeSet::default())
    }
}

impl RigGraphPlayer {
    pub fn new(graph: NodeSet) -> Self {
        Self {
            paused: false,
            elapsed: 0.,
            speed: 1.,
            anchored: false,
            graph,
            output: None,
            time_inputs: Vec::new(),
            delta_time_inputs: Vec::new(),
            accumulator: RootMotionAccumulator::new(),
            pose: None,
            error: None,
        }
    }

    pub fn graph(&self) -> &NodeSet {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut NodeSet {
        &mut self.graph
    }

    /// Sets the pin whose stream is the pose of the entity.
    pub fn set_output(&mut self, source: SourcePin) -> GraphResult<()> {
        expect_spec(self.graph.output_data_spec(source)?, DataSpec::Stream)?;
        self.output = Some(source);
        Ok(())
    }

    /// Adds an input that receives the elapsed time, in seconds.
    pub fn add_time_input(&mut self, target: TargetPin) -> GraphResult<()> {
        expect_spec(self.graph.input_data_spec(target)?, DataSpec::F32)?;
        self.time_inputs.push(target);
        Ok(())
    }

    /// Adds an input that receives the frame's time step, in seconds.
    pub fn add_delta_time_input(&mut self, target: TargetPin) -> GraphResult<()> {
        expect_spec(self.graph.input_data_spec(target)?, DataSpec::F32)?;
        self.delta_time_inputs.push(target);
        Ok(())
    }

    pub fn pause(&mut self) -> &mut Self {
        self.paused = true;
        self
    }

    pub fn resume(&mut self) -> &mut Self {
        self.paused = false;
        self
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Playback speed multiplier.
    pub fn set_speed(&mut self, speed: f32) -> &mut Self {
        self.speed = speed;
        self
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn seek(&mut self, time: f32) -> &mut Self {
        self.elapsed = time;
        self
    }

    pub fn accumulator(&self) -> &RootMotionAccumulator {
        &self.accumulator
    }

    pub fn accumulator_mut(&mut self) -> &mut RootMotionAccumulator {
        &mut self.accumulator
    }

    /// Starts root motion accumulation from `transform`.
    pub fn anchor(&mut self, transform: Isometry3d) {
        self.accumulator.reset(transform);
        self.anchored = true;
    }

    pub fn is_anchored(&self) -> bool {
        self.anchored
    }

    /// The output pose of the last successful evaluation.
    pub fn pose(&self) -> Option<&AnimationStream> {
        self.pose.as_ref()
    }

    pub fn last_error(&self) -> Option<&GraphError> {
        self.error.as_ref()
    }

    /// Advances time by `delta_time` seconds and evaluates the graph.
    ///
    /// Returns the accumulated root transform when `apply_root_motion` is set. A failed
    /// evaluation keeps the previous pose.
    pub fn advance(
        &mut self,
        delta_time: f32,
        apply_root_motion: bool,
    ) -> GraphResult<Option<Isometry3d>> {
        if self.paused {
            return Ok(None);
        }
        let result = self.try_advance(delta_time * self.speed, apply_root_motion);
        self.error = result.as_ref().err().cloned();
        result
    }

    fn try_advance(
        &mut self,
        delta_time: f32,
        apply_root_motion: bool,
    ) -> GraphResult<Option<Isometry3d>> {
        self.elapsed += delta_time;
        for target in &self.time_inputs {
            self.graph.set_data(*target, self.elapsed)?;
        }
        for target in &self.delta_time_inputs {
            self.graph.set_data(*target, delta_time)?;
        }
        self.graph.evaluate()?;

        let Some(output) = self.output else {
            return Ok(None);
        };
        let stream = match self.graph.output(output) {
            Some(data) => data.as_stream()?,
            None if self.graph.contains(output.node) => {
                return Err(GraphError::UnknownPin(output.pin.to_string()));
            }
            None => return Err(GraphError::UnknownNode),
        };
        match &mut self.pose {
            Some(pose) if pose.shares_rig(stream) => pose.clone_from(stream),
            pose => *pose = Some(stream.clone()),
        }

        match (&mut self.pose, apply_root_motion) {
            (Some(pose), true) => Ok(Some(self.accumulator.accumulate(pose))),
            _ => Ok(None),
        }
    }
}

fn expect_spec(found: DataSpec, expected: DataSpec) -> GraphResult<()> {
    if found == expected {
        Ok(())
    } else {
        Err(GraphError::MismatchedDataType(
            format!("{expected:?}"),
            format!("{found:?}"),
        ))
    }
}
