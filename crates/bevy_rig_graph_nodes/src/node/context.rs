use bevy_rig_graph_core::errors::GraphResult;

use super::PinId;
use crate::edge_data::{DataRef, DataSpec};

/// Where a node being evaluated reads its inputs from.
pub trait InputResolver {
    fn resolve(&self, pin: PinId) -> Option<DataRef<'_>>;
}

/// Inputs given as a list of pins and values.
#[derive(Default)]
pub struct InputList<'a> {
    inputs: Vec<(PinId, DataRef<'a>)>,
}

impl<'a> InputList<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, pin: impl Into<PinId>, value: impl Into<DataRef<'a>>) -> Self {
        self.inputs.push((pin.into(), value.into()));
        self
    }
}

impl InputResolver for InputList<'_> {
    fn resolve(&self, pin: PinId) -> Option<DataRef<'_>> {
        self.inputs
            .iter()
            .find(|(candidate, _)| *candidate == pin)
            .map(|(_, value)| *value)
    }
}

/// Read access to the inputs of the node being evaluated.
#[derive(Clone, Copy)]
pub struct NodeContext<'a> {
    inputs: &'a dyn InputResolver,
}

impl<'a> NodeContext<'a> {
    pub fn new(inputs: &'a dyn InputResolver) -> Self {
        Self { inputs }
    }

    /// The connected or constant value of `pin`, if any.
    pub fn data_back_opt(&self, pin: impl Into<PinId>) -> Option<DataRef<'a>> {
        self.inputs.resolve(pin.into())
    }

    /// `f32` input that falls back to `default` when it is neither connected nor set.
    pub fn f32_back_or(&self, pin: impl Into<PinId>, default: f32) -> GraphResult<f32> {
        match self.data_back_opt(pin) {
            Some(value) => value.as_f32(),
            None => Ok(default),
        }
    }
}

/// Pins a node exposes, as reported by [`RigNode::spec`](super::RigNode::spec).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeSpec {
    inputs: Vec<(PinId, DataSpec)>,
    outputs: Vec<(PinId, DataSpec)>,
}

impl NodeSpec {
    pub fn add_input_data(&mut self, pin: impl Into<PinId>, spec: DataSpec) -> &mut Self {
        self.inputs.push((pin.into(), spec));
        self
    }

    pub fn add_output_data(&mut self, pin: impl Into<PinId>, spec: DataSpec) -> &mut Self {
        self.outputs.push((pin.into(), spec));
        self
    }

    pub fn inputs(&self) -> &[(PinId, DataSpec)] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[(PinId, DataSpec)] {
        &self.outputs
    }

    pub fn input(&self, pin: PinId) -> Option<DataSpec> {
        find(&self.inputs, pin)
    }

    pub fn output(&self, pin: PinId) -> Option<DataSpec> {
        find(&self.outputs, pin)
    }
}

fn find(pins: &[(PinId, DataSpec)], pin: PinId) -> Option<DataSpec> {
    pins.iter()
        .find(|(candidate, _)| *candidate == pin)
        .map(|(_, spec)| *spec)
}
