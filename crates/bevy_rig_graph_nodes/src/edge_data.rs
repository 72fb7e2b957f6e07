use bevy::{
    math::Vec2,
    reflect::{Reflect, std_traits::ReflectDefault},
};
use bevy_rig_graph_core::{
    channel_weights::ChannelWeightTable,
    errors::{GraphError, GraphResult},
    stream::AnimationStream,
};
use serde::{Deserialize, Serialize};

#[derive(Reflect, Default, Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[reflect(Default)]
pub enum DataSpec {
    #[default]
    F32,
    Vec2,
    Stream,
    WeightTable,
}

/// Owned pin value, used for constant inputs.
#[derive(Clone, Debug)]
pub enum DataValue {
    F32(f32),
    Vec2(Vec2),
    Stream(AnimationStream),
    WeightTable(ChannelWeightTable),
}

/// Borrowed pin value, as passed along connections during evaluation.
#[derive(Clone, Copy, Debug)]
pub enum DataRef<'a> {
    F32(f32),
    Vec2(Vec2),
    Stream(&'a AnimationStream),
    WeightTable(&'a ChannelWeightTable),
}

impl DataValue {
    pub fn as_data_ref(&self) -> DataRef<'_> {
        match self {
            DataValue::F32(value) => DataRef::F32(*value),
            DataValue::Vec2(value) => DataRef::Vec2(*value),
            DataValue::Stream(stream) => DataRef::Stream(stream),
            DataValue::WeightTable(table) => DataRef::WeightTable(table),
        }
    }

    pub fn spec(&self) -> DataSpec {
        self.as_data_ref().spec()
    }
}

impl<'a> DataRef<'a> {
    pub fn spec(&self) -> DataSpec {
        match self {
            DataRef::F32(_) => DataSpec::F32,
            DataRef::Vec2(_) => DataSpec::Vec2,
            DataRef::Stream(_) => DataSpec::Stream,
            DataRef::WeightTable(_) => DataSpec::WeightTable,
        }
    }

    pub fn as_f32(&self) -> GraphResult<f32> {
        match self {
            DataRef::F32(value) => Ok(*value),
            other => Err(mismatch(DataSpec::F32, other.spec())),
        }
    }

    pub fn as_vec2(&self) -> GraphResult<Vec2> {
        match self {
            DataRef::Vec2(value) => Ok(*value),
            other => Err(mismatch(DataSpec::Vec2, other.spec())),
        }
    }

    pub fn as_stream(&self) -> GraphResult<&'a AnimationStream> {
        match self {
            DataRef::Stream(stream) => Ok(*stream),
            other => Err(mismatch(DataSpec::Stream, other.spec())),
        }
    }

    pub fn as_weight_table(&self) -> GraphResult<&'a ChannelWeightTable> {
        match self {
            DataRef::WeightTable(table) => Ok(*table),
            other => Err(mismatch(DataSpec::WeightTable, other.spec())),
        }
    }
}

fn mismatch(expected: DataSpec, found: DataSpec) -> GraphError {
    GraphError::MismatchedDataType(format!("{expected:?}"), format!("{found:?}"))
}

impl From<f32> for DataRef<'_> {
    fn from(value: f32) -> Self {
        DataRef::F32(value)
    }
}

impl From<Vec2> for DataRef<'_> {
    fn from(value: Vec2) -> Self {
        DataRef::Vec2(value)
    }
}

impl<'a> From<&'a AnimationStream> for DataRef<'a> {
    fn from(value: &'a AnimationStream) -> Self {
        DataRef::Stream(value)
    }
}

impl<'a> From<&'a ChannelWeightTable> for DataRef<'a> {
    fn from(value: &'a ChannelWeightTable) -> Self {
        DataRef::WeightTable(value)
    }
}

impl From<f32> for DataValue {
    fn from(value: f32) -> Self {
        DataValue::F32(value)
    }
}

impl From<Vec2> for DataValue {
    fn from(value: Vec2) -> Self {
        DataValue::Vec2(value)
    }
}

impl From<AnimationStream> for DataValue {
    fn from(value: AnimationStream) -> Self {
        DataValue::Stream(value)
    }
}

impl From<ChannelWeightTable> for DataValue {
    fn from(value: ChannelWeightTable) -> Self {
        DataValue::WeightTable(value)
    }
}
