use bevy::{
    platform::collections::HashMap,
    reflect::{Reflect, std_traits::ReflectDefault},
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{errors::ConfigError, id::ChannelId};

/// Per-channel weight overrides for partial blending.
///
/// All channel kinds of a bone share the bone id. A channel that is not listed uses the table's
/// default weight when one is set, and the blend's own weight otherwise.
#[derive(Reflect, Clone, Debug, Default, PartialEq)]
#[reflect(Default)]
pub struct ChannelWeightTable {
    default_weight: Option<f32>,
    #[reflect(ignore)]
    weights: IndexMap<ChannelId, f32>,
    paths: HashMap<ChannelId, String>,
}

impl ChannelWeightTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default(default_weight: f32) -> Self {
        Self {
            default_weight: Some(default_weight),
            ..Default::default()
        }
    }

    pub fn default_weight(&self) -> Option<f32> {
        self.default_weight
    }

    pub fn set_default_weight(&mut self, default_weight: Option<f32>) {
        self.default_weight = default_weight;
    }

    /// Sets the weight of a channel given by its path.
    pub fn set_path_weight(&mut self, path: &str, weight: f32) {
        let id = ChannelId::from_path(path);
        self.paths.insert(id, path.to_string());
        self.weights.insert(id, weight);
    }

    pub fn set_weight(&mut self, id: ChannelId, weight: f32) {
        self.weights.insert(id, weight);
    }

    pub fn remove(&mut self, id: ChannelId) -> Option<f32> {
        self.paths.remove(&id);
        self.weights.shift_remove(&id)
    }

    pub fn clear(&mut self) {
        self.weights.clear();
        self.paths.clear();
    }

    pub fn overrides(&self) -> impl Iterator<Item = (ChannelId, f32)> + '_ {
        self.weights.iter().map(|(id, weight)| (*id, *weight))
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Weight of channel `id`: its override, else the table default, else `fallback`.
    pub fn weight(&self, id: ChannelId, fallback: f32) -> f32 {
        self.weights
            .get(&id)
            .copied()
            .or(self.default_weight)
            .unwrap_or(fallback)
    }

    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::de::from_str(text)?)
    }
}

/// Resolves the weight of a channel when a table may or may not be present.
pub fn channel_weight(table: Option<&ChannelWeightTable>, id: ChannelId, fallback: f32) -> f32 {
    match table {
        Some(table) => table.weight(id, fallback),
        None => fallback,
    }
}

#[derive(Serialize, Deserialize)]
pub struct ChannelWeightTableSerial {
    #[serde(default)]
    pub default_weight: Option<f32>,
    pub weights: IndexMap<String, f32>,
}

impl ChannelWeightTableSerial {
    pub fn from_value(value: &ChannelWeightTable) -> Self {
        Self {
            default_weight: value.default_weight,
            weights: value
                .weights
                .iter()
                .map(|(id, weight)| {
                    let path = value
                        .paths
                        .get(id)
                        .cloned()
                        .unwrap_or_else(|| format!("#{}", id.raw()));
                    (path, *weight)
                })
                .collect(),
        }
    }

    pub fn to_value(&self) -> ChannelWeightTable {
        let mut table = ChannelWeightTable {
            default_weight: self.default_weight,
            ..Default::default()
        };
        for (path, weight) in &self.weights {
            match path
                .strip_prefix('#')
                .and_then(|raw| raw.parse::<u32>().ok())
            {
                Some(raw) => table.set_weight(ChannelId::from_raw(raw), *weight),
                None => table.set_path_weight(path, *weight),
            }
        }
        table
    }
}

impl Serialize for ChannelWeightTable {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        ChannelWeightTableSerial::from_value(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ChannelWeightTable {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Ok(ChannelWeightTableSerial::deserialize(deserializer)?.to_value())
    }
}
