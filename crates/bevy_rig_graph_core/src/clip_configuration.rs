use bevy::reflect::{Reflect, std_traits::ReflectDefault};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{errors::ConfigError, id::ChannelId};

#[derive(Reflect, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[reflect(Default)]
pub struct ClipConfigurationMask(u32);

bitflags::bitflags! {
    impl ClipConfigurationMask: u32 {
        /// The time input is normalized: `1.0` is the end of the clip.
        const NORMALIZED_TIME           = 0b0000_0001;
        /// Time wraps around the clip duration.
        const LOOP_TIME                 = 0b0000_0010;
        /// The pose difference between clip end and start is removed over each cycle.
        const LOOP_VALUES               = 0b0000_0100;
        /// Root motion keeps advancing across cycles.
        const CYCLE_ROOT_MOTION         = 0b0000_1000;
        /// The root channel holds the motion since the previous evaluation.
        const DELTA_ROOT_MOTION         = 0b0001_0000;
        /// The root channel of the clip is a velocity, integrated over the time step.
        const ROOT_MOTION_FROM_VELOCITY = 0b0010_0000;
    }
}

impl ClipConfigurationMask {
    /// Whether the pipeline wraps time and needs a time loop stage.
    pub fn needs_loop(self) -> bool {
        self.intersects(Self::LOOP_TIME | Self::LOOP_VALUES | Self::CYCLE_ROOT_MOTION)
    }
}

impl Serialize for ClipConfigurationMask {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        bitflags::serde::serialize(self, serializer)
    }
}

impl<'de> Deserialize<'de> for ClipConfigurationMask {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        bitflags::serde::deserialize(deserializer)
    }
}

/// How a clip is sampled by a configurable clip node.
///
/// The configuration alone decides the shape of the node's internal pipeline: two equal
/// configurations always produce the same stages.
#[derive(Reflect, Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[reflect(Default)]
pub struct ClipConfiguration {
    #[serde(default)]
    pub mask: ClipConfigurationMask,
    /// Bone whose ground motion is moved to the root channel. `ChannelId::NONE` disables
    /// in-place extraction.
    #[serde(default)]
    pub motion_id: ChannelId,
}

impl ClipConfiguration {
    pub fn new(mask: ClipConfigurationMask) -> Self {
        Self {
            mask,
            motion_id: ChannelId::NONE,
        }
    }

    pub fn with_motion(mut self, motion_id: impl Into<ChannelId>) -> Self {
        self.motion_id = motion_id.into();
        self
    }

    pub fn contains(&self, flags: ClipConfigurationMask) -> bool {
        self.mask.contains(flags)
    }

    pub fn in_place(&self) -> bool {
        self.motion_id.is_some()
    }

    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::de::from_str(text)?)
    }

    pub fn to_ron(&self) -> Result<String, ConfigError> {
        Ok(ron::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_flag_names_and_motion_path() {
        let config = ClipConfiguration::from_ron(
            "(mask: \"NORMALIZED_TIME | LOOP_TIME\", motion_id: \"Root/Hips\")",
        )
        .unwrap();
        assert_eq!(
            config.mask,
            ClipConfigurationMask::NORMALIZED_TIME | ClipConfigurationMask::LOOP_TIME
        );
        assert_eq!(config.motion_id, ChannelId::from_path("Root/Hips"));
        assert!(config.in_place());

        let text = config.to_ron().unwrap();
        assert_eq!(ClipConfiguration::from_ron(&text).unwrap(), config);
    }

    #[test]
    fn defaults_to_plain_sampling() {
        let config = ClipConfiguration::from_ron("()").unwrap();
        assert_eq!(config, ClipConfiguration::default());
        assert!(!config.mask.needs_loop());
        assert!(!config.in_place());
    }

    #[test]
    fn derived_requirements() {
        assert!(ClipConfigurationMask::CYCLE_ROOT_MOTION.needs_loop());
        assert!(ClipConfigurationMask::LOOP_VALUES.needs_loop());
        assert!(!ClipConfigurationMask::DELTA_ROOT_MOTION.needs_loop());
    }
}
