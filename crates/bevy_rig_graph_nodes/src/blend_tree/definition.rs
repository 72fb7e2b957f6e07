use std::sync::Arc;

use bevy::math::Vec2;
use bevy_rig_graph_core::{
    clip::Clip,
    errors::{BlendTreeError, ConfigError, InvalidMotion},
};
use serde::{Deserialize, Serialize};

/// A motion of a 1D blend tree.
#[derive(Clone, Debug)]
pub struct BlendTreeMotion1D {
    pub clip: Option<Arc<Clip>>,
    pub threshold: f32,
    /// Playback speed scale. A motion with speed 2 takes half its clip duration to complete.
    pub speed: f32,
}

/// Motions blended by a scalar parameter, ordered by threshold.
#[derive(Clone, Debug)]
pub struct BlendTree1D {
    motions: Vec<BlendTreeMotion1D>,
    thresholds: Vec<f32>,
}

impl BlendTree1D {
    /// Validates the motion list. Thresholds must be finite and non-decreasing.
    pub fn new(motions: Vec<BlendTreeMotion1D>) -> Result<Self, BlendTreeError> {
        if motions.is_empty() {
            return Err(BlendTreeError::Empty);
        }
        for (index, motion) in motions.iter().enumerate() {
            if !motion.threshold.is_finite() {
                return Err(BlendTreeError::NonFiniteThreshold(index));
            }
            check_motion(index, motion.clip.as_ref(), motion.speed)?;
        }
        for (index, pair) in motions.windows(2).enumerate() {
            if pair[1].threshold < pair[0].threshold {
                return Err(BlendTreeError::ThresholdOrder {
                    index: index + 1,
                    previous: pair[0].threshold,
                    current: pair[1].threshold,
                });
            }
        }

        let thresholds = motions.iter().map(|motion| motion.threshold).collect();
        Ok(Self {
            motions,
            thresholds,
        })
    }

    pub fn motions(&self) -> &[BlendTreeMotion1D] {
        &self.motions
    }

    pub fn thresholds(&self) -> &[f32] {
        &self.thresholds
    }

    pub fn len(&self) -> usize {
        self.motions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.motions.is_empty()
    }
}

/// A motion of a 2D simple directional blend tree.
#[derive(Clone, Debug)]
pub struct BlendTreeMotion2D {
    pub clip: Option<Arc<Clip>>,
    /// Direction and magnitude the motion stands for. A motion at the origin is the center
    /// motion.
    pub position: Vec2,
    pub speed: f32,
}

/// Motions blended by a 2D parameter, one motion per direction plus an optional center motion.
#[derive(Clone, Debug)]
pub struct BlendTree2D {
    motions: Vec<BlendTreeMotion2D>,
    positions: Vec<Vec2>,
}

impl BlendTree2D {
    /// Validates the motion list. Positions must be finite and pairwise distinct, so there is
    /// at most one center motion.
    pub fn new(motions: Vec<BlendTreeMotion2D>) -> Result<Self, BlendTreeError> {
        if motions.is_empty() {
            return Err(BlendTreeError::Empty);
        }
        for (index, motion) in motions.iter().enumerate() {
            if !motion.position.is_finite() {
                return Err(BlendTreeError::NonFinitePosition(index));
            }
            check_motion(index, motion.clip.as_ref(), motion.speed)?;
            if let Some(first) = motions[..index]
                .iter()
                .position(|other| other.position == motion.position)
            {
                return Err(BlendTreeError::DuplicatePosition {
                    first,
                    second: index,
                });
            }
        }

        let positions = motions.iter().map(|motion| motion.position).collect();
        Ok(Self { motions, positions })
    }

    pub fn motions(&self) -> &[BlendTreeMotion2D] {
        &self.motions
    }

    pub fn positions(&self) -> &[Vec2] {
        &self.positions
    }

    pub fn len(&self) -> usize {
        self.motions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.motions.is_empty()
    }
}

fn check_motion(index: usize, clip: Option<&Arc<Clip>>, speed: f32) -> Result<(), BlendTreeError> {
    if !speed.is_finite() || speed == 0. {
        return Err(BlendTreeError::InvalidSpeed { index, speed });
    }
    match clip {
        None => Err(BlendTreeError::InvalidMotion {
            index,
            reason: InvalidMotion::ClipMissing,
        }),
        Some(clip) if clip.is_empty() => Err(BlendTreeError::InvalidMotion {
            index,
            reason: InvalidMotion::EmptyClip,
        }),
        Some(_) => Ok(()),
    }
}

fn default_speed() -> f32 {
    1.
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct BlendTreeMotion1DSerial {
    pub clip: String,
    pub threshold: f32,
    #[serde(default = "default_speed")]
    pub speed: f32,
}

/// Text form of a [`BlendTree1D`], naming its clips.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct BlendTree1DSerial {
    pub motions: Vec<BlendTreeMotion1DSerial>,
}

impl BlendTree1DSerial {
    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::de::from_str(text)?)
    }

    /// Builds the blend tree, looking clips up by name.
    pub fn resolve(
        &self,
        mut lookup: impl FnMut(&str) -> Option<Arc<Clip>>,
    ) -> Result<BlendTree1D, ConfigError> {
        let motions = self
            .motions
            .iter()
            .map(|motion| {
                Ok(BlendTreeMotion1D {
                    clip: Some(
                        lookup(&motion.clip)
                            .ok_or_else(|| ConfigError::UnknownClip(motion.clip.clone()))?,
                    ),
                    threshold: motion.threshold,
                    speed: motion.speed,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        Ok(BlendTree1D::new(motions)?)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct BlendTreeMotion2DSerial {
    pub clip: String,
    pub position: Vec2,
    #[serde(default = "default_speed")]
    pub speed: f32,
}

/// Text form of a [`BlendTree2D`], naming its clips.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct BlendTree2DSerial {
    pub motions: Vec<BlendTreeMotion2DSerial>,
}

impl BlendTree2DSerial {
    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::de::from_str(text)?)
    }

    pub fn resolve(
        &self,
        mut lookup: impl FnMut(&str) -> Option<Arc<Clip>>,
    ) -> Result<BlendTree2D, ConfigError> {
        let motions = self
            .motions
            .iter()
            .map(|motion| {
                Ok(BlendTreeMotion2D {
                    clip: Some(
                        lookup(&motion.clip)
                            .ok_or_else(|| ConfigError::UnknownClip(motion.clip.clone()))?,
                    ),
                    position: motion.position,
                    speed: motion.speed,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        Ok(BlendTree2D::new(motions)?)
    }
}
