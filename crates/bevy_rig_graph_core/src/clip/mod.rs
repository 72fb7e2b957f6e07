mod instance;

pub use instance::*;

use bevy::math::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::{
    errors::{ClipError, ConfigError},
    id::ChannelId,
    rig::ChannelKind,
};

/// Uniformly sampled keys of one channel. Key `i` is the value at `i / sample_rate` seconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChannelCurve<T> {
    pub id: ChannelId,
    pub keys: Vec<T>,
}

impl<T: CurveValue> ChannelCurve<T> {
    fn sample(&self, frame: FramePosition) -> T {
        let a = self.keys[frame.index];
        let b = self.keys[frame.next];
        T::interpolate(a, b, frame.fraction)
    }
}

/// Values that can be stored in a clip curve.
pub trait CurveValue: Copy {
    fn interpolate(a: Self, b: Self, f: f32) -> Self;
}

impl CurveValue for Vec3 {
    fn interpolate(a: Self, b: Self, f: f32) -> Self {
        a.lerp(b, f)
    }
}

impl CurveValue for Quat {
    fn interpolate(a: Self, b: Self, f: f32) -> Self {
        a.slerp(b, f)
    }
}

impl CurveValue for f32 {
    fn interpolate(a: Self, b: Self, f: f32) -> Self {
        a + (b - a) * f
    }
}

/// Integer channels step: the earlier key holds until the next key is reached.
impl CurveValue for i32 {
    fn interpolate(a: Self, _b: Self, _f: f32) -> Self {
        a
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct FramePosition {
    pub index: usize,
    pub next: usize,
    pub fraction: f32,
}

/// Dense, uniformly sampled animation clip.
///
/// Every curve carries exactly [`frame_count`](Self::frame_count) keys; [`ClipBuilder`]
/// enforces this so sampling never has to check.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ClipSerial")]
pub struct Clip {
    duration: f32,
    sample_rate: f32,
    translations: Vec<ChannelCurve<Vec3>>,
    rotations: Vec<ChannelCurve<Quat>>,
    scales: Vec<ChannelCurve<Vec3>>,
    floats: Vec<ChannelCurve<f32>>,
    ints: Vec<ChannelCurve<i32>>,
}

#[derive(Deserialize)]
struct ClipSerial {
    duration: f32,
    sample_rate: f32,
    #[serde(default)]
    translations: Vec<ChannelCurve<Vec3>>,
    #[serde(default)]
    rotations: Vec<ChannelCurve<Quat>>,
    #[serde(default)]
    scales: Vec<ChannelCurve<Vec3>>,
    #[serde(default)]
    floats: Vec<ChannelCurve<f32>>,
    #[serde(default)]
    ints: Vec<ChannelCurve<i32>>,
}

impl TryFrom<ClipSerial> for Clip {
    type Error = ClipError;

    fn try_from(value: ClipSerial) -> Result<Self, Self::Error> {
        ClipBuilder {
            duration: value.duration,
            sample_rate: value.sample_rate,
            translations: value.translations,
            rotations: value.rotations,
            scales: value.scales,
            floats: value.floats,
            ints: value.ints,
        }
        .build()
    }
}

/// Number of keys a clip of this duration and rate carries.
pub fn frame_count(duration: f32, sample_rate: f32) -> usize {
    (duration * sample_rate).ceil() as usize + 1
}

impl Clip {
    pub fn builder(duration: f32, sample_rate: f32) -> ClipBuilder {
        ClipBuilder::new(duration, sample_rate)
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn frame_count(&self) -> usize {
        frame_count(self.duration, self.sample_rate)
    }

    /// True when the clip animates no channel at all.
    pub fn is_empty(&self) -> bool {
        self.translations.is_empty()
            && self.rotations.is_empty()
            && self.scales.is_empty()
            && self.floats.is_empty()
            && self.ints.is_empty()
    }

    pub fn translations(&self) -> &[ChannelCurve<Vec3>] {
        &self.translations
    }

    pub fn rotations(&self) -> &[ChannelCurve<Quat>] {
        &self.rotations
    }

    pub fn scales(&self) -> &[ChannelCurve<Vec3>] {
        &self.scales
    }

    pub fn floats(&self) -> &[ChannelCurve<f32>] {
        &self.floats
    }

    pub fn ints(&self) -> &[ChannelCurve<i32>] {
        &self.ints
    }

    pub fn has_curve(&self, kind: ChannelKind, id: ChannelId) -> bool {
        match kind {
            ChannelKind::Translation => self.translations.iter().any(|curve| curve.id == id),
            ChannelKind::Rotation => self.rotations.iter().any(|curve| curve.id == id),
            ChannelKind::Scale => self.scales.iter().any(|curve| curve.id == id),
            ChannelKind::Float => self.floats.iter().any(|curve| curve.id == id),
            ChannelKind::Int => self.ints.iter().any(|curve| curve.id == id),
        }
    }

    /// Samples the translation curve of `id` at `time`, if the clip animates it.
    pub fn sample_translation(&self, id: ChannelId, time: f32) -> Option<Vec3> {
        let frame = self.frame_position(time);
        self.translations
            .iter()
            .find(|curve| curve.id == id)
            .map(|curve| curve.sample(frame))
    }

    /// Key pair and blend factor for `time`, clamped to `[0, duration]`.
    pub(crate) fn frame_position(&self, time: f32) -> FramePosition {
        let last = self.frame_count() - 1;
        let time = if time.is_nan() {
            0.
        } else {
            time.clamp(0., self.duration)
        };
        let position = time * self.sample_rate;
        let index = (position.floor() as usize).min(last);
        FramePosition {
            index,
            next: (index + 1).min(last),
            fraction: if index == last {
                0.
            } else {
                position - index as f32
            },
        }
    }

    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::de::from_str(text)?)
    }

    pub fn to_ron(&self) -> Result<String, ConfigError> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::default(),
        )?)
    }
}

pub struct ClipBuilder {
    duration: f32,
    sample_rate: f32,
    translations: Vec<ChannelCurve<Vec3>>,
    rotations: Vec<ChannelCurve<Quat>>,
    scales: Vec<ChannelCurve<Vec3>>,
    floats: Vec<ChannelCurve<f32>>,
    ints: Vec<ChannelCurve<i32>>,
}

impl ClipBuilder {
    pub fn new(duration: f32, sample_rate: f32) -> Self {
        Self {
            duration,
            sample_rate,
            translations: Vec::new(),
            rotations: Vec::new(),
            scales: Vec::new(),
            floats: Vec::new(),
            ints: Vec::new(),
        }
    }

    pub fn frame_count(&self) -> usize {
        frame_count(self.duration, self.sample_rate)
    }

    pub fn translation(mut self, id: impl Into<ChannelId>, keys: Vec<Vec3>) -> Self {
        self.translations.push(ChannelCurve {
            id: id.into(),
            keys,
        });
        self
    }

    pub fn rotation(mut self, id: impl Into<ChannelId>, keys: Vec<Quat>) -> Self {
        self.rotations.push(ChannelCurve {
            id: id.into(),
            keys,
        });
        self
    }

    pub fn scale(mut self, id: impl Into<ChannelId>, keys: Vec<Vec3>) -> Self {
        self.scales.push(ChannelCurve {
            id: id.into(),
            keys,
        });
        self
    }

    pub fn float(mut self, id: impl Into<ChannelId>, keys: Vec<f32>) -> Self {
        self.floats.push(ChannelCurve {
            id: id.into(),
            keys,
        });
        self
    }

    pub fn int(mut self, id: impl Into<ChannelId>, keys: Vec<i32>) -> Self {
        self.ints.push(ChannelCurve {
            id: id.into(),
            keys,
        });
        self
    }

    pub fn build(self) -> Result<Clip, ClipError> {
        if !self.duration.is_finite() || self.duration < 0. {
            return Err(ClipError::InvalidDuration(self.duration));
        }
        if !self.sample_rate.is_finite() || self.sample_rate <= 0. {
            return Err(ClipError::InvalidSampleRate(self.sample_rate));
        }

        let expected = self.frame_count();
        validate_curves(&self.translations, ChannelKind::Translation, expected)?;
        validate_curves(&self.rotations, ChannelKind::Rotation, expected)?;
        validate_curves(&self.scales, ChannelKind::Scale, expected)?;
        validate_curves(&self.floats, ChannelKind::Float, expected)?;
        validate_curves(&self.ints, ChannelKind::Int, expected)?;

        Ok(Clip {
            duration: self.duration,
            sample_rate: self.sample_rate,
            translations: self.translations,
            rotations: self.rotations,
            scales: self.scales,
            floats: self.floats,
            ints: self.ints,
        })
    }
}

fn validate_curves<T>(
    curves: &[ChannelCurve<T>],
    kind: ChannelKind,
    expected: usize,
) -> Result<(), ClipError> {
    for (index, curve) in curves.iter().enumerate() {
        if curve.keys.len() != expected {
            return Err(ClipError::KeyCountMismatch {
                kind,
                id: curve.id,
                expected,
                found: curve.keys.len(),
            });
        }
        if curves[..index].iter().any(|other| other.id == curve.id) {
            return Err(ClipError::DuplicateCurve { kind, id: curve.id });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip() -> Clip {
        Clip::builder(1., 2.)
            .translation("Hips", vec![Vec3::ZERO, Vec3::X, Vec3::new(2., 0., 0.)])
            .int("Prop", vec![0, 1, 2])
            .build()
            .unwrap()
    }

    #[test]
    fn frame_count_rounds_up() {
        assert_eq!(frame_count(1., 30.), 31);
        assert_eq!(frame_count(0.5, 3.), 3);
        assert_eq!(frame_count(0., 30.), 1);
    }

    #[test]
    fn sampling_interpolates_and_clamps() {
        let clip = clip();
        let hips = ChannelId::from_path("Hips");
        assert_eq!(clip.sample_translation(hips, 0.25), Some(Vec3::new(0.5, 0., 0.)));
        assert_eq!(clip.sample_translation(hips, -3.), Some(Vec3::ZERO));
        assert_eq!(clip.sample_translation(hips, 7.), Some(Vec3::new(2., 0., 0.)));
        assert_eq!(clip.sample_translation(ChannelId::from_path("Spine"), 0.), None);
    }

    #[test]
    fn int_curves_step() {
        let clip = clip();
        let frame = clip.frame_position(0.49);
        assert_eq!(clip.ints()[0].sample(frame), 0);
    }

    #[test]
    fn builder_rejects_bad_curves() {
        let short = Clip::builder(1., 2.).float("Blink", vec![0., 1.]).build();
        assert!(matches!(
            short,
            Err(ClipError::KeyCountMismatch {
                expected: 3,
                found: 2,
                ..
            })
        ));

        let duplicate = Clip::builder(0., 1.)
            .float("Blink", vec![0.])
            .float("Blink", vec![1.])
            .build();
        assert!(matches!(duplicate, Err(ClipError::DuplicateCurve { .. })));

        assert!(matches!(
            Clip::builder(1., 0.).build(),
            Err(ClipError::InvalidSampleRate(_))
        ));
    }

    #[test]
    fn ron_text_is_validated() {
        let text = clip().to_ron().unwrap();
        assert_eq!(Clip::from_ron(&text).unwrap(), clip());

        let invalid = "(duration: 1.0, sample_rate: 2.0, floats: [(id: 7, keys: [0.0])])";
        assert!(Clip::from_ron(invalid).is_err());
    }
}
