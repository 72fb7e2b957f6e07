use bevy::math::{Isometry3d, Quat, Vec3, Vec3A};

/// Rigid transform helpers used by root motion.
///
/// Composition follows `Isometry3d`'s `Mul`: `a * b` applies `b` first, then `a`.
pub trait RigidTransformExt: Sized + Copy {
    fn from_parts(translation: Vec3, rotation: Quat) -> Self;

    fn translation3(&self) -> Vec3;

    /// `self` composed with itself `exponent` times, left to right. `pow(0)` is the identity.
    fn pow(&self, exponent: u32) -> Self;

    /// `pow` for signed exponents: negative exponents repeat the inverse transform.
    fn powi(&self, exponent: i32) -> Self;

    /// Projection onto the ground plane: translation with `y = 0` and the twist of the
    /// rotation about the up axis.
    fn ground_projection(&self) -> Self;

    fn abs_diff_eq(&self, other: &Self, max_abs_diff: f32) -> bool;
}

impl RigidTransformExt for Isometry3d {
    fn from_parts(translation: Vec3, rotation: Quat) -> Self {
        Isometry3d::new(translation, rotation)
    }

    fn translation3(&self) -> Vec3 {
        Vec3::from(self.translation)
    }

    fn pow(&self, exponent: u32) -> Self {
        // Powers of one transform commute, so squaring keeps the composition order
        let mut result = Isometry3d::IDENTITY;
        let mut base = *self;
        let mut exponent = exponent;
        while exponent > 0 {
            if exponent & 1 == 1 {
                result = result * base;
            }
            exponent >>= 1;
            if exponent > 0 {
                base = base * base;
            }
        }
        result
    }

    fn powi(&self, exponent: i32) -> Self {
        if exponent >= 0 {
            self.pow(exponent.unsigned_abs())
        } else {
            self.inverse().pow(exponent.unsigned_abs())
        }
    }

    fn ground_projection(&self) -> Self {
        let translation = Vec3A::new(self.translation.x, 0., self.translation.z);
        Isometry3d {
            rotation: twist_about_y(self.rotation),
            translation,
        }
    }

    fn abs_diff_eq(&self, other: &Self, max_abs_diff: f32) -> bool {
        self.translation
            .abs_diff_eq(other.translation, max_abs_diff)
            && self.rotation.abs_diff_eq(other.rotation, max_abs_diff)
    }
}

/// Twist component of `rotation` about the +Y axis (swing-twist decomposition).
pub fn twist_about_y(rotation: Quat) -> Quat {
    let twist = Quat::from_xyzw(0., rotation.y, 0., rotation.w);
    let length_squared = twist.length_squared();
    if length_squared <= f32::EPSILON {
        // Rotation is a half turn about an axis on the ground plane
        Quat::IDENTITY
    } else {
        twist * length_squared.sqrt().recip()
    }
}
