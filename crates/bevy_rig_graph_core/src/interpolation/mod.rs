pub mod additive;
pub mod difference;
pub mod linear;
pub mod weighted;

pub use additive::{AdditiveInterpolator, additive_blend_quat};
pub use difference::difference_in_place;
pub use linear::{InterpolateLinear, blend_linear};
pub use weighted::WeightedSum;
