//! Blend trees: motion lists blended by a 1D or 2D parameter.

mod definition;
mod node;
mod solver;

pub use definition::*;
pub use node::{BlendTree1DNode, BlendTree2DNode};
pub use solver::{
    blended_duration, compute_blend_tree_1d_weights,
    compute_blend_tree_2d_simple_directional_weights,
};
