mod asset_error;
mod blend_tree_error;
mod config_error;
mod graph_error;
mod invalid_motion;

pub use asset_error::*;
pub use blend_tree_error::*;
pub use config_error::*;
pub use graph_error::*;
pub use invalid_motion::*;
