//! Image-space processing of predicted normal maps.
//!
//! - [`normals`]: remap raw network output to unit normals, flatten background
//! - [`gradient`]: unit normals to a metric depth-gradient field

pub mod gradient;
pub mod normals;

pub use gradient::*;
pub use normals::*;

pub use touch3d_core::{Error, Result};
