//! Point cloud operations on reconstructed surfaces.
//!
//! - [`filtering`]: statistical outlier removal over k-nearest neighbours

pub mod filtering;

pub use filtering::*;
pub use touch3d_core::PointCloud;
