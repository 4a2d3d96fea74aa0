//! Core types shared by the touch3d crates.
//!
//! - [`maps`]: normal maps, background masks, gradient fields, depth maps
//! - [`point_cloud`]: point clouds with optional attributes
//! - [`geometry`]: camera matrices and clip planes
//! - [`config`]: per-sensor configuration
//! - [`runtime`]: global thread pool setup

pub mod config;
pub mod error;
pub mod geometry;
pub mod maps;
pub mod point_cloud;
pub mod runtime;
pub mod tensor;

pub use config::*;
pub use error::{Error, Result};
pub use geometry::*;
pub use maps::*;
pub use point_cloud::*;
pub use runtime::init_global_thread_pool;
pub use tensor::*;

/// Color frame as delivered by the sensor.
pub type ColorImage = image::RgbImage;
