//! Surface reconstruction for vision-based tactile sensors.
//!
//! A color frame goes through an external normal predictor, then normal
//! preprocessing, gradient computation, Poisson integration, unprojection
//! and outlier removal. [`ReconstructionPipeline`] runs the whole chain.

pub mod pipeline;
pub mod predictor;

pub use pipeline::*;
pub use predictor::*;

pub use touch3d_core::{Error, Result};
