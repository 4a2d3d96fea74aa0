//! touch3d: 3D surface reconstruction for vision-based tactile sensors.
//!
//! Re-exports the per-stage crates under one roof.

pub use touch3d_calib3d as calib3d;
pub use touch3d_core as core;
pub use touch3d_imgproc as imgproc;
pub use touch3d_point_cloud as point_cloud;
pub use touch3d_scientific as scientific;
pub use touch3d_surface as surface;

pub use touch3d_core::{Error, Result, SensorConfig};
pub use touch3d_surface::{
    NormalPredictor, ReconstructionPipeline, ReconstructionResult, ReconstructionStage,
};

/// Initialize a single global Rayon thread pool for all CPU-parallel routines.
///
/// Call this once at application startup. Repeated calls are idempotent and
/// return the first initialization result.
///
/// Priority order:
/// 1. explicit `num_threads`
/// 2. `TOUCH3D_CPU_THREADS` env var
/// 3. Rayon default
pub fn init_thread_pool(num_threads: Option<usize>) -> Result<()> {
    touch3d_core::init_global_thread_pool(num_threads)
}
