//! Numerical routines used by the reconstruction:
//! - [`dst`]: orthonormal discrete sine transforms
//! - [`poisson`]: gradient-field integration with Dirichlet boundaries
//!
//! ## Statistical Functions
//!
//! - [`mean`]: Arithmetic mean
//! - [`std`]: Population standard deviation

pub mod dst;
pub mod poisson;

pub type Error = touch3d_core::Error;
pub type Result<T> = touch3d_core::Result<T>;

pub use dst::*;
pub use poisson::*;

pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    let sum: f64 = data.iter().sum();
    Some(sum / data.len() as f64)
}

pub fn std(data: &[f64]) -> Option<f64> {
    let m = mean(data)?;
    let variance = data.iter().map(|&x| (x - m).powi(2)).sum::<f64>() / data.len() as f64;
    Some(variance.sqrt())
}
