use crate::{Error, Result};
use nalgebra::Matrix4;

/// Projection and view matrices of the sensor camera, with their inverses.
///
/// Both matrices must be invertible; the inverses are computed once at
/// construction so every frame reuses them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraMatrices {
    projection: Matrix4<f64>,
    view: Matrix4<f64>,
    projection_inv: Matrix4<f64>,
    view_inv: Matrix4<f64>,
}

impl CameraMatrices {
    pub fn new(projection: Matrix4<f64>, view: Matrix4<f64>) -> Result<Self> {
        let projection_inv = invert(&projection, "projection matrix")?;
        let view_inv = invert(&view, "view matrix")?;
        Ok(Self {
            projection,
            view,
            projection_inv,
            view_inv,
        })
    }

    /// Build from the camera pose in the world frame; the view matrix is its inverse.
    pub fn from_camera_pose(projection: Matrix4<f64>, camera_pose: Matrix4<f64>) -> Result<Self> {
        let view = invert(&camera_pose, "camera pose")?;
        Self::new(projection, view)
    }

    pub fn projection(&self) -> &Matrix4<f64> {
        &self.projection
    }

    pub fn view(&self) -> &Matrix4<f64> {
        &self.view
    }

    pub fn projection_inv(&self) -> &Matrix4<f64> {
        &self.projection_inv
    }

    pub fn view_inv(&self) -> &Matrix4<f64> {
        &self.view_inv
    }
}

/// Near and far clip distances of the perspective frustum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipPlanes {
    pub near: f64,
    pub far: f64,
}

impl ClipPlanes {
    pub fn new(near: f64, far: f64) -> Result<Self> {
        if !(near.is_finite() && far.is_finite()) || near <= 0.0 || far <= near {
            return Err(Error::configuration(format!(
                "clip planes must satisfy 0 < near < far, got near={near}, far={far}"
            )));
        }
        Ok(Self { near, far })
    }
}

pub fn invert(m: &Matrix4<f64>, what: &str) -> Result<Matrix4<f64>> {
    if m.iter().any(|v| !v.is_finite()) {
        return Err(Error::singular_matrix(format!("{what} has non-finite entries")));
    }
    m.try_inverse()
        .ok_or_else(|| Error::singular_matrix(format!("{what} is not invertible")))
}

/// Row-major `[[f64; 4]; 4]` to a matrix.
pub fn matrix_from_rows(rows: &[[f64; 4]; 4]) -> Matrix4<f64> {
    Matrix4::from_fn(|r, c| rows[r][c])
}
