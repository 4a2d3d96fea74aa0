//! Sensor configuration.
//!
//! Physical constants of one tactile sensor: gel dimensions, camera
//! frustum and pose, depth offset and the background policy. Loaded from
//! JSON and shared read-only by every frame.

use crate::geometry::{matrix_from_rows, CameraMatrices, ClipPlanes};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorMode {
    /// Background mask is supplied by the caller, if at all.
    #[default]
    Real,
    /// Background mask is derived from ground-truth depth.
    Simulation,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlierParams {
    pub k: usize,
    pub std_ratio: f64,
}

impl Default for OutlierParams {
    fn default() -> Self {
        Self {
            k: 20,
            std_ratio: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorConfig {
    pub gel_width: f64,
    pub gel_height: f64,
    #[serde(default)]
    pub gel_depth: f64,
    pub max_depth: f64,
    pub z_near: f64,
    pub z_far: f64,
    /// Row-major projection matrix.
    pub projection: [[f64; 4]; 4],
    /// Row-major camera pose in the sensor frame.
    pub camera_offset: [[f64; 4]; 4],
    #[serde(default = "default_true")]
    pub remove_background_depth: bool,
    #[serde(default)]
    pub mode: SensorMode,
    #[serde(default)]
    pub outlier: OutlierParams,
}

fn default_true() -> bool {
    true
}

impl SensorConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)
            .map_err(|e| Error::configuration(format!("invalid sensor config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&raw)
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::configuration(format!("cannot serialize sensor config: {e}")))
    }

    pub fn validate(&self) -> Result<()> {
        let positive = |name: &str, v: f64| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(Error::configuration(format!("{name} must be > 0, got {v}")))
            }
        };
        positive("gel_width", self.gel_width)?;
        positive("gel_height", self.gel_height)?;
        if !self.max_depth.is_finite() || self.max_depth < 0.0 {
            return Err(Error::configuration(format!(
                "max_depth must be >= 0, got {}",
                self.max_depth
            )));
        }
        if !self.gel_depth.is_finite() {
            return Err(Error::configuration("gel_depth must be finite"));
        }
        self.clip_planes()?;
        if self.outlier.k == 0 {
            return Err(Error::configuration("outlier.k must be >= 1"));
        }
        if self.outlier.std_ratio.is_nan() || self.outlier.std_ratio < 0.0 {
            return Err(Error::configuration(format!(
                "outlier.std_ratio must be >= 0, got {}",
                self.outlier.std_ratio
            )));
        }
        Ok(())
    }

    pub fn clip_planes(&self) -> Result<ClipPlanes> {
        ClipPlanes::new(self.z_near, self.z_far)
    }

    /// Projection matrix and the view matrix derived from `camera_offset`.
    pub fn camera_matrices(&self) -> Result<CameraMatrices> {
        CameraMatrices::from_camera_pose(
            matrix_from_rows(&self.projection),
            matrix_from_rows(&self.camera_offset),
        )
    }
}
