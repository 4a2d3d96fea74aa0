//! Per-frame image-shaped data: normal maps, masks, gradient fields and depth.
//!
//! Two-dimensional fields are stored as `DMatrix` with rows indexing image
//! rows (v) and columns indexing image columns (u).

use crate::tensor::{Tensor, TensorShape};
use crate::{Error, Result};
use nalgebra::{DMatrix, Vector3};

/// Per-pixel surface normals, 3 x H x W, channel order (nx, ny, nz).
#[derive(Debug, Clone, PartialEq)]
pub struct NormalMap {
    tensor: Tensor<f64>,
}

impl NormalMap {
    pub fn from_tensor(tensor: Tensor<f64>) -> Result<Self> {
        if tensor.shape.channels != 3 {
            return Err(Error::InvalidShape(format!(
                "Normal map needs exactly 3 channels, got {}",
                tensor.shape.channels
            )));
        }
        Ok(Self { tensor })
    }

    /// Build from a CHW buffer of `channels * height * width` values.
    pub fn from_vec(data: Vec<f64>, channels: usize, height: usize, width: usize) -> Result<Self> {
        Self::from_tensor(Tensor::from_vec(data, TensorShape::new(channels, height, width))?)
    }

    /// Every pixel set to the same 3-vector.
    pub fn uniform(height: usize, width: usize, value: [f64; 3]) -> Self {
        let shape = TensorShape::new(3, height, width);
        let mut tensor = Tensor::filled(0.0, shape);
        for (c, v) in value.iter().enumerate() {
            tensor.channel_mut(c).fill(*v);
        }
        Self { tensor }
    }

    pub fn height(&self) -> usize {
        self.tensor.shape.height
    }

    pub fn width(&self) -> usize {
        self.tensor.shape.width
    }

    pub fn shape(&self) -> TensorShape {
        self.tensor.shape
    }

    pub fn get(&self, row: usize, col: usize) -> Option<Vector3<f64>> {
        Some(Vector3::new(
            self.tensor.get(0, row, col)?,
            self.tensor.get(1, row, col)?,
            self.tensor.get(2, row, col)?,
        ))
    }

    pub fn set(&mut self, row: usize, col: usize, n: Vector3<f64>) {
        for c in 0..3 {
            if let Some(v) = self.tensor.get_mut(c, row, col) {
                *v = n[c];
            }
        }
    }

    pub fn channel(&self, c: usize) -> &[f64] {
        self.tensor.channel(c)
    }

    pub fn channel_mut(&mut self, c: usize) -> &mut [f64] {
        self.tensor.channel_mut(c)
    }

    pub fn channel_matrix(&self, c: usize) -> DMatrix<f64> {
        self.tensor.channel_matrix(c)
    }

    pub fn as_tensor(&self) -> &Tensor<f64> {
        &self.tensor
    }

    /// Channel-last copy: `out[row * W + col] = [nx, ny, nz]`.
    pub fn to_hwc(&self) -> Vec<[f64; 3]> {
        let (nx, ny, nz) = (self.channel(0), self.channel(1), self.channel(2));
        (0..nx.len()).map(|i| [nx[i], ny[i], nz[i]]).collect()
    }
}

/// `true` where a pixel shows the undeformed gel rather than the contact.
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundMask {
    pub data: DMatrix<bool>,
}

impl BackgroundMask {
    pub fn new(data: DMatrix<bool>) -> Self {
        Self { data }
    }

    pub fn from_fn(height: usize, width: usize, f: impl FnMut(usize, usize) -> bool) -> Self {
        Self {
            data: DMatrix::from_fn(height, width, f),
        }
    }

    /// Pixels whose ground-truth depth lies beyond the resting gel depth.
    pub fn from_depth_threshold(depth_gt: &DepthMap, gel_depth: f64) -> Self {
        Self {
            data: depth_gt.data.map(|d| d > gel_depth),
        }
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn is_background(&self, row: usize, col: usize) -> bool {
        self.data.get((row, col)).copied().unwrap_or(false)
    }

    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&b| b).count()
    }

    pub fn check_dims(&self, height: usize, width: usize) -> Result<()> {
        if self.height() != height || self.width() != width {
            return Err(Error::InvalidShape(format!(
                "Background mask is {}x{}, expected {}x{}",
                self.height(),
                self.width(),
                height,
                width
            )));
        }
        Ok(())
    }
}

/// Overwrite every background pixel of `field` with `value`.
pub fn mask_background(field: &mut DMatrix<f64>, mask: &BackgroundMask, value: f64) -> Result<()> {
    mask.check_dims(field.nrows(), field.ncols())?;
    for (v, &bg) in field.iter_mut().zip(mask.data.iter()) {
        if bg {
            *v = value;
        }
    }
    Ok(())
}

/// Apply `mask_background` only when a mask is present.
pub fn mask_background_opt(
    field: &mut DMatrix<f64>,
    mask: Option<&BackgroundMask>,
    value: f64,
) -> Result<()> {
    match mask {
        Some(m) => mask_background(field, m, value),
        None => Ok(()),
    }
}

/// Depth gradient in meters per pixel step along columns (x) and rows (y).
#[derive(Debug, Clone, PartialEq)]
pub struct GradientField {
    pub grad_x: DMatrix<f64>,
    pub grad_y: DMatrix<f64>,
}

impl GradientField {
    pub fn new(grad_x: DMatrix<f64>, grad_y: DMatrix<f64>) -> Result<Self> {
        if grad_x.shape() != grad_y.shape() {
            return Err(Error::InvalidShape(format!(
                "Gradient components differ in shape: {:?} vs {:?}",
                grad_x.shape(),
                grad_y.shape()
            )));
        }
        Ok(Self { grad_x, grad_y })
    }

    pub fn zeros(height: usize, width: usize) -> Self {
        Self {
            grad_x: DMatrix::zeros(height, width),
            grad_y: DMatrix::zeros(height, width),
        }
    }

    pub fn height(&self) -> usize {
        self.grad_x.nrows()
    }

    pub fn width(&self) -> usize {
        self.grad_x.ncols()
    }
}

/// Per-pixel depth in meters.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthMap {
    pub data: DMatrix<f64>,
}

impl DepthMap {
    pub fn new(data: DMatrix<f64>) -> Self {
        Self { data }
    }

    pub fn zeros(height: usize, width: usize) -> Self {
        Self {
            data: DMatrix::zeros(height, width),
        }
    }

    pub fn from_element(height: usize, width: usize, value: f64) -> Self {
        Self {
            data: DMatrix::from_element(height, width, value),
        }
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.data.get((row, col)).copied()
    }

    /// (min, max) over all pixels, `None` for an empty map.
    pub fn range(&self) -> Option<(f64, f64)> {
        if self.data.is_empty() {
            return None;
        }
        Some((self.data.min(), self.data.max()))
    }
}
