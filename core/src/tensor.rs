use crate::{Error, Result};
use nalgebra::DMatrix;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TensorShape {
    pub channels: usize,
    pub height: usize,
    pub width: usize,
}

impl TensorShape {
    pub fn new(channels: usize, height: usize, width: usize) -> Self {
        Self {
            channels,
            height,
            width,
        }
    }

    pub fn hw(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    pub fn chw(&self) -> (usize, usize, usize) {
        (self.channels, self.height, self.width)
    }

    pub fn plane_len(&self) -> usize {
        self.height.saturating_mul(self.width)
    }

    pub fn len(&self) -> usize {
        self.channels.saturating_mul(self.plane_len())
    }

    pub fn checked_len(&self) -> Option<usize> {
        self.channels
            .checked_mul(self.height)
            .and_then(|partial| partial.checked_mul(self.width))
    }
}

/// Dense channel-first array.
///
/// **Layout Convention:**
/// Data is stored contiguously with Width as the fastest-varying dimension,
/// followed by Height, and then Channels. The element at (c, h, w) lives at
/// `index = c * (H * W) + h * W + w`.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor<T: Copy> {
    data: Vec<T>,
    pub shape: TensorShape,
}

impl<T: Copy> Tensor<T> {
    pub fn from_vec(data: Vec<T>, shape: TensorShape) -> Result<Self> {
        match shape.checked_len() {
            Some(len) if len == data.len() => Ok(Self { data, shape }),
            _ => Err(Error::InvalidShape(format!(
                "Data size mismatch: got {}, expected {:?}",
                data.len(),
                shape.chw()
            ))),
        }
    }

    pub fn filled(value: T, shape: TensorShape) -> Self {
        Self {
            data: vec![value; shape.len()],
            shape,
        }
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn get(&self, c: usize, h: usize, w: usize) -> Option<T> {
        if c >= self.shape.channels || h >= self.shape.height || w >= self.shape.width {
            return None;
        }
        Some(self.data[self.offset(c, h, w)])
    }

    pub fn get_mut(&mut self, c: usize, h: usize, w: usize) -> Option<&mut T> {
        if c >= self.shape.channels || h >= self.shape.height || w >= self.shape.width {
            return None;
        }
        let idx = self.offset(c, h, w);
        self.data.get_mut(idx)
    }

    /// Contiguous H*W plane of channel `c`.
    pub fn channel(&self, c: usize) -> &[T] {
        let plane = self.shape.plane_len();
        &self.data[c * plane..(c + 1) * plane]
    }

    pub fn channel_mut(&mut self, c: usize) -> &mut [T] {
        let plane = self.shape.plane_len();
        &mut self.data[c * plane..(c + 1) * plane]
    }

    #[inline]
    fn offset(&self, c: usize, h: usize, w: usize) -> usize {
        c * self.shape.height * self.shape.width + h * self.shape.width + w
    }
}

impl<T: Copy + nalgebra::Scalar> Tensor<T> {
    /// Copy channel `c` into an H x W matrix (rows = image rows).
    pub fn channel_matrix(&self, c: usize) -> DMatrix<T> {
        let (h, w) = self.shape.hw();
        DMatrix::from_row_slice(h, w, self.channel(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chw_indexing() {
        let data: Vec<f64> = (0..24).map(|v| v as f64).collect();
        let t = Tensor::from_vec(data, TensorShape::new(2, 3, 4)).unwrap();

        assert_eq!(t.get(0, 0, 0), Some(0.0));
        assert_eq!(t.get(0, 1, 2), Some(6.0));
        assert_eq!(t.get(1, 2, 3), Some(23.0));
        assert_eq!(t.get(2, 0, 0), None);
        assert_eq!(t.channel(1)[0], 12.0);
    }

    #[test]
    fn test_size_mismatch() {
        let err = Tensor::from_vec(vec![0.0f64; 5], TensorShape::new(1, 2, 3)).unwrap_err();
        assert!(matches!(err, Error::InvalidShape(_)));
    }

    #[test]
    fn test_channel_matrix_is_row_major_image() {
        let t = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], TensorShape::new(1, 2, 3))
            .unwrap();
        let m = t.channel_matrix(0);
        assert_eq!(m.nrows(), 2);
        assert_eq!(m.ncols(), 3);
        assert_eq!(m[(1, 0)], 4.0);
        assert_eq!(m[(0, 2)], 3.0);
    }
}
