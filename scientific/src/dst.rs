//! Orthonormal discrete sine transforms.
//!
//! Transforms are applied as dense basis matrices: for an N-point signal
//! `x`, the forward transform is `M x` and the inverse is `Mᵀ x`. A 2D
//! transform of an H x W array applies the height basis on the left and the
//! width basis on the right.

use nalgebra::DMatrix;
use std::f64::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SineTransform {
    /// DST-I. Diagonalizes the second-difference operator with homogeneous
    /// Dirichlet ends, so the Poisson solve is exact.
    #[default]
    TypeI,
    /// DST-II forward with DST-III inverse, paired with eigenvalues over
    /// `N + 2`. Reproduces depth maps from existing deployments.
    TypeII,
}

impl SineTransform {
    /// Orthonormal N x N basis; row `k` holds the k-th sine mode.
    pub fn basis(self, n: usize) -> DMatrix<f64> {
        let nf = n as f64;
        match self {
            SineTransform::TypeI => {
                let scale = (2.0 / (nf + 1.0)).sqrt();
                DMatrix::from_fn(n, n, |k, j| {
                    scale * (PI * (k + 1) as f64 * (j + 1) as f64 / (nf + 1.0)).sin()
                })
            }
            SineTransform::TypeII => DMatrix::from_fn(n, n, |k, j| {
                let scale = if k + 1 == n {
                    (1.0 / nf).sqrt()
                } else {
                    (2.0 / nf).sqrt()
                };
                scale * (PI * (k + 1) as f64 * (2 * j + 1) as f64 / (2.0 * nf)).sin()
            }),
        }
    }

    /// Eigenvalue paired with mode `k` (1-based) of an n-point interior.
    pub fn eigenvalue(self, k: usize, n: usize) -> f64 {
        let period = match self {
            SineTransform::TypeI => n + 1,
            SineTransform::TypeII => n + 2,
        };
        2.0 * (PI * k as f64 / period as f64).cos() - 2.0
    }
}

/// Separable 2D sine transform for a fixed H x W array shape.
#[derive(Debug, Clone)]
pub struct Dst2d {
    kind: SineTransform,
    rows: DMatrix<f64>,
    cols: DMatrix<f64>,
}

impl Dst2d {
    pub fn new(kind: SineTransform, height: usize, width: usize) -> Self {
        Self {
            kind,
            rows: kind.basis(height),
            cols: kind.basis(width),
        }
    }

    pub fn kind(&self) -> SineTransform {
        self.kind
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows.nrows(), self.cols.nrows())
    }

    pub fn forward(&self, f: &DMatrix<f64>) -> DMatrix<f64> {
        &self.rows * f * self.cols.transpose()
    }

    pub fn inverse(&self, g: &DMatrix<f64>) -> DMatrix<f64> {
        self.rows.transpose() * g * &self.cols
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_orthonormal(m: &DMatrix<f64>) {
        let n = m.nrows();
        let err = (m * m.transpose() - DMatrix::<f64>::identity(n, n)).amax();
        assert!(err < 1e-12, "basis not orthonormal, err = {err}");
    }

    #[test]
    fn test_bases_are_orthonormal() {
        for n in [1usize, 2, 5, 16] {
            assert_orthonormal(&SineTransform::TypeI.basis(n));
            assert_orthonormal(&SineTransform::TypeII.basis(n));
        }
    }

    #[test]
    fn test_type_i_diagonalizes_second_difference() {
        let n = 7;
        let t = DMatrix::from_fn(n, n, |i, j| {
            if i == j {
                -2.0
            } else if i.abs_diff(j) == 1 {
                1.0
            } else {
                0.0
            }
        });
        let s = SineTransform::TypeI.basis(n);
        let d = &s * t * s.transpose();
        for i in 0..n {
            for j in 0..n {
                let expected = if i == j {
                    SineTransform::TypeI.eigenvalue(i + 1, n)
                } else {
                    0.0
                };
                assert!((d[(i, j)] - expected).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_eigenvalues_negative() {
        for kind in [SineTransform::TypeI, SineTransform::TypeII] {
            for n in 1..6 {
                for k in 1..=n {
                    assert!(kind.eigenvalue(k, n) < 0.0);
                }
            }
        }
    }

    #[test]
    fn test_2d_inverse_recovers_input() {
        let f = DMatrix::from_fn(4, 6, |r, c| (r * 6 + c) as f64 * 0.1 - 1.0);
        for kind in [SineTransform::TypeI, SineTransform::TypeII] {
            let dst = Dst2d::new(kind, 4, 6);
            let back = dst.inverse(&dst.forward(&f));
            assert!((back - &f).amax() < 1e-12);
        }
    }
}
