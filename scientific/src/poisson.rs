//! Depth from a gradient field by solving ∇²z = div(g) with Dirichlet
//! boundary values.
//!
//! The interior right-hand side is built from backward differences of the
//! gradient, the known boundary is moved to the right-hand side, and the
//! 5-point Laplacian is inverted in the sine basis where it is diagonal.

use crate::dst::{Dst2d, SineTransform};
use crate::{Error, Result};
use nalgebra::DMatrix;
use touch3d_core::{mask_background_opt, BackgroundMask, DepthMap, GradientField};

/// Post-processing applied around the raw Poisson solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntegrationParams {
    /// Offset added after clipping; the undeformed surface ends up here.
    pub max_depth: f64,
    /// With a background mask, reset every pixel at or beyond `max_depth` to 0.
    pub remove_background_depth: bool,
    pub transform: SineTransform,
}

impl Default for IntegrationParams {
    fn default() -> Self {
        Self {
            max_depth: 0.0,
            remove_background_depth: true,
            transform: SineTransform::TypeI,
        }
    }
}

impl IntegrationParams {
    pub fn with_max_depth(mut self, max_depth: f64) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_remove_background_depth(mut self, enabled: bool) -> Self {
        self.remove_background_depth = enabled;
        self
    }

    pub fn with_transform(mut self, transform: SineTransform) -> Self {
        self.transform = transform;
        self
    }
}

/// Solve the Poisson system for the interior of `boundary`.
///
/// `grad_x` runs along columns and `grad_y` along rows. Only the outermost
/// ring of `boundary` is used; the returned matrix keeps that ring and
/// holds the solution everywhere else.
pub fn poisson_reconstruct(
    grad_x: &DMatrix<f64>,
    grad_y: &DMatrix<f64>,
    boundary: &DMatrix<f64>,
    transform: SineTransform,
) -> Result<DMatrix<f64>> {
    let (h, w) = boundary.shape();
    if grad_x.shape() != (h, w) || grad_y.shape() != (h, w) {
        return Err(Error::InvalidShape(format!(
            "gradient {:?}/{:?} does not match boundary {:?}",
            grad_x.shape(),
            grad_y.shape(),
            (h, w)
        )));
    }
    if h < 3 || w < 3 {
        return Err(Error::SingularSystem(format!(
            "a {h}x{w} grid has no interior to solve for"
        )));
    }
    let (hi, wi) = (h - 2, w - 2);

    // Known boundary ring; interior zeroed.
    let mut frame = boundary.clone();
    frame.view_mut((1, 1), (hi, wi)).fill(0.0);

    let mut rhs = DMatrix::zeros(hi, wi);
    for r in 1..=hi {
        for c in 1..=wi {
            let gxx = grad_x[(r, c)] - grad_x[(r, c - 1)];
            let gyy = grad_y[(r, c)] - grad_y[(r - 1, c)];
            let bdry = frame[(r, c + 1)] + frame[(r, c - 1)] + frame[(r + 1, c)]
                + frame[(r - 1, c)];
            rhs[(r - 1, c - 1)] = gxx + gyy - bdry;
        }
    }

    let dst = Dst2d::new(transform, hi, wi);
    let mut coeffs = dst.forward(&rhs);
    for r in 0..hi {
        let ey = transform.eigenvalue(r + 1, hi);
        for c in 0..wi {
            let denom = transform.eigenvalue(c + 1, wi) + ey;
            if denom == 0.0 {
                return Err(Error::SingularSystem(format!(
                    "zero eigenvalue at interior mode ({}, {})",
                    r + 1,
                    c + 1
                )));
            }
            coeffs[(r, c)] /= denom;
        }
    }
    let interior = dst.inverse(&coeffs);
    tracing::trace!(?transform, rows = hi, cols = wi, "poisson interior solved");

    frame.view_mut((1, 1), (hi, wi)).copy_from(&interior);
    Ok(frame)
}

/// Reset every pixel at or beyond `max_depth` (not indented) to 0.
///
/// Returns the number of pixels reset.
pub fn remove_background_depth(depth: &mut DMatrix<f64>, max_depth: f64) -> usize {
    let mut reset = 0usize;
    depth.apply(|v| {
        if *v >= max_depth {
            *v = 0.0;
            reset += 1;
        }
    });
    tracing::debug!(reset, "flat background depth removed");
    reset
}

/// Integrate a depth-gradient field into a depth map.
///
/// Steps: solve against `boundary` (all zeros when `None`), zero the
/// background, clip to `<= 0`, add `max_depth`, and with a mask and
/// `remove_background_depth` reset every pixel `>= max_depth` to 0.
pub fn integrate_gradient(
    grad: &GradientField,
    boundary: Option<&DepthMap>,
    bg_mask: Option<&BackgroundMask>,
    params: &IntegrationParams,
) -> Result<DepthMap> {
    let (h, w) = (grad.height(), grad.width());
    let zero;
    let boundary = match boundary {
        Some(b) => &b.data,
        None => {
            zero = DMatrix::zeros(h, w);
            &zero
        }
    };

    let mut depth = poisson_reconstruct(&grad.grad_x, &grad.grad_y, boundary, params.transform)?;
    mask_background_opt(&mut depth, bg_mask, 0.0)?;

    let max_depth = params.max_depth;
    depth.apply(|v| *v = v.min(0.0) + max_depth);

    if bg_mask.is_some() && params.remove_background_depth {
        remove_background_depth(&mut depth, max_depth);
    }

    let depth = DepthMap::new(depth);
    if let Some((lo, hi)) = depth.range() {
        tracing::debug!(height = h, width = w, min = lo, max = hi, "depth integrated");
    }
    Ok(depth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn forward_differences(d: &DMatrix<f64>) -> (DMatrix<f64>, DMatrix<f64>) {
        let (h, w) = d.shape();
        let gx = DMatrix::from_fn(h, w, |r, c| if c + 1 < w { d[(r, c + 1)] - d[(r, c)] } else { 0.0 });
        let gy = DMatrix::from_fn(h, w, |r, c| if r + 1 < h { d[(r + 1, c)] - d[(r, c)] } else { 0.0 });
        (gx, gy)
    }

    #[test]
    fn test_zero_gradient_zero_boundary() {
        let g = DMatrix::zeros(6, 9);
        let z = poisson_reconstruct(&g, &g, &DMatrix::zeros(6, 9), SineTransform::TypeI).unwrap();
        assert!(z.iter().all(|&v| v == 0.0));
        let z = poisson_reconstruct(&g, &g, &DMatrix::zeros(6, 9), SineTransform::TypeII).unwrap();
        assert!(z.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_round_trip_with_boundary() {
        let (h, w) = (12, 17);
        let d = DMatrix::from_fn(h, w, |r, c| {
            let (x, y) = (c as f64 / (w - 1) as f64, r as f64 / (h - 1) as f64);
            0.003 * (x * x - 0.5 * y) + 0.001 * (2.0 * x).sin() * (3.0 * y).cos()
        });
        let (gx, gy) = forward_differences(&d);

        let z = poisson_reconstruct(&gx, &gy, &d, SineTransform::TypeI).unwrap();
        let scale = d.amax();
        assert!((z - &d).amax() / scale < 1e-9);
    }

    #[test]
    fn test_round_trip_zero_boundary_bump() {
        let (h, w) = (10, 14);
        let d = DMatrix::from_fn(h, w, |r, c| {
            -0.002
                * (PI * r as f64 / (h - 1) as f64).sin()
                * (PI * c as f64 / (w - 1) as f64).sin()
        });
        let (gx, gy) = forward_differences(&d);
        let z = poisson_reconstruct(&gx, &gy, &DMatrix::zeros(h, w), SineTransform::TypeI).unwrap();
        assert!((z - &d).amax() < 1e-3 * 0.002);
    }

    #[test]
    fn test_legacy_transform_is_approximate() {
        let (h, w) = (16, 16);
        let d = DMatrix::from_fn(h, w, |r, c| {
            -0.002
                * (PI * r as f64 / (h - 1) as f64).sin()
                * (PI * c as f64 / (w - 1) as f64).sin()
        });
        let (gx, gy) = forward_differences(&d);
        let z = poisson_reconstruct(&gx, &gy, &DMatrix::zeros(h, w), SineTransform::TypeII).unwrap();
        // Same sign and order of magnitude as the exact bump.
        assert!(z.min() < -0.0005);
        assert!(z.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_degenerate_grid_is_singular() {
        let g = DMatrix::zeros(2, 5);
        let err = poisson_reconstruct(&g, &g, &g, SineTransform::TypeI).unwrap_err();
        assert!(matches!(err, Error::SingularSystem(_)));

        let g0 = DMatrix::zeros(0, 0);
        assert!(matches!(
            poisson_reconstruct(&g0, &g0, &g0, SineTransform::TypeI),
            Err(Error::SingularSystem(_))
        ));
    }

    #[test]
    fn test_shape_mismatch() {
        let err = poisson_reconstruct(
            &DMatrix::zeros(4, 4),
            &DMatrix::zeros(4, 5),
            &DMatrix::zeros(4, 4),
            SineTransform::TypeI,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidShape(_)));
    }

    #[test]
    fn test_flat_field_maps_to_max_depth() {
        let grad = GradientField::zeros(4, 4);
        let params = IntegrationParams::default().with_max_depth(0.02);
        let depth = integrate_gradient(&grad, None, None, &params).unwrap();
        assert!(depth.data.iter().all(|&v| (v - 0.02).abs() < 1e-15));
    }

    #[test]
    fn test_background_reset_after_offset() {
        let (h, w) = (9, 9);
        let d = DMatrix::from_fn(h, w, |r, c| {
            let (dr, dc) = (r as f64 - 4.0, c as f64 - 4.0);
            let rr = dr * dr + dc * dc;
            if rr < 6.0 {
                -0.001 * (6.0 - rr)
            } else {
                0.0
            }
        });
        let (gx, gy) = forward_differences(&d);
        let grad = GradientField::new(gx, gy).unwrap();
        let mask = BackgroundMask::from_fn(h, w, |r, c| d[(r, c)] == 0.0);

        let params = IntegrationParams::default().with_max_depth(0.02);
        let depth = integrate_gradient(&grad, None, Some(&mask), &params).unwrap();

        assert_eq!(depth.get(0, 0), Some(0.0));
        assert_eq!(depth.get(4, 0), Some(0.0));
        let centre = depth.get(4, 4).unwrap();
        assert!((centre - (0.02 - 0.006)).abs() < 1e-9);

        let keep = params.with_remove_background_depth(false);
        let depth = integrate_gradient(&grad, None, Some(&mask), &keep).unwrap();
        assert!((depth.get(0, 0).unwrap() - 0.02).abs() < 1e-15);
    }

    #[test]
    fn test_remove_background_depth_counts_resets() {
        let mut d = DMatrix::from_row_slice(2, 3, &[0.02, 0.019, 0.025, 0.0, 0.02, 0.01]);
        assert_eq!(remove_background_depth(&mut d, 0.02), 3);
        let expected = DMatrix::from_row_slice(2, 3, &[0.0, 0.019, 0.0, 0.0, 0.0, 0.01]);
        assert_eq!(d, expected);
    }
}
