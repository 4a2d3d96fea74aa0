//! Surface normals to depth gradients.
//!
//! A unit normal (nx, ny, nz) of the height field z(x, y) gives
//! dz/dx = -nx/nz and dz/dy = -ny/nz. Depth grows away from the camera
//! while z grows toward it, so the depth gradient flips sign; image rows
//! run opposite to the camera y axis, flipping the row component once more.

use crate::Result;
use nalgebra::DMatrix;
use touch3d_core::{mask_background_opt, BackgroundMask, GradientField, NormalMap};

/// Smallest |nz| used as a divisor.
pub const NZ_EPSILON: f64 = 0.1;

/// Clamp `nz` away from zero keeping its sign; zero maps to `+eps`.
#[inline]
pub fn clip_nz(nz: f64, eps: f64) -> f64 {
    if nz.abs() >= eps {
        nz
    } else if nz < 0.0 {
        -eps
    } else {
        eps
    }
}

/// Convert unit normals into a depth-gradient field in meters per pixel.
///
/// `gel_width`/`gel_height` are the physical extent of the imaged gel; the
/// column gradient is scaled by `gel_width / W` and the row gradient by
/// `gel_height / H`. Background pixels, if masked, get a zero gradient.
pub fn normals_to_gradient(
    normal: &NormalMap,
    gel_width: f64,
    gel_height: f64,
    bg_mask: Option<&BackgroundMask>,
) -> Result<GradientField> {
    let (h, w) = (normal.height(), normal.width());
    if let Some(mask) = bg_mask {
        mask.check_dims(h, w)?;
    }

    let nx = normal.channel(0);
    let ny = normal.channel(1);
    let nz = normal.channel(2);
    let scale_x = if w > 0 { gel_width / w as f64 } else { 0.0 };
    let scale_y = if h > 0 { gel_height / h as f64 } else { 0.0 };

    let mut clipped = 0usize;
    let mut grad_x = DMatrix::zeros(h, w);
    let mut grad_y = DMatrix::zeros(h, w);
    for row in 0..h {
        for col in 0..w {
            let i = row * w + col;
            if nz[i].abs() < NZ_EPSILON {
                clipped += 1;
            }
            let nz_c = clip_nz(nz[i], NZ_EPSILON);
            let dzdx = -nx[i] / nz_c;
            let dzdy = -ny[i] / nz_c;
            let ddepth_dx = -dzdx;
            let ddepth_dy = -dzdy;
            grad_x[(row, col)] = ddepth_dx * scale_x;
            grad_y[(row, col)] = -ddepth_dy * scale_y;
        }
    }

    mask_background_opt(&mut grad_x, bg_mask, 0.0)?;
    mask_background_opt(&mut grad_y, bg_mask, 0.0)?;

    if clipped * 2 > h * w {
        tracing::warn!(clipped, total = h * w, "most normals are near grazing incidence");
    } else {
        tracing::debug!(clipped, height = h, width = w, "gradient field computed");
    }

    GradientField::new(grad_x, grad_y)
}
