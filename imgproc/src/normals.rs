use crate::Result;
use rayon::prelude::*;
use touch3d_core::{BackgroundMask, NormalMap};

/// Raw network output encodes a zero component as 0.5.
pub const RAW_NORMAL_OFFSET: f64 = 0.5;

/// Remap a raw normal image from [0, 1] to unit normals in [-1, 1].
///
/// Each pixel is shifted by -0.5 and divided by its Euclidean norm. Pixels
/// whose shifted vector has zero length carry no orientation and are set to
/// (0, 0, 1). With a background mask, background pixels are pinned to
/// (0, 0, 1) so the derived gradient vanishes there.
pub fn preprocess_normals(raw: &NormalMap, bg_mask: Option<&BackgroundMask>) -> Result<NormalMap> {
    if let Some(mask) = bg_mask {
        mask.check_dims(raw.height(), raw.width())?;
    }

    let mut out = raw.clone();
    let unit: Vec<[f64; 3]> = (0..raw.height() * raw.width())
        .into_par_iter()
        .map(|i| {
            let v = [
                raw.channel(0)[i] - RAW_NORMAL_OFFSET,
                raw.channel(1)[i] - RAW_NORMAL_OFFSET,
                raw.channel(2)[i] - RAW_NORMAL_OFFSET,
            ];
            let norm = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
            if norm > 0.0 && norm.is_finite() {
                [v[0] / norm, v[1] / norm, v[2] / norm]
            } else {
                [0.0, 0.0, 1.0]
            }
        })
        .collect();

    let width = raw.width();
    for c in 0..3 {
        let plane = out.channel_mut(c);
        for (i, n) in unit.iter().enumerate() {
            let background = bg_mask.is_some_and(|m| m.is_background(i / width, i % width));
            plane[i] = if background {
                if c == 2 {
                    1.0
                } else {
                    0.0
                }
            } else {
                n[c]
            };
        }
    }

    tracing::debug!(
        height = raw.height(),
        width = raw.width(),
        background = bg_mask.map(|m| m.count()).unwrap_or(0),
        "normals preprocessed"
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    #[test]
    fn test_flat_raw_normal_maps_to_z() {
        let raw = NormalMap::uniform(3, 4, [0.5, 0.5, 1.0]);
        let n = preprocess_normals(&raw, None).unwrap();
        for row in 0..3 {
            for col in 0..4 {
                let v = n.get(row, col).unwrap();
                assert!((v - Vector3::new(0.0, 0.0, 1.0)).norm() < 1e-12);
            }
        }
    }

    #[test]
    fn test_output_is_unit_length() {
        let mut raw = NormalMap::uniform(2, 2, [0.5, 0.5, 1.0]);
        raw.set(0, 1, Vector3::new(0.9, 0.2, 0.7));
        raw.set(1, 0, Vector3::new(0.1, 0.8, 0.6));
        let n = preprocess_normals(&raw, None).unwrap();

        let v = n.get(0, 1).unwrap();
        assert!((v.norm() - 1.0).abs() < 1e-12);
        let expected = Vector3::new(0.4, -0.3, 0.2).normalize();
        assert!((v - expected).norm() < 1e-12);
        assert!((n.get(1, 0).unwrap().norm() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_background_pinned_to_z() {
        let raw = NormalMap::uniform(2, 2, [0.9, 0.1, 0.6]);
        let mask = BackgroundMask::from_fn(2, 2, |r, _| r == 0);
        let n = preprocess_normals(&raw, Some(&mask)).unwrap();

        assert_eq!(n.get(0, 0).unwrap(), Vector3::new(0.0, 0.0, 1.0));
        assert_eq!(n.get(0, 1).unwrap(), Vector3::new(0.0, 0.0, 1.0));
        assert!(n.get(1, 0).unwrap().x > 0.0);
    }

    #[test]
    fn test_degenerate_pixel_defaults_to_z() {
        let raw = NormalMap::uniform(1, 1, [0.5, 0.5, 0.5]);
        let n = preprocess_normals(&raw, None).unwrap();
        assert_eq!(n.get(0, 0).unwrap(), Vector3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_mask_shape_checked() {
        let raw = NormalMap::uniform(2, 2, [0.5, 0.5, 1.0]);
        let mask = BackgroundMask::from_fn(3, 2, |_, _| false);
        assert!(preprocess_normals(&raw, Some(&mask)).is_err());
    }
}
