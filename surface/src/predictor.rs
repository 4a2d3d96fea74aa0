use touch3d_core::{ColorImage, NormalMap, Result};

/// Color image to raw normal map, channels in `[0, 1]`.
///
/// The returned map must have the same height and width as the image.
pub trait NormalPredictor {
    fn predict_normal(&self, color: &ColorImage) -> Result<NormalMap>;
}

impl<F> NormalPredictor for F
where
    F: Fn(&ColorImage) -> Result<NormalMap>,
{
    fn predict_normal(&self, color: &ColorImage) -> Result<NormalMap> {
        self(color)
    }
}

/// Reads normals straight from the color channels (`value / 255`).
///
/// Useful when frames already hold rendered normal maps.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColorAsNormal;

impl NormalPredictor for ColorAsNormal {
    fn predict_normal(&self, color: &ColorImage) -> Result<NormalMap> {
        let (w, h) = (color.width() as usize, color.height() as usize);
        let plane = h * w;
        let mut data = vec![0.0; 3 * plane];
        for (x, y, px) in color.enumerate_pixels() {
            let i = y as usize * w + x as usize;
            for c in 0..3 {
                data[c * plane + i] = px[c] as f64 / 255.0;
            }
        }
        NormalMap::from_vec(data, 3, h, w)
    }
}
