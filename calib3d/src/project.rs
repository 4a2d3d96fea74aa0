//! Depth map to world points through the OpenGL transform chain, and back.
//!
//! Inverse direction, applied to every pixel at once as 4 x N homogeneous
//! matrices:
//!
//! pixel -> NDC -> clip (from the depth buffer and the near/far planes)
//! -> eye (`P⁻¹`) -> world (`V⁻¹`, then divide by w).
//!
//! The forward direction (world -> eye -> clip -> pixel) and the
//! object/world model transforms are provided for validation.

use crate::Result;
use nalgebra::{DMatrix, Matrix2xX, Matrix3xX, Matrix4, Matrix4xX, Vector4};
use touch3d_core::geometry::invert;
use touch3d_core::{CameraMatrices, ClipPlanes, DepthMap, Error, PointCloud, SensorConfig};

/// Projected pixel positions with the eye-space depth of each point.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelProjection {
    /// Row 0: x (column), row 1: y (row).
    pub pixels: Matrix2xX<f64>,
    pub depth: Vec<f64>,
}

/// Camera matrices and clip planes of one sensor, ready to unproject frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraProjector {
    camera: CameraMatrices,
    planes: ClipPlanes,
}

impl CameraProjector {
    /// Fails with `SingularMatrix` if `projection` or `view` cannot be inverted.
    pub fn new(projection: Matrix4<f64>, view: Matrix4<f64>, planes: ClipPlanes) -> Result<Self> {
        Ok(Self {
            camera: CameraMatrices::new(projection, view)?,
            planes,
        })
    }

    pub fn from_matrices(camera: CameraMatrices, planes: ClipPlanes) -> Self {
        Self { camera, planes }
    }

    pub fn from_config(cfg: &SensorConfig) -> Result<Self> {
        Ok(Self {
            camera: cfg.camera_matrices()?,
            planes: cfg.clip_planes()?,
        })
    }

    pub fn camera(&self) -> &CameraMatrices {
        &self.camera
    }

    pub fn planes(&self) -> &ClipPlanes {
        &self.planes
    }

    pub fn depth_to_points(&self, depth: &DepthMap) -> Result<PointCloud> {
        depth_to_points(depth, &self.camera, &self.planes)
    }

    pub fn depth_to_valid_points(&self, depth: &DepthMap) -> Result<(PointCloud, Vec<usize>)> {
        depth_to_valid_points(depth, &self.camera, &self.planes)
    }

    pub fn depth_to_point_grid(&self, depth: &DepthMap) -> Result<[DMatrix<f64>; 3]> {
        depth_to_point_grid(depth, &self.camera, &self.planes)
    }

    pub fn points_to_pixels(
        &self,
        points: &PointCloud,
        height: usize,
        width: usize,
    ) -> Result<PixelProjection> {
        points_to_pixels(points, height, width, &self.camera)
    }
}

fn check_grid(height: usize, width: usize) -> Result<()> {
    if height < 2 || width < 2 {
        return Err(Error::InvalidShape(format!(
            "NDC mapping needs at least 2x2 pixels, got {height}x{width}"
        )));
    }
    Ok(())
}

/// Pixel coordinates of every pixel in row-major order; row 0 is x (column).
pub fn pixel_grid(height: usize, width: usize) -> Matrix2xX<f64> {
    Matrix2xX::from_fn(height * width, |axis, i| {
        if axis == 0 {
            (i % width) as f64
        } else {
            (i / width) as f64
        }
    })
}

/// Homogeneous clip coordinates for pixels sampled from the depth buffer.
pub fn pixel_to_clip(
    pixels: &Matrix2xX<f64>,
    depth: &DepthMap,
    planes: &ClipPlanes,
) -> Result<Matrix4xX<f64>> {
    let (h, w) = (depth.height(), depth.width());
    check_grid(h, w)?;

    let (n, f) = (planes.near, planes.far);
    let z_scale = -(f + n) / (f - n);
    let z_offset = -2.0 * f * n / (f - n);

    let mut clip = Matrix4xX::zeros(pixels.ncols());
    for (i, px) in pixels.column_iter().enumerate() {
        let (x_pix, y_pix) = (px[0], px[1]);
        let z_buf = if x_pix >= 0.0 && y_pix >= 0.0 {
            depth.get(y_pix.round() as usize, x_pix.round() as usize)
        } else {
            None
        }
        .ok_or_else(|| {
            Error::InvalidShape(format!(
                "pixel ({x_pix}, {y_pix}) lies outside the {h}x{w} depth map"
            ))
        })?;

        let x_ndc = 2.0 / (w - 1) as f64 * x_pix - 1.0;
        let y_ndc = 2.0 / (h - 1) as f64 * y_pix - 1.0;

        let z_eye = -z_buf;
        let w_c = -z_eye;
        clip.set_column(
            i,
            &Vector4::new(x_ndc * w_c, y_ndc * w_c, z_scale * z_eye + z_offset, w_c),
        );
    }
    Ok(clip)
}

pub fn clip_to_eye(clip: &Matrix4xX<f64>, camera: &CameraMatrices) -> Matrix4xX<f64> {
    camera.projection_inv() * clip
}

pub fn eye_to_clip(eye: &Matrix4xX<f64>, camera: &CameraMatrices) -> Matrix4xX<f64> {
    camera.projection() * eye
}

/// Eye to world, normalized so every column has w = 1.
pub fn eye_to_world(eye: &Matrix4xX<f64>, camera: &CameraMatrices) -> Matrix4xX<f64> {
    let mut world = camera.view_inv() * eye;
    dehomogenize(&mut world);
    world
}

pub fn world_to_eye(world: &Matrix4xX<f64>, camera: &CameraMatrices) -> Matrix4xX<f64> {
    camera.view() * world
}

/// Clip coordinates to pixel positions (inverse of the NDC mapping).
pub fn clip_to_pixel(clip: &Matrix4xX<f64>, height: usize, width: usize) -> Matrix2xX<f64> {
    let half_w = (width as f64 - 1.0) / 2.0;
    let half_h = (height as f64 - 1.0) / 2.0;
    Matrix2xX::from_fn(clip.ncols(), |axis, i| {
        let ndc = clip[(axis, i)] / clip[(3, i)];
        if axis == 0 {
            half_w * (ndc + 1.0)
        } else {
            half_h * (ndc + 1.0)
        }
    })
}

pub fn object_to_world(object: &Matrix4xX<f64>, model: &Matrix4<f64>) -> Matrix4xX<f64> {
    let mut world = model * object;
    dehomogenize(&mut world);
    world
}

pub fn world_to_object(world: &Matrix4xX<f64>, model: &Matrix4<f64>) -> Result<Matrix4xX<f64>> {
    let model_inv = invert(model, "model matrix")?;
    let mut object = model_inv * world;
    dehomogenize(&mut object);
    Ok(object)
}

/// Append w = 1 to every column.
pub fn to_homogeneous(points: &Matrix3xX<f64>) -> Matrix4xX<f64> {
    Matrix4xX::from_fn(points.ncols(), |r, c| if r < 3 { points[(r, c)] } else { 1.0 })
}

fn dehomogenize(m: &mut Matrix4xX<f64>) {
    for mut col in m.column_iter_mut() {
        let w = col[3];
        col /= w;
    }
}

/// Unproject every pixel of `depth` to a world-space point, row-major.
pub fn depth_to_points(
    depth: &DepthMap,
    camera: &CameraMatrices,
    planes: &ClipPlanes,
) -> Result<PointCloud> {
    let world = unproject(depth, camera, planes)?;
    let xyz: Matrix3xX<f64> = world.fixed_rows::<3>(0).into_owned();
    Ok(PointCloud::from_matrix(&xyz))
}

/// Unproject only pixels holding a positive depth.
///
/// Zero depth marks removed background; such pixels would all collapse onto
/// the camera centre. Returns the points with their row-major pixel indices.
pub fn depth_to_valid_points(
    depth: &DepthMap,
    camera: &CameraMatrices,
    planes: &ClipPlanes,
) -> Result<(PointCloud, Vec<usize>)> {
    let (h, w) = (depth.height(), depth.width());
    let valid: Vec<usize> = (0..h * w)
        .filter(|&i| depth.data[(i / w, i % w)] > 0.0)
        .collect();
    let pixels = Matrix2xX::from_fn(valid.len(), |axis, j| {
        if axis == 0 {
            (valid[j] % w) as f64
        } else {
            (valid[j] / w) as f64
        }
    });

    let clip = pixel_to_clip(&pixels, depth, planes)?;
    let eye = clip_to_eye(&clip, camera);
    let world = eye_to_world(&eye, camera);
    tracing::debug!(
        points = valid.len(),
        skipped = h * w - valid.len(),
        "valid depth unprojected"
    );

    let xyz: Matrix3xX<f64> = world.fixed_rows::<3>(0).into_owned();
    Ok((PointCloud::from_matrix(&xyz), valid))
}

/// Unproject keeping the image layout: X, Y and Z as H x W grids.
pub fn depth_to_point_grid(
    depth: &DepthMap,
    camera: &CameraMatrices,
    planes: &ClipPlanes,
) -> Result<[DMatrix<f64>; 3]> {
    let (h, w) = (depth.height(), depth.width());
    let world = unproject(depth, camera, planes)?;
    let grid = |axis: usize| DMatrix::from_fn(h, w, |r, c| world[(axis, r * w + c)]);
    Ok([grid(0), grid(1), grid(2)])
}

fn unproject(
    depth: &DepthMap,
    camera: &CameraMatrices,
    planes: &ClipPlanes,
) -> Result<Matrix4xX<f64>> {
    let pixels = pixel_grid(depth.height(), depth.width());
    let clip = pixel_to_clip(&pixels, depth, planes)?;
    let eye = clip_to_eye(&clip, camera);
    let world = eye_to_world(&eye, camera);
    tracing::debug!(points = world.ncols(), "depth unprojected");
    Ok(world)
}

/// Forward-project world points onto an H x W image.
pub fn points_to_pixels(
    points: &PointCloud,
    height: usize,
    width: usize,
    camera: &CameraMatrices,
) -> Result<PixelProjection> {
    check_grid(height, width)?;
    let world = to_homogeneous(&points.to_matrix());
    let eye = world_to_eye(&world, camera);
    let depth = eye
        .column_iter()
        .map(|c| -c[2] / c[3])
        .collect();
    let clip = eye_to_clip(&eye, camera);
    Ok(PixelProjection {
        pixels: clip_to_pixel(&clip, height, width),
        depth,
    })
}
