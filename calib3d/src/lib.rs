pub type Result<T> = touch3d_core::Result<T>;

pub mod project;
pub use project::{
    clip_to_eye, clip_to_pixel, depth_to_point_grid, depth_to_points, depth_to_valid_points,
    eye_to_clip, eye_to_world, object_to_world, pixel_grid, pixel_to_clip, points_to_pixels,
    to_homogeneous, world_to_eye, world_to_object, CameraProjector, PixelProjection,
};
