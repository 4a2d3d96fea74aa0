//! Statistical outlier removal.
//!
//! Each point is scored by the mean Euclidean distance to its `k` nearest
//! neighbours (itself excluded). Points scoring above
//! `mean + std_ratio * std` of all scores are dropped.

use nalgebra::Point3;
use rayon::prelude::*;
use rstar::{PointDistance, RTree, RTreeObject, AABB};
use touch3d_core::PointCloud;

struct PointWrapper(Point3<f64>);

impl RTreeObject for PointWrapper {
    type Envelope = AABB<[f64; 3]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.0.x, self.0.y, self.0.z])
    }
}

impl PointDistance for PointWrapper {
    fn distance_2(&self, point: &[f64; 3]) -> f64 {
        let dx = self.0.x - point[0];
        let dy = self.0.y - point[1];
        let dz = self.0.z - point[2];
        dx * dx + dy * dy + dz * dz
    }
}

/// Mean distance from every point to its `k` nearest neighbours.
///
/// Clouds with fewer than `k + 1` points use all remaining points. A single
/// point scores 0.
pub fn mean_neighbor_distances(pc: &PointCloud, k: usize) -> Vec<f64> {
    let wrappers: Vec<PointWrapper> = pc.points.iter().map(|p| PointWrapper(*p)).collect();
    let tree = RTree::bulk_load(wrappers);

    pc.points
        .par_iter()
        .map(|p| {
            let query = [p.x, p.y, p.z];
            // first hit is the point itself (or an exact duplicate, same distance)
            let (sum, count) = tree
                .nearest_neighbor_iter(&query)
                .skip(1)
                .take(k)
                .fold((0.0, 0usize), |(s, c), n| (s + n.distance_2(&query).sqrt(), c + 1));
            if count > 0 {
                sum / count as f64
            } else {
                0.0
            }
        })
        .collect()
}

/// Remove statistical outliers.
///
/// Returns the filtered cloud and the indices of the kept points in
/// ascending order. Colors and normals follow their points. An infinite
/// `std_ratio` or `k == 0` keeps everything.
pub fn remove_statistical_outliers(
    pc: &PointCloud,
    k: usize,
    std_ratio: f64,
) -> (PointCloud, Vec<usize>) {
    if pc.is_empty() || k == 0 || std_ratio == f64::INFINITY {
        return (pc.clone(), (0..pc.len()).collect());
    }

    let distances = mean_neighbor_distances(pc, k);
    let mean_dist = touch3d_scientific::mean(&distances).unwrap_or(0.0);
    let std_dev = touch3d_scientific::std(&distances).unwrap_or(0.0);
    let threshold = mean_dist + std_ratio * std_dev;

    let inliers: Vec<usize> = distances
        .iter()
        .enumerate()
        .filter(|&(_, &d)| d <= threshold)
        .map(|(i, _)| i)
        .collect();

    tracing::debug!(
        total = pc.len(),
        kept = inliers.len(),
        threshold,
        "statistical outlier removal"
    );
    if inliers.is_empty() {
        tracing::warn!(total = pc.len(), threshold, "outlier removal dropped every point");
    }

    (pc.select(&inliers), inliers)
}
