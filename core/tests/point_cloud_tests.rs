use nalgebra::{Point3, Vector3};
use touch3d_core::point_cloud::PointCloud;

#[test]
fn test_point_cloud_result_handling() {
    let points = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0)];
    let cloud: PointCloud = PointCloud::new(points);

    let colors = vec![Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)];
    assert!(cloud.clone().with_colors(colors).is_ok());

    let bad_colors = vec![Point3::new(1.0, 0.0, 0.0)];
    let cloud_bad_colors = cloud.clone().with_colors(bad_colors);
    assert!(cloud_bad_colors.is_err());
    assert!(cloud_bad_colors
        .unwrap_err()
        .to_string()
        .contains("Color count"));

    let bad_normals = vec![Vector3::new(0.0, 0.0, 1.0)];
    let cloud_bad_normals = cloud.with_normals(bad_normals);
    assert!(cloud_bad_normals
        .unwrap_err()
        .to_string()
        .contains("Normal count"));
}

#[test]
fn test_select_keeps_attributes_aligned() {
    let points = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(2.0, 0.0, 0.0),
    ];
    let colors = vec![
        Point3::new(0.1, 0.1, 0.1),
        Point3::new(0.2, 0.2, 0.2),
        Point3::new(0.3, 0.3, 0.3),
    ];
    let cloud: PointCloud = PointCloud::new(points).with_colors(colors).unwrap();

    let sub = cloud.select(&[0, 2]);
    assert_eq!(sub.len(), 2);
    assert_eq!(sub.points[1].x, 2.0);
    assert_eq!(sub.colors.as_ref().unwrap()[1].x, 0.3);
    assert!(sub.normals.is_none());
}

#[test]
fn test_matrix_conversion() {
    let cloud: PointCloud = PointCloud::new(vec![
        Point3::new(1.0, 2.0, 3.0),
        Point3::new(4.0, 5.0, 6.0),
    ]);
    let m = cloud.to_matrix();
    assert_eq!(m.ncols(), 2);
    assert_eq!(m[(2, 1)], 6.0);
    assert_eq!(PointCloud::from_matrix(&m), cloud);
}
