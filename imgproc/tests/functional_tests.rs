use nalgebra::Vector3;
use touch3d_core::{BackgroundMask, Error, NormalMap};
use touch3d_imgproc::{normals_to_gradient, preprocess_normals};

fn raw_from_unit(n: Vector3<f64>, h: usize, w: usize) -> NormalMap {
    let raw = n.map(|x| 0.5 + 0.5 * x);
    NormalMap::uniform(h, w, [raw.x, raw.y, raw.z])
}

#[test]
fn test_tilted_plane_gives_constant_gradient() {
    let (h, w) = (6, 8);
    let (gel_w, gel_h) = (0.016, 0.012);
    let (sx, sy) = (gel_w / w as f64, gel_h / h as f64);
    let (gx, gy) = (1e-4, -2e-4);

    let n = Vector3::new(gx / sx, -gy / sy, 1.0).normalize();
    let unit = preprocess_normals(&raw_from_unit(n, h, w), None).unwrap();
    let grad = normals_to_gradient(&unit, gel_w, gel_h, None).unwrap();

    assert!(grad.grad_x.iter().all(|&v| (v - gx).abs() < 1e-15));
    assert!(grad.grad_y.iter().all(|&v| (v - gy).abs() < 1e-15));
}

#[test]
fn test_masked_region_is_flat_through_both_stages() {
    let (h, w) = (5, 5);
    let n = Vector3::new(0.3, -0.2, 0.9).normalize();
    let mask = BackgroundMask::from_fn(h, w, |r, _| r < 2);

    let unit = preprocess_normals(&raw_from_unit(n, h, w), Some(&mask)).unwrap();
    let grad = normals_to_gradient(&unit, 0.02, 0.02, Some(&mask)).unwrap();

    for c in 0..w {
        assert_eq!(unit.get(0, c), Some(Vector3::z()));
        assert_eq!(grad.grad_x[(1, c)], 0.0);
        assert_ne!(grad.grad_x[(3, c)], 0.0);
    }
}

#[test]
fn test_two_channel_map_rejected() {
    let err = NormalMap::from_vec(vec![0.5; 2 * 4 * 4], 2, 4, 4).unwrap_err();
    assert!(matches!(err, Error::InvalidShape(_)));
}
