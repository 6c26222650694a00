use glam::{Mat4, Vec3};
use crate::bvh::AABB;
use crate::error::Error;
use super::*;

fn matrices() -> (Mat4, Mat4) {
    (
        Mat4::look_at_rh(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), Vec3::Y),
        Mat4::perspective_rh(std::f32::consts::FRAC_PI_2, 1.0, 0.1, 100.0),
    )
}

fn wall(center: Vec3, half: Vec3) -> DepthOccluder {
    DepthOccluder {
        world_matrix: Mat4::from_translation(center),
        local_bounds: AABB::new(-half, half),
    }
}

#[test]
fn test_empty_scene_is_far() {
    let (view, projection) = matrices();
    let mut rasterizer = MockDepthRasterizer::new();
    let target = rasterizer.render_depth(&[], &view, &projection, 8, 8).unwrap();
    assert_eq!((target.width, target.height), (8, 8));
    assert!(target.data.iter().all(|&d| d == 1.0));
    assert_eq!(rasterizer.render_count, 1);
}

#[test]
fn test_wall_depth_matches_projection() {
    let (view, projection) = matrices();
    let mut rasterizer = MockDepthRasterizer::new();
    let occluders = [wall(Vec3::new(0.0, 0.0, -10.5), Vec3::new(50.0, 50.0, 0.5))];
    let target = rasterizer.render_depth(&occluders, &view, &projection, 16, 16).unwrap();

    let clip = projection * view * Vec3::new(0.0, 0.0, -10.0).extend(1.0);
    let expected = clip.z / clip.w;
    for &d in &target.data {
        assert!((d - expected).abs() < 1e-4, "{} vs {}", d, expected);
    }
}

#[test]
fn test_small_box_covers_center_only() {
    let (view, projection) = matrices();
    let mut rasterizer = MockDepthRasterizer::new();
    // Covers x, y in [-1, 1] at z = -4 → the middle half of the screen
    let occluders = [wall(Vec3::new(0.0, 0.0, -5.0), Vec3::new(2.0, 2.0, 1.0))];
    let target = rasterizer.render_depth(&occluders, &view, &projection, 16, 16).unwrap();

    assert!(target.get(8, 8) < 1.0);
    assert!(target.get(7, 7) < 1.0);
    assert_eq!(target.get(0, 0), 1.0);
    assert_eq!(target.get(15, 8), 1.0);
}

#[test]
fn test_top_row_is_screen_top() {
    let (view, projection) = matrices();
    let mut rasterizer = MockDepthRasterizer::new();
    // Box above the view axis only
    let occluders = [wall(Vec3::new(0.0, 5.0, -10.0), Vec3::new(20.0, 5.0, 0.5))];
    let target = rasterizer.render_depth(&occluders, &view, &projection, 8, 8).unwrap();
    assert!(target.get(4, 0) < 1.0);
    assert_eq!(target.get(4, 7), 1.0);
}

#[test]
fn test_simulated_failure() {
    let (view, projection) = matrices();
    let mut rasterizer = MockDepthRasterizer::new();
    rasterizer.fail_next = true;
    let result = rasterizer.render_depth(&[], &view, &projection, 4, 4);
    assert!(matches!(result, Err(Error::BackendError(_))));
    assert!(rasterizer.render_depth(&[], &view, &projection, 4, 4).is_ok());
    assert_eq!(rasterizer.render_count, 2);
}
