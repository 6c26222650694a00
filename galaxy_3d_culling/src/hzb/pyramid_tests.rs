use glam::{Mat4, Vec3};
use crate::bvh::AABB;
use crate::hzb::reducer::footprint;
use crate::hzb::{ParallelReducer, SerialReducer};
use super::*;

fn projection() -> Mat4 {
    Mat4::perspective_rh(std::f32::consts::FRAC_PI_2, 1.0, 0.1, 100.0)
}

/// Camera at the origin looking down -Z
fn view_projection() -> Mat4 {
    projection() * Mat4::look_at_rh(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), Vec3::Y)
}

fn depth_at(z: f32) -> f32 {
    let clip = view_projection() * Vec3::new(0.0, 0.0, z).extend(1.0);
    clip.z / clip.w
}

fn noisy_level(width: u32, height: u32) -> DepthLevel {
    let mut level = DepthLevel::new(width, height);
    for y in 0..height {
        for x in 0..width {
            level.set(x, y, ((x * 7919 + y * 104_729) % 997) as f32 / 997.0);
        }
    }
    level
}

fn wall_pyramid(size: u32, wall_z: f32) -> DepthPyramid {
    let mut pyramid = DepthPyramid::new();
    pyramid.build(&DepthLevel::filled(size, size, depth_at(wall_z)), &SerialReducer);
    pyramid
}

fn cube(center: Vec3, half: f32) -> AABB {
    AABB::from_center_half_extents(center, Vec3::splat(half))
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_level_sizes() {
    let mut pyramid = DepthPyramid::new();
    pyramid.build(&DepthLevel::new(8, 4), &SerialReducer);
    let sizes: Vec<(u32, u32)> = (0..pyramid.level_count())
        .map(|i| pyramid.level(i).map(|l| (l.width, l.height)).unwrap())
        .collect();
    assert_eq!(sizes, vec![(8, 4), (4, 2), (2, 1), (1, 1)]);

    pyramid.build(&DepthLevel::new(5, 3), &SerialReducer);
    assert_eq!(pyramid.level_count(), 3);
    assert_eq!(pyramid.size(), (5, 3));
    assert_eq!(pyramid.level(1).map(|l| (l.width, l.height)), Some((2, 1)));
}

#[test]
fn test_empty_target_clears() {
    let mut pyramid = wall_pyramid(16, -10.0);
    assert!(!pyramid.is_empty());
    pyramid.build(&DepthLevel::new(0, 0), &SerialReducer);
    assert!(pyramid.is_empty());
    assert_eq!(pyramid.size(), (0, 0));
}

#[test]
fn test_mismatched_target_clears() {
    let mut pyramid = wall_pyramid(16, -10.0);
    let short = DepthLevel { width: 4, height: 4, data: vec![0.5; 10] };
    pyramid.build(&short, &SerialReducer);
    assert!(pyramid.is_empty());
    assert!(!pyramid.is_occluded(&cube(Vec3::new(0.0, 0.0, -50.0), 1.0), &view_projection()));
}

#[test]
fn test_levels_are_monotonic() {
    let mut pyramid = DepthPyramid::new();
    pyramid.build(&noisy_level(45, 29), &SerialReducer);

    for i in 0..pyramid.level_count() - 1 {
        let fine = pyramid.level(i).unwrap();
        let coarse = pyramid.level(i + 1).unwrap();
        for y in 0..coarse.height {
            let (y0, y1) = footprint(y, fine.height, coarse.height);
            for x in 0..coarse.width {
                let (x0, x1) = footprint(x, fine.width, coarse.width);
                let mut farthest = f32::MIN;
                for fy in y0..y1 {
                    for fx in x0..x1 {
                        farthest = farthest.max(fine.get(fx, fy));
                    }
                }
                assert!(coarse.get(x, y) >= farthest, "level {} texel ({}, {})", i + 1, x, y);
            }
        }
    }
    // The top level holds the global maximum
    let top = pyramid.level(pyramid.level_count() - 1).unwrap();
    let max = pyramid.level(0).unwrap().data.iter().cloned().fold(f32::MIN, f32::max);
    assert_eq!(top.get(0, 0), max);
}

#[test]
fn test_parallel_build_matches_serial() {
    let source = noisy_level(64, 33);
    let mut serial = DepthPyramid::new();
    let mut parallel = DepthPyramid::new();
    serial.build(&source, &SerialReducer);
    parallel.build(&source, &ParallelReducer::new(3));

    assert_eq!(serial.level_count(), parallel.level_count());
    for i in 0..serial.level_count() {
        assert_eq!(serial.level(i), parallel.level(i), "level {}", i);
    }
}

#[test]
fn test_rebuild_reuses_levels() {
    let mut pyramid = DepthPyramid::new();
    pyramid.build(&noisy_level(32, 32), &SerialReducer);
    pyramid.build(&DepthLevel::filled(32, 32, 0.5), &SerialReducer);
    assert!(pyramid.level(3).unwrap().data.iter().all(|&d| d == 0.5));
}

// ============================================================================
// Occlusion test
// ============================================================================

#[test]
fn test_empty_pyramid_is_never_occluding() {
    let pyramid = DepthPyramid::new();
    assert!(!pyramid.is_occluded(&cube(Vec3::new(0.0, 0.0, -50.0), 1.0), &view_projection()));
}

#[test]
fn test_box_behind_wall_is_occluded() {
    let pyramid = wall_pyramid(64, -10.0);
    assert!(pyramid.is_occluded(&cube(Vec3::new(0.0, 0.0, -20.0), 1.0), &view_projection()));
    assert!(pyramid.is_occluded(&cube(Vec3::new(5.0, -3.0, -40.0), 2.0), &view_projection()));
}

#[test]
fn test_box_in_front_of_wall_is_visible() {
    let pyramid = wall_pyramid(64, -10.0);
    assert!(!pyramid.is_occluded(&cube(Vec3::new(0.0, 0.0, -5.0), 1.0), &view_projection()));
    // Straddles the wall
    assert!(!pyramid.is_occluded(&cube(Vec3::new(0.0, 0.0, -10.0), 1.0), &view_projection()));
}

#[test]
fn test_single_far_texel_forces_visible() {
    let mut target = DepthLevel::filled(64, 64, depth_at(-10.0));
    target.set(32, 32, 1.0);
    let mut pyramid = DepthPyramid::new();
    pyramid.build(&target, &SerialReducer);

    assert!(!pyramid.is_occluded(&cube(Vec3::new(0.0, 0.0, -20.0), 1.0), &view_projection()));
    // Far from the hole, still hidden
    assert!(pyramid.is_occluded(&cube(Vec3::new(-12.0, 12.0, -20.0), 1.0), &view_projection()));
}

#[test]
fn test_box_crossing_eye_plane_is_visible() {
    let pyramid = wall_pyramid(64, -10.0);
    assert!(!pyramid.is_occluded(&cube(Vec3::new(0.0, 0.0, 0.5), 1.0), &view_projection()));
    // Behind the camera
    assert!(!pyramid.is_occluded(&cube(Vec3::new(0.0, 0.0, 20.0), 1.0), &view_projection()));
}

#[test]
fn test_box_off_screen_is_visible() {
    let pyramid = wall_pyramid(64, -10.0);
    assert!(!pyramid.is_occluded(&cube(Vec3::new(100.0, 0.0, -20.0), 1.0), &view_projection()));
}

#[test]
fn test_large_box_uses_coarse_levels() {
    let pyramid = wall_pyramid(64, -2.0);
    // Covers most of the screen
    assert!(pyramid.is_occluded(&cube(Vec3::new(0.0, 0.0, -30.0), 20.0), &view_projection()));
}
