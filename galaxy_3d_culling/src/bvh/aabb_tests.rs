use glam::{Mat4, Quat, Vec3};
use super::*;

fn unit_at(x: f32, y: f32, z: f32) -> AABB {
    AABB::new(Vec3::new(x, y, z), Vec3::new(x + 1.0, y + 1.0, z + 1.0))
}

// ============================================================================
// Derived values
// ============================================================================

#[test]
fn test_center_and_half_extents() {
    let aabb = AABB::new(Vec3::new(-2.0, 0.0, 4.0), Vec3::new(2.0, 6.0, 5.0));
    assert_eq!(aabb.center(), Vec3::new(0.0, 3.0, 4.5));
    assert_eq!(aabb.half_extents(), Vec3::new(2.0, 3.0, 0.5));
    assert_eq!(aabb.size(), Vec3::new(4.0, 6.0, 1.0));
}

#[test]
fn test_area_of_unit_cube() {
    assert_eq!(unit_at(0.0, 0.0, 0.0).area(), 3.0);
}

#[test]
fn test_area_of_flat_box_is_not_zero() {
    let flat = AABB::new(Vec3::ZERO, Vec3::new(4.0, 0.0, 2.0));
    assert_eq!(flat.area(), 8.0);
}

#[test]
fn test_union_area_is_monotonic() {
    let a = unit_at(0.0, 0.0, 0.0);
    let b = unit_at(5.0, -3.0, 2.0);
    let u = a.union(&b);
    assert!(u.area() >= a.area());
    assert!(u.area() >= b.area());
    assert!(u.contains(&a));
    assert!(u.contains(&b));
}

#[test]
fn test_from_center_half_extents() {
    let aabb = AABB::from_center_half_extents(Vec3::new(1.0, 1.0, 1.0), Vec3::splat(0.5));
    assert_eq!(aabb.min, Vec3::splat(0.5));
    assert_eq!(aabb.max, Vec3::splat(1.5));
}

#[test]
fn test_from_points() {
    assert!(AABB::from_points(&[]).is_none());
    let aabb = AABB::from_points(&[
        Vec3::new(1.0, -1.0, 0.0),
        Vec3::new(-2.0, 3.0, 0.5),
        Vec3::new(0.0, 0.0, -4.0),
    ]).unwrap();
    assert_eq!(aabb.min, Vec3::new(-2.0, -1.0, -4.0));
    assert_eq!(aabb.max, Vec3::new(1.0, 3.0, 0.5));
}

#[test]
fn test_corners_bit_layout() {
    let aabb = AABB::new(Vec3::ZERO, Vec3::new(1.0, 2.0, 3.0));
    let corners = aabb.corners();
    assert_eq!(corners[0], Vec3::ZERO);
    assert_eq!(corners[1], Vec3::new(1.0, 0.0, 0.0));
    assert_eq!(corners[2], Vec3::new(0.0, 2.0, 0.0));
    assert_eq!(corners[4], Vec3::new(0.0, 0.0, 3.0));
    assert_eq!(corners[7], Vec3::new(1.0, 2.0, 3.0));
}

// ============================================================================
// Transform
// ============================================================================

#[test]
fn test_transformed_translation() {
    let aabb = unit_at(0.0, 0.0, 0.0);
    let moved = aabb.transformed(&Mat4::from_translation(Vec3::new(10.0, 0.0, -1.0)));
    assert_eq!(moved.min, Vec3::new(10.0, 0.0, -1.0));
    assert_eq!(moved.max, Vec3::new(11.0, 1.0, 0.0));
}

#[test]
fn test_transformed_rotation_matches_corner_bounds() {
    let aabb = AABB::new(Vec3::new(-1.0, -2.0, -0.5), Vec3::new(1.0, 2.0, 0.5));
    let m = Mat4::from_rotation_translation(
        Quat::from_rotation_y(0.7) * Quat::from_rotation_x(0.3),
        Vec3::new(3.0, -1.0, 2.0),
    );
    let fast = aabb.transformed(&m);
    let corners: Vec<Vec3> = aabb.corners().iter().map(|c| m.transform_point3(*c)).collect();
    let exact = AABB::from_points(&corners).unwrap();
    assert!((fast.min - exact.min).abs().max_element() < 1e-5);
    assert!((fast.max - exact.max).abs().max_element() < 1e-5);
}

// ============================================================================
// Predicates
// ============================================================================

#[test]
fn test_contains_and_intersects() {
    let big = AABB::new(Vec3::splat(-10.0), Vec3::splat(10.0));
    let small = AABB::new(Vec3::splat(-1.0), Vec3::splat(1.0));
    let straddling = AABB::new(Vec3::splat(5.0), Vec3::splat(15.0));
    let far = AABB::new(Vec3::splat(20.0), Vec3::splat(21.0));

    assert!(big.contains(&small));
    assert!(!small.contains(&big));
    assert!(!big.contains(&straddling));
    assert!(big.intersects(&straddling));
    assert!(!big.intersects(&far));
}

#[test]
fn test_contains_point_on_boundary() {
    let aabb = unit_at(0.0, 0.0, 0.0);
    assert!(aabb.contains_point(Vec3::new(1.0, 0.5, 0.0)));
    assert!(!aabb.contains_point(Vec3::new(1.01, 0.5, 0.0)));
}

#[test]
fn test_is_valid() {
    assert!(unit_at(0.0, 0.0, 0.0).is_valid());
    let inverted = AABB { min: Vec3::ONE, max: Vec3::ZERO };
    assert!(!inverted.is_valid());
    let nan = AABB { min: Vec3::splat(f32::NAN), max: Vec3::ONE };
    assert!(!nan.is_valid());
}
