use glam::{Mat4, Vec3, Vec4};
use crate::bvh::AABB;
use super::*;

fn unit_box(center: Vec3) -> AABB {
    AABB::from_center_half_extents(center, Vec3::splat(0.5))
}

// ============================================================================
// Plane
// ============================================================================

#[test]
fn test_from_point_normal_distance() {
    let plane = Plane::from_point_normal(Vec3::new(0.0, 2.0, 0.0), Vec3::Y);
    assert_eq!(plane.distance(Vec3::new(5.0, 2.0, -3.0)), 0.0);
    assert_eq!(plane.distance(Vec3::new(0.0, 5.0, 0.0)), 3.0);
    assert_eq!(plane.distance(Vec3::ZERO), -2.0);
}

#[test]
fn test_normalized() {
    let plane = Plane::new(Vec3::new(0.0, 2.0, 0.0), 4.0).normalized().unwrap();
    assert_eq!(plane.normal, Vec3::Y);
    assert_eq!(plane.offset, 2.0);
    assert!(Plane::new(Vec3::ZERO, 1.0).normalized().is_none());
}

#[test]
fn test_flipped_swaps_sides() {
    let plane = Plane::new(Vec3::X, -1.0);
    assert!(plane.distance(Vec3::new(2.0, 0.0, 0.0)) > 0.0);
    assert!(plane.flipped().distance(Vec3::new(2.0, 0.0, 0.0)) < 0.0);
}

#[test]
fn test_vec4_round_trip() {
    let v = Vec4::new(0.0, 0.0, 1.0, 3.0);
    assert_eq!(Plane::from_vec4(v).to_vec4(), v);
}

#[test]
fn test_transformed_moves_with_points() {
    let plane = Plane::from_point_normal(Vec3::ZERO, Vec3::X);
    let m = Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0));
    let moved = plane.transformed(&m);
    // A point on the original plane, moved by m, lies on the moved plane
    let p = m.transform_point3(Vec3::new(0.0, 3.0, -2.0));
    assert!(moved.distance(p).abs() < 1e-5);
    assert!(moved.distance(Vec3::new(6.0, 0.0, 0.0)) > 0.0);
}

#[test]
fn test_plane_classify_aabb() {
    let plane = Plane::from_point_normal(Vec3::ZERO, Vec3::X);
    assert_eq!(plane.classify_aabb(&unit_box(Vec3::new(2.0, 0.0, 0.0))), FrustumTest::Inside);
    assert_eq!(plane.classify_aabb(&unit_box(Vec3::new(-2.0, 0.0, 0.0))), FrustumTest::Outside);
    assert_eq!(plane.classify_aabb(&unit_box(Vec3::ZERO)), FrustumTest::Partial);
}

#[test]
fn test_plane_classify_oriented_rotated_box() {
    let plane = Plane::from_point_normal(Vec3::ZERO, Vec3::X);
    let s = std::f32::consts::FRAC_1_SQRT_2;
    let axes = [Vec3::new(s, s, 0.0), Vec3::new(-s, s, 0.0), Vec3::Z];
    // Rotated unit-half box reaches sqrt(2) along X
    assert_eq!(
        plane.classify_oriented(Vec3::new(1.2, 0.0, 0.0), &axes, Vec3::ONE),
        FrustumTest::Partial
    );
    assert_eq!(
        plane.classify_oriented(Vec3::new(1.5, 0.0, 0.0), &axes, Vec3::ONE),
        FrustumTest::Inside
    );
    assert_eq!(
        plane.classify_oriented(Vec3::new(-1.5, 0.0, 0.0), &axes, Vec3::ONE),
        FrustumTest::Outside
    );
}

// ============================================================================
// PlaneSet
// ============================================================================

#[test]
fn test_empty_set_contains_everything() {
    let set = PlaneSet::new();
    assert!(set.is_empty());
    assert_eq!(set.classify_aabb(&unit_box(Vec3::splat(1e6))), FrustumTest::Inside);
    assert!(set.contains_point(Vec3::splat(-1e9)));
}

#[test]
fn test_slab_classification() {
    // 0 <= x <= 10
    let set = PlaneSet::from_planes([
        Plane::new(Vec3::X, 0.0),
        Plane::new(-Vec3::X, 10.0),
    ]);
    assert_eq!(set.len(), 2);
    assert_eq!(set.classify_aabb(&unit_box(Vec3::new(5.0, 0.0, 0.0))), FrustumTest::Inside);
    assert_eq!(set.classify_aabb(&unit_box(Vec3::new(10.0, 0.0, 0.0))), FrustumTest::Partial);
    assert_eq!(set.classify_aabb(&unit_box(Vec3::new(12.0, 0.0, 0.0))), FrustumTest::Outside);
    assert!(set.intersects_aabb(&unit_box(Vec3::new(0.2, 0.0, 0.0))));
    assert!(!set.intersects_aabb(&unit_box(Vec3::new(-3.0, 0.0, 0.0))));
}

#[test]
fn test_oriented_matches_aabb_for_identity_axes() {
    let set = PlaneSet::from_planes([
        Plane::new(Vec3::new(1.0, 1.0, 0.0).normalize(), 1.0),
        Plane::new(-Vec3::Z, 4.0),
    ]);
    let axes = [Vec3::X, Vec3::Y, Vec3::Z];
    for center in [Vec3::ZERO, Vec3::new(-3.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 4.0), Vec3::new(2.0, 2.0, 0.0)] {
        let aabb = unit_box(center);
        assert_eq!(
            set.classify_aabb(&aabb),
            set.classify_oriented(center, &axes, Vec3::splat(0.5)),
            "mismatch at {:?}", center
        );
    }
}

#[test]
fn test_extend_and_clear() {
    let mut a = PlaneSet::from_planes([Plane::new(Vec3::X, 0.0)]);
    let b = PlaneSet::from_planes([Plane::new(Vec3::Y, 0.0), Plane::new(Vec3::Z, 0.0)]);
    a.extend_from(&b);
    assert_eq!(a.len(), 3);
    assert_eq!(a.planes()[2].normal, Vec3::Z);
    a.clear();
    assert!(a.is_empty());
}
