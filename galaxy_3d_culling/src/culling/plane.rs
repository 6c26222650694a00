/// Oriented planes and plane sets.
///
/// A point P is inside a plane if `dot(normal, P) + offset >= 0`.
/// A plane set is the intersection of its planes' inside half-spaces;
/// an empty set contains everything.

use glam::{Mat4, Vec3, Vec4};
use crate::bvh::AABB;

/// Result of a 3-way plane-set/box classification.
///
/// Used by the BVH marking pass:
/// - `Outside` → unlink the subtree for this frame
/// - `Inside` → accept the subtree without further testing
/// - `Partial` → descend into the children
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrustumTest {
    /// Box is entirely outside at least one plane
    Outside,
    /// Box is entirely inside every plane
    Inside,
    /// Box straddles at least one plane
    Partial,
}

/// Oriented plane `dot(normal, P) + offset = 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Normal, pointing toward the inside half-space
    pub normal: Vec3,
    /// Signed offset
    pub offset: f32,
}

impl Plane {
    pub fn new(normal: Vec3, offset: f32) -> Self {
        Self { normal, offset }
    }

    /// Plane through `point` whose inside is the side `normal` points to.
    pub fn from_point_normal(point: Vec3, normal: Vec3) -> Self {
        Self { normal, offset: -normal.dot(point) }
    }

    /// Plane from (A, B, C, D) where Ax + By + Cz + D = 0.
    pub fn from_vec4(v: Vec4) -> Self {
        Self { normal: v.truncate(), offset: v.w }
    }

    pub fn to_vec4(&self) -> Vec4 {
        self.normal.extend(self.offset)
    }

    /// Scale to a unit normal. `None` when the normal is degenerate.
    pub fn normalized(&self) -> Option<Self> {
        let len = self.normal.length();
        if len > f32::EPSILON && len.is_finite() {
            Some(Self { normal: self.normal / len, offset: self.offset / len })
        } else {
            None
        }
    }

    /// Signed distance (exact only for unit normals).
    pub fn distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.offset
    }

    /// Same plane, inside and outside swapped.
    pub fn flipped(&self) -> Self {
        Self { normal: -self.normal, offset: -self.offset }
    }

    /// Express this plane in the space reached by `matrix`.
    ///
    /// If `matrix` maps points from space A to space B and `self` is
    /// expressed in A, the result is expressed in B: the plane vector is
    /// multiplied by the inverse-transpose of `matrix`.
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        let v = matrix.inverse().transpose() * self.to_vec4();
        Self::from_vec4(v)
    }

    /// Classify an axis-aligned box against this plane.
    pub fn classify_aabb(&self, aabb: &AABB) -> FrustumTest {
        let n = self.normal;

        // Positive vertex: corner most in the direction of the normal
        let p_vertex = Vec3::new(
            if n.x >= 0.0 { aabb.max.x } else { aabb.min.x },
            if n.y >= 0.0 { aabb.max.y } else { aabb.min.y },
            if n.z >= 0.0 { aabb.max.z } else { aabb.min.z },
        );
        if self.distance(p_vertex) < 0.0 {
            return FrustumTest::Outside;
        }

        // Negative vertex: corner least in the direction of the normal
        let n_vertex = Vec3::new(
            if n.x >= 0.0 { aabb.min.x } else { aabb.max.x },
            if n.y >= 0.0 { aabb.min.y } else { aabb.max.y },
            if n.z >= 0.0 { aabb.min.z } else { aabb.max.z },
        );
        if self.distance(n_vertex) < 0.0 {
            FrustumTest::Partial
        } else {
            FrustumTest::Inside
        }
    }

    /// Classify an oriented box (center, unit axes, half sizes) against this plane.
    pub fn classify_oriented(&self, center: Vec3, axes: &[Vec3; 3], half: Vec3) -> FrustumTest {
        let radius = self.normal.dot(axes[0]).abs() * half.x
            + self.normal.dot(axes[1]).abs() * half.y
            + self.normal.dot(axes[2]).abs() * half.z;
        let d = self.distance(center);
        if d < -radius {
            FrustumTest::Outside
        } else if d >= radius {
            FrustumTest::Inside
        } else {
            FrustumTest::Partial
        }
    }
}

/// Ordered set of planes; inside = inside every plane.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaneSet {
    planes: Vec<Plane>,
}

impl PlaneSet {
    /// Empty set (contains everything).
    pub fn new() -> Self {
        Self { planes: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { planes: Vec::with_capacity(capacity) }
    }

    pub fn from_planes(planes: impl IntoIterator<Item = Plane>) -> Self {
        Self { planes: planes.into_iter().collect() }
    }

    pub fn push(&mut self, plane: Plane) {
        self.planes.push(plane);
    }

    /// Append every plane of `other`.
    pub fn extend_from(&mut self, other: &PlaneSet) {
        self.planes.extend_from_slice(&other.planes);
    }

    pub fn clear(&mut self) {
        self.planes.clear();
    }

    pub fn len(&self) -> usize {
        self.planes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.planes.is_empty()
    }

    pub fn planes(&self) -> &[Plane] {
        &self.planes
    }

    pub fn iter(&self) -> impl Iterator<Item = &Plane> {
        self.planes.iter()
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        self.planes.iter().all(|p| p.distance(point) >= 0.0)
    }

    /// Classify an AABB against the whole set (3-way test).
    ///
    /// - If the p-vertex is outside any plane → `Outside` (early out)
    /// - If the n-vertex is outside any plane → at least `Partial`
    /// - If all n-vertices are inside all planes → `Inside`
    pub fn classify_aabb(&self, aabb: &AABB) -> FrustumTest {
        let mut all_inside = true;
        for plane in &self.planes {
            match plane.classify_aabb(aabb) {
                FrustumTest::Outside => return FrustumTest::Outside,
                FrustumTest::Partial => all_inside = false,
                FrustumTest::Inside => {}
            }
        }
        if all_inside { FrustumTest::Inside } else { FrustumTest::Partial }
    }

    /// Returns `true` if the AABB is (potentially) inside or intersecting.
    /// May return false positives (conservative), never false negatives.
    pub fn intersects_aabb(&self, aabb: &AABB) -> bool {
        self.classify_aabb(aabb) != FrustumTest::Outside
    }

    /// Classify an oriented box against the whole set.
    pub fn classify_oriented(&self, center: Vec3, axes: &[Vec3; 3], half: Vec3) -> FrustumTest {
        let mut all_inside = true;
        for plane in &self.planes {
            match plane.classify_oriented(center, axes, half) {
                FrustumTest::Outside => return FrustumTest::Outside,
                FrustumTest::Partial => all_inside = false,
                FrustumTest::Inside => {}
            }
        }
        if all_inside { FrustumTest::Inside } else { FrustumTest::Partial }
    }
}

#[cfg(test)]
#[path = "plane_tests.rs"]
mod tests;
