/// Frustum - six clipping planes for visibility culling.
///
/// A point P is inside the frustum if it is inside every plane
/// (`dot(normal, P) + offset >= 0`).
///
/// `from_camera()` builds the planes analytically from the projection
/// parameters; `from_view_projection()` extracts them from any matrix.

use glam::{Mat4, Vec3, Vec4};
use crate::bvh::AABB;
use crate::culling::{FrustumTest, Plane, PlaneSet};
use super::Camera;

/// Frustum plane indices
pub const PLANE_LEFT: usize = 0;
pub const PLANE_RIGHT: usize = 1;
pub const PLANE_BOTTOM: usize = 2;
pub const PLANE_TOP: usize = 3;
pub const PLANE_NEAR: usize = 4;
pub const PLANE_FAR: usize = 5;

/// Six world-space frustum planes with inward normals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    /// Frustum planes: left, right, bottom, top, near, far
    pub planes: [Plane; 6],
}

fn normalize_or_keep(plane: Plane) -> Plane {
    plane.normalized().unwrap_or(plane)
}

impl Frustum {
    /// Build the frustum from the camera's projection parameters and
    /// view matrix.
    ///
    /// Camera space looks down −Z. With focal factor `g` and aspect `s`
    /// the camera-space planes are
    /// left `(g, 0, −s, 0)`, right `(−g, 0, −s, 0)`,
    /// bottom `(0, g, −1, 0)`, top `(0, −g, −1, 0)`,
    /// near `(0, 0, −1, −n)`, far `(0, 0, 1, f)`.
    /// A plane maps to world space through the transpose of the view matrix.
    pub fn from_camera(camera: &Camera) -> Self {
        let projection = camera.projection();
        let g = projection.focal_factor();
        let s = projection.aspect;
        let (n, f) = (projection.near, projection.far);

        let camera_space = [
            Vec4::new(g, 0.0, -s, 0.0),
            Vec4::new(-g, 0.0, -s, 0.0),
            Vec4::new(0.0, g, -1.0, 0.0),
            Vec4::new(0.0, -g, -1.0, 0.0),
            Vec4::new(0.0, 0.0, -1.0, -n),
            Vec4::new(0.0, 0.0, 1.0, f),
        ];

        let to_world = camera.view_matrix().transpose();
        let planes = camera_space.map(|p| normalize_or_keep(Plane::from_vec4(to_world * p)));
        Self { planes }
    }

    /// Extract frustum planes from a view-projection matrix.
    ///
    /// Uses the Gribb & Hartmann method for a [0, 1] depth range
    /// (`Mat4::perspective_rh`). Works for both perspective and
    /// orthographic projections.
    pub fn from_view_projection(vp: &Mat4) -> Self {
        let m = vp.to_cols_array_2d();

        let planes = [
            // Left:   row3 + row0
            Vec4::new(m[0][3] + m[0][0], m[1][3] + m[1][0], m[2][3] + m[2][0], m[3][3] + m[3][0]),
            // Right:  row3 - row0
            Vec4::new(m[0][3] - m[0][0], m[1][3] - m[1][0], m[2][3] - m[2][0], m[3][3] - m[3][0]),
            // Bottom: row3 + row1
            Vec4::new(m[0][3] + m[0][1], m[1][3] + m[1][1], m[2][3] + m[2][1], m[3][3] + m[3][1]),
            // Top:    row3 - row1
            Vec4::new(m[0][3] - m[0][1], m[1][3] - m[1][1], m[2][3] - m[2][1], m[3][3] - m[3][1]),
            // Near:   row2 (z >= 0)
            Vec4::new(m[0][2], m[1][2], m[2][2], m[3][2]),
            // Far:    row3 - row2
            Vec4::new(m[0][3] - m[0][2], m[1][3] - m[1][2], m[2][3] - m[2][2], m[3][3] - m[3][2]),
        ];

        Self { planes: planes.map(|p| normalize_or_keep(Plane::from_vec4(p))) }
    }

    /// Left, right, bottom and top planes. For `from_camera()` frusta
    /// they all pass through the camera position.
    pub fn side_planes(&self) -> [Plane; 4] {
        [
            self.planes[PLANE_LEFT],
            self.planes[PLANE_RIGHT],
            self.planes[PLANE_BOTTOM],
            self.planes[PLANE_TOP],
        ]
    }

    /// The six planes as a plane set.
    pub fn to_plane_set(&self) -> PlaneSet {
        PlaneSet::from_planes(self.planes)
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        self.planes.iter().all(|p| p.distance(point) >= 0.0)
    }

    /// Test if an AABB intersects this frustum.
    ///
    /// Returns `true` if the AABB is (potentially) inside or intersecting.
    /// May return false positives (conservative), never false negatives.
    pub fn intersects_aabb(&self, aabb: &AABB) -> bool {
        self.classify_aabb(aabb) != FrustumTest::Outside
    }

    /// Classify an AABB against the frustum (3-way test).
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
}

#[cfg(test)]
#[path = "frustum_tests.rs"]
mod tests;
