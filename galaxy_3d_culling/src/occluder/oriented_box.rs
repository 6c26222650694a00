/// Oriented bounding box: an orthonormal frame, a center and half sizes.

use glam::{Mat4, Vec3};
use crate::bvh::AABB;

const ORTHOGONALITY_EPSILON: f32 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientedBox {
    /// Unit, mutually orthogonal axes
    pub axes: [Vec3; 3],
    /// World-space center
    pub origin: Vec3,
    /// Half size along each axis
    pub half_size: Vec3,
}

impl OrientedBox {
    /// Box aligned with the world axes.
    pub fn from_aabb(aabb: &AABB) -> Self {
        Self {
            axes: [Vec3::X, Vec3::Y, Vec3::Z],
            origin: aabb.center(),
            half_size: aabb.half_extents(),
        }
    }

    /// Local bounds placed by a world matrix.
    ///
    /// Axis scales are folded into the half sizes. Returns `None` when
    /// the matrix is degenerate or sheared (no orthonormal frame).
    pub fn from_matrix(world: &Mat4, local: &AABB) -> Option<Self> {
        let columns = [
            world.x_axis.truncate(),
            world.y_axis.truncate(),
            world.z_axis.truncate(),
        ];
        let scales = columns.map(|c| c.length());
        if scales.iter().any(|s| !(s.is_finite() && *s > f32::EPSILON)) {
            return None;
        }
        let axes = [columns[0] / scales[0], columns[1] / scales[1], columns[2] / scales[2]];

        let sheared = axes[0].dot(axes[1]).abs() > ORTHOGONALITY_EPSILON
            || axes[1].dot(axes[2]).abs() > ORTHOGONALITY_EPSILON
            || axes[2].dot(axes[0]).abs() > ORTHOGONALITY_EPSILON;
        if sheared {
            return None;
        }

        Some(Self {
            axes,
            origin: world.transform_point3(local.center()),
            half_size: local.half_extents() * Vec3::from(scales),
        })
    }

    /// Point expressed in the box frame (relative to the center).
    pub fn to_local(&self, point: Vec3) -> Vec3 {
        let d = point - self.origin;
        Vec3::new(d.dot(self.axes[0]), d.dot(self.axes[1]), d.dot(self.axes[2]))
    }

    /// Corner `k`: bit `i` of `k` selects `+half_size[i]` on axis `i`.
    pub fn corner(&self, k: usize) -> Vec3 {
        let mut p = self.origin;
        for i in 0..3 {
            let sign = if k & (1 << i) != 0 { 1.0 } else { -1.0 };
            p += self.axes[i] * (sign * self.half_size[i]);
        }
        p
    }

    pub fn corners(&self) -> [Vec3; 8] {
        std::array::from_fn(|k| self.corner(k))
    }

    /// Camera classification code.
    ///
    /// For each axis `i`, bit `2i` is set when the point is beyond the
    /// positive face and bit `2i + 1` when it is beyond the negative face.
    /// Zero means the point is inside the box.
    pub fn classify_point(&self, point: Vec3) -> u8 {
        let q = self.to_local(point);
        let mut code = 0u8;
        for i in 0..3 {
            if q[i] > self.half_size[i] {
                code |= 1 << (2 * i);
            } else if q[i] < -self.half_size[i] {
                code |= 1 << (2 * i + 1);
            }
        }
        code
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        self.classify_point(point) == 0
    }

    /// Full surface area.
    pub fn surface_area(&self) -> f32 {
        let s = self.half_size * 2.0;
        2.0 * (s.x * s.y + s.y * s.z + s.z * s.x)
    }

    /// World-space axis-aligned bounds.
    pub fn world_aabb(&self) -> AABB {
        let extent = self.axes[0].abs() * self.half_size.x
            + self.axes[1].abs() * self.half_size.y
            + self.axes[2].abs() * self.half_size.z;
        AABB::new(self.origin - extent, self.origin + extent)
    }
}

#[cfg(test)]
#[path = "oriented_box_tests.rs"]
mod tests;
