/// Fog volume - a half-space filled with homogeneous fog.
///
/// The fog occupies the negative side of its plane
/// (`plane.distance(p) < 0`). An object whose line of sight crosses
/// more than `max_optical_depth / density` units of fog is
/// indistinguishable from the fog color and can be culled.

use glam::Vec3;
use crate::culling::{Plane, PlaneSet};
use crate::error::Result;
use crate::engine_err;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FogVolume {
    /// Fog surface; the normal points out of the fog
    plane: Plane,
    /// Extinction per world unit
    density: f32,
}

impl FogVolume {
    /// Create a fog volume. The plane is normalized; the density must be
    /// finite and strictly positive.
    pub fn new(plane: Plane, density: f32) -> Result<Self> {
        if !(density.is_finite() && density > 0.0) {
            return Err(engine_err!("galaxy3d::Fog", InvalidConfig,
                "Fog density must be finite and > 0 (got {})", density));
        }
        let plane = plane.normalized()
            .ok_or_else(|| engine_err!("galaxy3d::Fog", InvalidConfig, "Fog plane has a degenerate normal"))?;
        Ok(Self { plane, density })
    }

    pub fn plane(&self) -> &Plane {
        &self.plane
    }

    pub fn density(&self) -> f32 {
        self.density
    }

    /// Distance through fog after which objects are fully fogged.
    pub fn visibility_distance(&self, max_optical_depth: f32) -> f32 {
        max_optical_depth / self.density
    }

    pub fn contains(&self, point: Vec3) -> bool {
        self.plane.distance(point) < 0.0
    }

    /// Planes bounding the region that can still be seen through the fog.
    ///
    /// With `c` the signed height of the eye above the fog surface and `D`
    /// the visibility distance:
    /// - lower plane, always: height `>= min(c, 0) − D`;
    /// - upper plane, when `c + D < 0` (eye deeper than `D`): height `<= c + D`;
    /// - view plane, with the upper plane: `dot(forward, p − eye) <= D`.
    ///
    /// Everything on the outside of one of these planes is seen through
    /// at least `D` units of fog.
    pub fn cull_planes(&self, eye: Vec3, forward: Vec3, max_optical_depth: f32) -> PlaneSet {
        let mut planes = PlaneSet::with_capacity(3);
        let n = self.plane.normal;
        let d = self.visibility_distance(max_optical_depth);
        let c = self.plane.distance(eye);

        planes.push(Plane::new(n, self.plane.offset - c.min(0.0) + d));

        if c + d < 0.0 {
            planes.push(Plane::new(-n, c + d - self.plane.offset));

            if let Some(forward) = forward.try_normalize() {
                planes.push(Plane::new(-forward, forward.dot(eye) + d));
            }
        }
        planes
    }
}

#[cfg(test)]
#[path = "fog_tests.rs"]
mod tests;
