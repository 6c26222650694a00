/// Silhouette table and occlusion plane sets.

use glam::Vec3;
use crate::camera::{Frustum, PLANE_NEAR};
use crate::culling::{FrustumTest, Plane, PlaneSet};
use super::OrientedBox;

/// Outline of a box seen from one camera region.
///
/// `corners[..count]` lists box corner indices (see
/// `OrientedBox::corner`) around the silhouette. `count` is 0 when the
/// code is impossible or the camera is inside the box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Silhouette {
    pub count: u8,
    pub corners: [u8; 6],
}

const fn none() -> Silhouette {
    Silhouette { count: 0, corners: [0; 6] }
}

const fn quad(a: u8, b: u8, c: u8, d: u8) -> Silhouette {
    Silhouette { count: 4, corners: [a, b, c, d, 0, 0] }
}

const fn hexa(corners: [u8; 6]) -> Silhouette {
    Silhouette { count: 6, corners }
}

/// Silhouette of the box for every classification code
/// (see `OrientedBox::classify_point`).
pub const SILHOUETTE_TABLE: [Silhouette; 64] = [
    // 0: inside
    none(),
    // 1..=2: +x, -x
    quad(1, 3, 7, 5),
    quad(0, 2, 6, 4),
    none(),
    // 4..=6: +y, +y+x, +y-x
    quad(2, 3, 7, 6),
    hexa([1, 3, 2, 6, 7, 5]),
    hexa([0, 2, 3, 7, 6, 4]),
    none(),
    // 8..=10: -y, -y+x, -y-x
    quad(0, 1, 5, 4),
    hexa([0, 1, 3, 7, 5, 4]),
    hexa([0, 1, 5, 4, 6, 2]),
    none(), none(), none(), none(), none(),
    // 16..=26: +z combinations
    quad(4, 5, 7, 6),
    hexa([1, 3, 7, 6, 4, 5]),
    hexa([0, 2, 6, 7, 5, 4]),
    none(),
    hexa([2, 3, 7, 5, 4, 6]),
    hexa([1, 3, 2, 6, 4, 5]),
    hexa([0, 2, 3, 7, 5, 4]),
    none(),
    hexa([0, 1, 5, 7, 6, 4]),
    hexa([0, 1, 3, 7, 6, 4]),
    hexa([0, 1, 5, 7, 6, 2]),
    none(), none(), none(), none(), none(),
    // 32..=42: -z combinations
    quad(0, 1, 3, 2),
    hexa([0, 1, 5, 7, 3, 2]),
    hexa([0, 1, 3, 2, 6, 4]),
    none(),
    hexa([0, 1, 3, 7, 6, 2]),
    hexa([0, 1, 5, 7, 6, 2]),
    hexa([0, 1, 3, 7, 6, 4]),
    none(),
    hexa([0, 2, 3, 1, 5, 4]),
    hexa([0, 2, 3, 7, 5, 4]),
    hexa([1, 3, 2, 6, 4, 5]),
    // 43..=63: impossible
    none(), none(), none(), none(), none(), none(), none(),
    none(), none(), none(), none(), none(), none(), none(),
    none(), none(), none(), none(), none(), none(), none(),
];

/// Table lookup; codes above 63 have no silhouette.
pub fn silhouette_for(code: u8) -> &'static Silhouette {
    const EMPTY: Silhouette = none();
    SILHOUETTE_TABLE.get(code as usize).unwrap_or(&EMPTY)
}

#[derive(Debug, Clone, Copy)]
struct ClipVertex {
    position: Vec3,
    /// Frustum side plane this vertex was created on, if any
    plane: Option<usize>,
}

/// Sutherland–Hodgman: keep the part of `polygon` inside `plane`.
fn clip_polygon(polygon: &[ClipVertex], plane: &Plane, index: usize, out: &mut Vec<ClipVertex>) {
    out.clear();
    let n = polygon.len();
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[(i + 1) % n];
        let da = plane.distance(a.position);
        let db = plane.distance(b.position);

        if da >= 0.0 {
            out.push(a);
        }
        if (da >= 0.0) != (db >= 0.0) {
            let t = da / (da - db);
            out.push(ClipVertex {
                position: a.position + (b.position - a.position) * t,
                plane: Some(index),
            });
        }
    }
}

/// Planes bounding the region hidden by `occluder` from `eye`.
///
/// The set holds the planes of the faces turned toward the eye plus one
/// plane through the eye per silhouette edge, after clipping the
/// silhouette to the four side planes of `frustum`. Edges created on a
/// frustum side plane are skipped: the frustum already bounds them.
///
/// Returns `None` when the occluder hides nothing this frame: eye inside
/// the box, degenerate frame, box not entirely beyond the near plane, or
/// fewer than 3 silhouette vertices left after clipping.
pub fn occlusion_planes(occluder: &OrientedBox, eye: Vec3, frustum: &Frustum) -> Option<PlaneSet> {
    let [a0, a1, a2] = occluder.axes;
    if a0.dot(a1.cross(a2)).abs() < 0.5 {
        return None;
    }

    let near = frustum.planes[PLANE_NEAR].classify_oriented(occluder.origin, &occluder.axes, occluder.half_size);
    if near != FrustumTest::Inside {
        return None;
    }

    let code = occluder.classify_point(eye);
    let silhouette = silhouette_for(code);
    if silhouette.count == 0 {
        return None;
    }

    let mut polygon: Vec<ClipVertex> = silhouette.corners[..silhouette.count as usize]
        .iter()
        .map(|&k| ClipVertex { position: occluder.corner(k as usize), plane: None })
        .collect();
    let mut scratch = Vec::with_capacity(polygon.len() + 4);
    for (index, plane) in frustum.side_planes().iter().enumerate() {
        clip_polygon(&polygon, plane, index, &mut scratch);
        std::mem::swap(&mut polygon, &mut scratch);
        if polygon.len() < 3 {
            return None;
        }
    }

    let mut planes = PlaneSet::with_capacity(3 + polygon.len());

    // Faces turned toward the eye
    for i in 0..3 {
        let axis = occluder.axes[i];
        let center = axis.dot(occluder.origin);
        let h = occluder.half_size[i];
        if code & (1 << (2 * i)) != 0 {
            planes.push(Plane::new(-axis, center + h));
        } else if code & (1 << (2 * i + 1)) != 0 {
            planes.push(Plane::new(axis, h - center));
        }
    }

    // Silhouette edges
    let centroid = polygon.iter().map(|v| v.position).sum::<Vec3>() / polygon.len() as f32;
    for i in 0..polygon.len() {
        let a = polygon[i];
        let b = polygon[(i + 1) % polygon.len()];
        if a.plane.is_some() && a.plane == b.plane {
            continue;
        }
        let normal = (a.position - eye).cross(b.position - eye);
        let Some(normal) = normal.try_normalize() else {
            continue;
        };
        let plane = Plane::from_point_normal(eye, normal);
        planes.push(if plane.distance(centroid) < 0.0 { plane.flipped() } else { plane });
    }

    Some(planes)
}

#[cfg(test)]
#[path = "silhouette_tests.rs"]
mod tests;
