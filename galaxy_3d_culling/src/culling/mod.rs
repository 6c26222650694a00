//! Half-space primitives shared by every cull pass.
//!
//! Frustum, fog and silhouette passes all reduce to an ordered set of
//! oriented planes where "inside" means `dot(normal, p) + offset >= 0`
//! for every plane.

mod plane;

pub use plane::{FrustumTest, Plane, PlaneSet};
