//! Camera module - passive camera, frustum, and fog volume.
//!
//! The camera is a data container owned and driven by the caller.
//! Frustum and fog plane sets are rebuilt from it every frame.

mod camera;
mod frustum;
mod fog;

pub use camera::{Camera, Projection};
pub use frustum::{
    Frustum,
    PLANE_LEFT, PLANE_RIGHT, PLANE_BOTTOM, PLANE_TOP, PLANE_NEAR, PLANE_FAR,
};
pub use fog::FogVolume;
