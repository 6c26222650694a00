//! Scene module
//!
//! Object registry and the per-frame culling pipeline built on the BVH,
//! camera, occluder and HZB modules.

mod culling_system;

pub use culling_system::{
    CullingSystem, CullObject, CullObjectDesc, CullObjectKey, CullFlags, CullStats,
};
