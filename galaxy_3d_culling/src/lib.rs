/*!
# Galaxy 3D Culling

Scene-visibility culling for the Galaxy 3D engine.

Given a dynamic set of objects and a moving camera, this crate produces
every frame the set of objects that can possibly be seen, before any
draw call is recorded. Results are conservative: an object may be kept
although hidden, but a visible object is never removed.

## Architecture

- **bvh**: dynamic bounding volume hierarchy (SAH insertion, removal,
  non-destructive per-frame visibility marking, diagnostics)
- **culling**: planes and plane sets shared by every pass
- **camera**: passive camera, frustum and fog volume
- **occluder**: box occluders and the silhouette occlusion pass
- **hzb**: hierarchical depth pyramid fed by an external depth rasterizer
- **scene**: `CullingSystem`, the object registry and per-frame pipeline

Per frame: frustum + fog marking -> extraction -> occluder pass -> HZB pass.
*/

// Internal modules
mod error;
mod engine;
mod config;
pub mod log;
pub mod bvh;
pub mod culling;
pub mod camera;
pub mod occluder;
pub mod hzb;
pub mod scene;

// Main galaxy3d namespace module
pub mod galaxy3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Global logging state
    pub use crate::engine::Engine;

    // Configuration
    pub use crate::config::{CullingConfig, HzbConfig, SiblingSearch, FOG_MAX_OPTICAL_DEPTH};

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
        // Note: engine_* macros are NOT re-exported here - they are internal only
    }

    pub mod bvh {
        pub use crate::bvh::*;
    }

    pub mod culling {
        pub use crate::culling::*;
    }

    pub mod camera {
        pub use crate::camera::*;
    }

    pub mod occluder {
        pub use crate::occluder::*;
    }

    pub mod hzb {
        pub use crate::hzb::*;
    }

    pub mod scene {
        pub use crate::scene::*;
    }
}

// Re-export math library at crate root
pub use glam;
