//! Box-occluder culling.
//!
//! An occluder is an opaque oriented box. Seen from the camera it hides
//! a convex region bounded by its front faces and by planes through the
//! camera and its silhouette edges. Objects fully inside that region are
//! removed from the frame.

mod oriented_box;
mod silhouette;
mod pass;

pub use oriented_box::OrientedBox;
pub use silhouette::{occlusion_planes, silhouette_for, Silhouette, SILHOUETTE_TABLE};
pub use pass::{OccluderCandidate, OccluderPass, OccluderPassStats};
