//! Hierarchical depth pyramid (HZB) occlusion.
//!
//! Large static occluders are rendered into a small depth target by an
//! external rasterizer. Each pyramid level stores the maximum (farthest)
//! depth of its footprint in the level below, so a box whose nearest
//! depth is behind every covering texel is hidden.
//!
//! Depth convention: [0, 1] with 0 at the near plane
//! (`Mat4::perspective_rh`), row 0 at the top of the screen.

mod depth_target;
mod reducer;
mod pyramid;
mod hzb_occlusion;
pub mod mock_rasterizer;

pub use depth_target::{DepthLevel, DepthOccluder, DepthRasterizer, DepthTarget};
pub use reducer::{PyramidReducer, SerialReducer, ParallelReducer};
pub use pyramid::DepthPyramid;
pub use hzb_occlusion::HzbOcclusion;
pub use mock_rasterizer::MockDepthRasterizer;
