/// Depth images and the rasterizer contract.

use glam::Mat4;
use crate::bvh::AABB;
use crate::error::Result;
use crate::engine_err;

/// Single-channel depth image, row-major, row 0 at the top.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthLevel {
    pub width: u32,
    pub height: u32,
    pub data: Vec<f32>,
}

impl DepthLevel {
    /// Level filled with the far depth (1.0).
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, 1.0)
    }

    pub fn filled(width: u32, height: u32, depth: f32) -> Self {
        Self {
            width,
            height,
            data: vec![depth; width as usize * height as usize],
        }
    }

    /// Resize in place, keeping the allocation when possible.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.data.resize(width as usize * height as usize, 1.0);
    }

    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.data[y as usize * self.width as usize + x as usize]
    }

    pub fn set(&mut self, x: u32, y: u32, depth: f32) {
        let index = y as usize * self.width as usize + x as usize;
        self.data[index] = depth;
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Depth target produced by a rasterizer.
pub type DepthTarget = DepthLevel;

impl DepthLevel {
    /// Build a target from a raw little-endian `f32` readback.
    pub fn from_bytes(width: u32, height: u32, bytes: &[u8]) -> Result<Self> {
        let expected = width as usize * height as usize * std::mem::size_of::<f32>();
        if bytes.len() != expected {
            return Err(engine_err!("galaxy3d::Hzb", BackendError,
                "Depth readback is {} bytes, expected {} for {}x{}", bytes.len(), expected, width, height));
        }
        let data = bytes
            .chunks_exact(std::mem::size_of::<f32>())
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        Ok(Self { width, height, data })
    }

    /// Raw bytes of the depth values, in native byte order.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }
}

/// Occluder drawn into the depth target: local bounds placed by a world matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthOccluder {
    pub world_matrix: Mat4,
    pub local_bounds: AABB,
}

/// Depth-only renderer used to seed the pyramid.
///
/// Implementations render `occluders` with the given matrices into a
/// `width` x `height` depth target cleared to 1.0 and read it back.
pub trait DepthRasterizer {
    fn render_depth(
        &mut self,
        occluders: &[DepthOccluder],
        view: &Mat4,
        projection: &Mat4,
        width: u32,
        height: u32,
    ) -> Result<DepthTarget>;
}

#[cfg(test)]
#[path = "depth_target_tests.rs"]
mod tests;
