/// HZB occlusion buffer: depth render + pyramid + box queries.

use glam::Mat4;
use crate::bvh::AABB;
use crate::camera::Camera;
use crate::config::HzbConfig;
use crate::error::Result;
use crate::{engine_err, engine_trace};
use super::{DepthOccluder, DepthPyramid, DepthRasterizer, ParallelReducer, PyramidReducer, SerialReducer};

const LOG_SOURCE: &str = "galaxy3d::Hzb";

pub struct HzbOcclusion {
    config: HzbConfig,
    reducer: Box<dyn PyramidReducer>,
    pyramid: DepthPyramid,
    view_projection: Mat4,
}

impl HzbOcclusion {
    /// Buffer using the reducer selected by `config.parallel`.
    pub fn new(config: HzbConfig) -> Self {
        let reducer: Box<dyn PyramidReducer> = if config.parallel {
            Box::new(ParallelReducer::new(config.rows_per_task))
        } else {
            Box::new(SerialReducer)
        };
        Self::with_reducer(config, reducer)
    }

    pub fn with_reducer(config: HzbConfig, reducer: Box<dyn PyramidReducer>) -> Self {
        Self {
            config,
            reducer,
            pyramid: DepthPyramid::new(),
            view_projection: Mat4::IDENTITY,
        }
    }

    pub fn config(&self) -> &HzbConfig {
        &self.config
    }

    pub fn reducer_name(&self) -> &str {
        self.reducer.name()
    }

    pub fn pyramid(&self) -> &DepthPyramid {
        &self.pyramid
    }

    /// View-projection the pyramid was rendered with.
    pub fn view_projection(&self) -> &Mat4 {
        &self.view_projection
    }

    /// Depth target size for a viewport: `viewport >> resolution_shift`,
    /// at least 1x1.
    pub fn target_size(&self, viewport_width: u32, viewport_height: u32) -> (u32, u32) {
        let shift = self.config.resolution_shift;
        ((viewport_width >> shift).max(1), (viewport_height >> shift).max(1))
    }

    /// Render `occluders` from `camera` and rebuild the pyramid.
    ///
    /// On failure the pyramid is cleared, so every query fails open.
    pub fn rebuild(&mut self, rasterizer: &mut dyn DepthRasterizer, occluders: &[DepthOccluder], camera: &Camera) -> Result<()> {
        let (vw, vh) = camera.viewport_size();
        if vw == 0 || vh == 0 {
            self.pyramid.clear();
            return Err(engine_err!(LOG_SOURCE, InvalidConfig, "Viewport {}x{} has no pixels", vw, vh));
        }
        let (width, height) = self.target_size(vw, vh);

        let target = match rasterizer.render_depth(occluders, camera.view_matrix(), &camera.projection_matrix(), width, height) {
            Ok(target) => target,
            Err(e) => {
                self.pyramid.clear();
                return Err(e);
            }
        };
        if target.width != width || target.height != height || target.data.len() != width as usize * height as usize {
            self.pyramid.clear();
            return Err(engine_err!(LOG_SOURCE, BackendError,
                "Rasterizer returned {}x{} ({} texels), expected {}x{}",
                target.width, target.height, target.data.len(), width, height));
        }

        self.pyramid.build(&target, self.reducer.as_ref());
        self.view_projection = camera.view_projection_matrix();
        engine_trace!(LOG_SOURCE, "Rebuilt {}x{} pyramid ({} levels, {} occluders, {} reducer)",
            width, height, self.pyramid.level_count(), occluders.len(), self.reducer.name());
        Ok(())
    }

    /// Drop the pyramid; queries report "not occluded" until the next rebuild.
    pub fn invalidate(&mut self) {
        self.pyramid.clear();
    }

    pub fn is_occluded(&self, aabb: &AABB) -> bool {
        self.pyramid.is_occluded(aabb, &self.view_projection)
    }
}

#[cfg(test)]
#[path = "hzb_occlusion_tests.rs"]
mod tests;
