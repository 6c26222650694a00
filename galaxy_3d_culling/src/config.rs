/// Culling configuration.
///
/// Plain data, passed once to `CullingSystem::new()`. Every field has a
/// usable default; `validate()` rejects values the passes cannot work with.

use crate::error::Result;
use crate::engine_err;

/// Maximum optical depth before fogged geometry is indistinguishable
/// from the fog color: `exp(-ln 256) = 1/256`, below one 8-bit step.
pub const FOG_MAX_OPTICAL_DEPTH: f32 = 5.545_177_4;

/// Strategy used by the BVH to pick the sibling of a newly inserted leaf.
///
/// Both strategies select a sibling of minimal insertion cost; they only
/// differ in how many nodes they visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SiblingSearch {
    /// Evaluate the cost at every node (O(n))
    Global,
    /// Prune subtrees whose lower bound cannot beat the best cost found
    #[default]
    BranchAndBound,
}

/// Hierarchical depth pyramid settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HzbConfig {
    /// Run the HZB pass in `CullingSystem::cull_frame()`
    pub enabled: bool,
    /// Level 0 resolution = viewport size >> resolution_shift
    pub resolution_shift: u32,
    /// Reduce pyramid levels on the rayon thread pool
    pub parallel: bool,
    /// Output rows handled by one reduction task
    pub rows_per_task: usize,
}

impl Default for HzbConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            resolution_shift: 2,
            parallel: true,
            rows_per_task: 8,
        }
    }
}

/// Configuration of the whole culling pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct CullingConfig {
    /// Sibling search used on insertion
    pub sibling_search: SiblingSearch,
    /// Apply SAH-lowering tree rotations after insertions.
    /// Off by default: rotations are validated separately from insertion.
    pub enable_rotations: bool,
    /// Optical depth beyond which fogged objects are culled
    pub fog_max_optical_depth: f32,
    /// Run the box-occluder silhouette pass in `cull_frame()`
    pub occluder_pass: bool,
    /// Upper bound on occluders evaluated per frame (largest first)
    pub max_occluders_per_frame: usize,
    /// Occluders whose `surface area / distance²` is below this are skipped
    pub min_occluder_solid_angle: f32,
    /// Hierarchical depth pyramid settings
    pub hzb: HzbConfig,
}

impl Default for CullingConfig {
    fn default() -> Self {
        Self {
            sibling_search: SiblingSearch::BranchAndBound,
            enable_rotations: false,
            fog_max_optical_depth: FOG_MAX_OPTICAL_DEPTH,
            occluder_pass: true,
            max_occluders_per_frame: 16,
            min_occluder_solid_angle: 0.01,
            hzb: HzbConfig::default(),
        }
    }
}

impl CullingConfig {
    /// Check that every value is usable.
    pub fn validate(&self) -> Result<()> {
        if !(self.fog_max_optical_depth.is_finite() && self.fog_max_optical_depth > 0.0) {
            return Err(engine_err!("galaxy3d::CullingConfig", InvalidConfig,
                "fog_max_optical_depth must be finite and positive, got {}",
                self.fog_max_optical_depth));
        }
        if !(self.min_occluder_solid_angle.is_finite() && self.min_occluder_solid_angle >= 0.0) {
            return Err(engine_err!("galaxy3d::CullingConfig", InvalidConfig,
                "min_occluder_solid_angle must be finite and >= 0, got {}",
                self.min_occluder_solid_angle));
        }
        if self.hzb.resolution_shift > 8 {
            return Err(engine_err!("galaxy3d::CullingConfig", InvalidConfig,
                "hzb.resolution_shift {} leaves no usable resolution", self.hzb.resolution_shift));
        }
        if self.hzb.rows_per_task == 0 {
            return Err(engine_err!("galaxy3d::CullingConfig", InvalidConfig,
                "hzb.rows_per_task must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
