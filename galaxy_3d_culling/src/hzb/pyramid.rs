/// Max-depth pyramid and the conservative box test.

use glam::{Mat4, Vec3};
use crate::bvh::AABB;
use super::{DepthLevel, DepthTarget, PyramidReducer};

/// Corners closer to the eye plane than this make the box visible.
const MIN_CLIP_W: f32 = 1e-5;

/// Hierarchical max-depth pyramid. Level 0 is the depth target itself.
#[derive(Debug, Clone, Default)]
pub struct DepthPyramid {
    levels: Vec<DepthLevel>,
}

impl DepthPyramid {
    pub fn new() -> Self {
        Self { levels: Vec::new() }
    }

    /// Rebuild every level from `depth`, reusing level allocations.
    ///
    /// An empty target, or one whose data does not match its size,
    /// leaves the pyramid empty.
    pub fn build(&mut self, depth: &DepthTarget, reducer: &dyn PyramidReducer) {
        let texels = depth.width as usize * depth.height as usize;
        if depth.is_empty() || depth.data.len() != texels {
            self.levels.clear();
            return;
        }

        let mut count = 1;
        let (mut w, mut h) = (depth.width, depth.height);
        while w > 1 || h > 1 {
            w = (w / 2).max(1);
            h = (h / 2).max(1);
            count += 1;
        }
        self.levels.resize_with(count, || DepthLevel::new(0, 0));

        self.levels[0].resize(depth.width, depth.height);
        self.levels[0].data.copy_from_slice(&depth.data);

        for i in 1..count {
            let (done, rest) = self.levels.split_at_mut(i);
            let src = &done[i - 1];
            let dst = &mut rest[0];
            dst.resize((src.width / 2).max(1), (src.height / 2).max(1));
            reducer.reduce(src, dst);
        }
    }

    pub fn clear(&mut self) {
        self.levels.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn level(&self, index: usize) -> Option<&DepthLevel> {
        self.levels.get(index)
    }

    /// Level 0 size, (0, 0) when empty.
    pub fn size(&self) -> (u32, u32) {
        self.levels.first().map(|l| (l.width, l.height)).unwrap_or((0, 0))
    }

    /// Whether `aabb` is certainly hidden behind the stored depth.
    ///
    /// Fails open: an empty pyramid, a box crossing the eye plane or the
    /// near plane, or a box off screen is never reported occluded. The
    /// footprint is padded by one level-0 texel, and the box is occluded
    /// only when every covering texel of some level is strictly nearer
    /// than the box's nearest depth.
    pub fn is_occluded(&self, aabb: &AABB, view_projection: &Mat4) -> bool {
        let Some(base) = self.levels.first() else {
            return false;
        };
        if base.is_empty() {
            return false;
        }

        let mut ndc_min = Vec3::splat(f32::MAX);
        let mut ndc_max = Vec3::splat(f32::MIN);
        for corner in aabb.corners() {
            let clip = *view_projection * corner.extend(1.0);
            if clip.w <= MIN_CLIP_W {
                return false;
            }
            let ndc = clip.truncate() / clip.w;
            ndc_min = ndc_min.min(ndc);
            ndc_max = ndc_max.max(ndc);
        }

        let nearest = ndc_min.z;
        if nearest < 0.0 {
            return false;
        }
        if ndc_max.x < -1.0 || ndc_min.x > 1.0 || ndc_max.y < -1.0 || ndc_min.y > 1.0 {
            return false;
        }

        // Screen footprint in level-0 texels, row 0 at the top
        let (w, h) = (base.width as f32, base.height as f32);
        let u0 = (ndc_min.x * 0.5 + 0.5).clamp(0.0, 1.0) * w;
        let u1 = (ndc_max.x * 0.5 + 0.5).clamp(0.0, 1.0) * w;
        let v0 = (0.5 - 0.5 * ndc_max.y).clamp(0.0, 1.0) * h;
        let v1 = (0.5 - 0.5 * ndc_min.y).clamp(0.0, 1.0) * h;

        let x0 = (u0.floor() as u32).saturating_sub(1);
        let y0 = (v0.floor() as u32).saturating_sub(1);
        let x1 = (u1.floor() as u32 + 1).min(base.width - 1);
        let y1 = (v1.floor() as u32 + 1).min(base.height - 1);

        let extent = (u1 - u0).max(v1 - v0).max(1.0);
        let start = ((extent * 0.5).log2().ceil().max(0.0) as usize).min(self.levels.len() - 1);

        for level_index in (0..=start).rev() {
            let level = &self.levels[level_index];
            let lx0 = (x0 >> level_index).min(level.width - 1);
            let lx1 = (x1 >> level_index).min(level.width - 1);
            let ly0 = (y0 >> level_index).min(level.height - 1);
            let ly1 = (y1 >> level_index).min(level.height - 1);

            let all_nearer = (ly0..=ly1).all(|y| (lx0..=lx1).all(|x| level.get(x, y) < nearest));
            if all_nearer {
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
#[path = "pyramid_tests.rs"]
mod tests;
