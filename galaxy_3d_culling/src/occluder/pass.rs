/// Occluder pass: rank occluders, build their occlusion planes and
/// remove the candidates they hide.

use glam::Vec3;
use rdst::{RadixKey, RadixSort};
use crate::camera::Frustum;
use crate::config::CullingConfig;
use crate::culling::FrustumTest;
use super::{occlusion_planes, OrientedBox};

/// One object entering the occluder pass.
#[derive(Debug, Clone, Copy)]
pub struct OccluderCandidate<K> {
    pub key: K,
    pub bounds: OrientedBox,
    /// Whether this object may hide others
    pub is_occluder: bool,
}

/// Counters of one occluder pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OccluderPassStats {
    pub candidates: usize,
    /// Occluders large enough to be considered
    pub occluders_ranked: usize,
    /// Occluders whose planes were built and tested
    pub occluders_used: usize,
    /// Candidates removed
    pub occluded: usize,
}

/// Occluder ranked by projected size, largest first.
#[derive(Debug, Clone, Copy)]
struct RankedOccluder {
    /// Inverted bits of the size proxy: ascending order = largest first
    key: u32,
    index: u32,
}

impl RadixKey for RankedOccluder {
    const LEVELS: usize = 4;

    #[inline]
    fn get_level(&self, level: usize) -> u8 {
        (self.key >> (level * 8)) as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OccluderPass {
    max_occluders: usize,
    min_solid_angle: f32,
}

impl OccluderPass {
    pub fn new(max_occluders: usize, min_solid_angle: f32) -> Self {
        Self { max_occluders, min_solid_angle }
    }

    pub fn from_config(config: &CullingConfig) -> Self {
        Self::new(config.max_occluders_per_frame, config.min_occluder_solid_angle)
    }

    /// Size proxy of an occluder seen from `eye`: surface area / distance².
    pub fn size_proxy(bounds: &OrientedBox, eye: Vec3) -> f32 {
        let distance_sq = (bounds.origin - eye).length_squared().max(1e-6);
        bounds.surface_area() / distance_sq
    }

    /// Run the pass and return the keys that stay visible, in input order.
    ///
    /// Occluders are tried largest first. An occluder already hidden by
    /// a previous one is skipped. At most `max_occluders` occluders build
    /// planes.
    pub fn run<K: Copy>(
        &self,
        eye: Vec3,
        frustum: &Frustum,
        candidates: &[OccluderCandidate<K>],
    ) -> (Vec<K>, OccluderPassStats) {
        let mut stats = OccluderPassStats {
            candidates: candidates.len(),
            ..Default::default()
        };

        let mut ranked: Vec<RankedOccluder> = candidates
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_occluder)
            .filter_map(|(index, c)| {
                let proxy = Self::size_proxy(&c.bounds, eye);
                (proxy.is_finite() && proxy >= self.min_solid_angle).then(|| RankedOccluder {
                    key: !proxy.to_bits(),
                    index: index as u32,
                })
            })
            .collect();
        ranked.radix_sort_unstable();
        stats.occluders_ranked = ranked.len();

        let mut hidden = vec![false; candidates.len()];
        for occluder in &ranked {
            if stats.occluders_used >= self.max_occluders {
                break;
            }
            let index = occluder.index as usize;
            if hidden[index] {
                continue;
            }
            let Some(planes) = occlusion_planes(&candidates[index].bounds, eye, frustum) else {
                continue;
            };
            stats.occluders_used += 1;

            for (j, candidate) in candidates.iter().enumerate() {
                if j == index || hidden[j] {
                    continue;
                }
                let b = &candidate.bounds;
                if planes.classify_oriented(b.origin, &b.axes, b.half_size) == FrustumTest::Inside {
                    hidden[j] = true;
                    stats.occluded += 1;
                }
            }
        }

        let visible = candidates
            .iter()
            .zip(hidden.iter())
            .filter(|(_, &h)| !h)
            .map(|(c, _)| c.key)
            .collect();
        (visible, stats)
    }
}

#[cfg(test)]
#[path = "pass_tests.rs"]
mod tests;
