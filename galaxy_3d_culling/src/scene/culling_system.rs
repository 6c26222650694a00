/// CullingSystem - per-frame visibility for a set of scene objects.
///
/// Objects are registered with stable keys (CullObjectKey) and stored in
/// a SlotMap; each one owns a leaf of the dynamic BVH. A frame runs:
/// frustum + fog marking -> extraction -> occluder pass -> HZB pass.

use bitflags::bitflags;
use glam::Mat4;
use slotmap::{new_key_type, SlotMap};
use crate::bvh::{AABB, BalanceReport, DynamicBvh, MarkStats, NodeKey};
use crate::camera::{Camera, FogVolume, Frustum};
use crate::config::CullingConfig;
use crate::culling::PlaneSet;
use crate::error::Result;
use crate::hzb::{DepthOccluder, DepthRasterizer, HzbOcclusion};
use crate::occluder::{OccluderCandidate, OccluderPass, OccluderPassStats, OrientedBox};
use crate::{engine_debug, engine_err, engine_error, engine_trace, engine_warn};

const LOG_SOURCE: &str = "galaxy3d::CullingSystem";

new_key_type! {
    /// Stable key to an object registered in a CullingSystem
    pub struct CullObjectKey;
}

bitflags! {
    /// Roles an object plays in the occlusion passes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CullFlags: u32 {
        /// May hide other objects in the box-occluder pass
        const OCCLUDER     = 0b0000_0001;
        /// Drawn into the HZB depth target
        const HZB_OCCLUDER = 0b0000_0010;
    }
}

impl Default for CullFlags {
    fn default() -> Self {
        Self::empty()
    }
}

/// Everything needed to register an object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CullObjectDesc {
    pub world_matrix: Mat4,
    /// Bounds in local space
    pub local_bounds: AABB,
    pub flags: CullFlags,
}

impl CullObjectDesc {
    pub fn new(world_matrix: Mat4, local_bounds: AABB) -> Self {
        Self { world_matrix, local_bounds, flags: CullFlags::empty() }
    }

    pub fn with_flags(mut self, flags: CullFlags) -> Self {
        self.flags = flags;
        self
    }
}

/// A registered object: its description, world bounds and BVH leaf.
#[derive(Debug, Clone, Copy)]
pub struct CullObject {
    desc: CullObjectDesc,
    world_bounds: AABB,
    leaf: NodeKey,
}

impl CullObject {
    pub fn desc(&self) -> &CullObjectDesc {
        &self.desc
    }

    pub fn world_matrix(&self) -> &Mat4 {
        &self.desc.world_matrix
    }

    pub fn local_bounds(&self) -> &AABB {
        &self.desc.local_bounds
    }

    pub fn flags(&self) -> CullFlags {
        self.desc.flags
    }

    /// World-space AABB enclosing the transformed local bounds
    pub fn world_bounds(&self) -> &AABB {
        &self.world_bounds
    }

    pub fn leaf(&self) -> NodeKey {
        self.leaf
    }

    /// Oriented world bounds, or the world AABB when the matrix is sheared
    pub fn oriented_bounds(&self) -> OrientedBox {
        OrientedBox::from_matrix(&self.desc.world_matrix, &self.desc.local_bounds)
            .unwrap_or_else(|| OrientedBox::from_aabb(&self.world_bounds))
    }
}

/// Object counts after each pass of the last frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CullStats {
    pub total_objects: usize,
    pub after_frustum: usize,
    pub after_occluders: usize,
    pub after_hzb: usize,
    pub occluders_used: usize,
    pub frustum_marks: MarkStats,
}

impl CullStats {
    /// Fraction of objects removed by all passes (0 when there are none)
    pub fn cull_rate(&self) -> f32 {
        if self.total_objects == 0 {
            return 0.0;
        }
        1.0 - self.after_hzb as f32 / self.total_objects as f32
    }
}

/// Visibility culling over a dynamic set of objects.
pub struct CullingSystem {
    config: CullingConfig,
    objects: SlotMap<CullObjectKey, CullObject>,
    bvh: DynamicBvh<CullObjectKey>,
    last_stats: CullStats,
}

impl CullingSystem {
    /// Create an empty system. Fails if `config` does not validate.
    pub fn new(config: CullingConfig) -> Result<Self> {
        config.validate()?;
        let mut bvh = DynamicBvh::with_search(config.sibling_search);
        bvh.set_rotations_enabled(config.enable_rotations);
        Ok(Self {
            config,
            objects: SlotMap::with_key(),
            bvh,
            last_stats: CullStats::default(),
        })
    }

    pub fn config(&self) -> &CullingConfig {
        &self.config
    }

    pub fn bvh(&self) -> &DynamicBvh<CullObjectKey> {
        &self.bvh
    }

    // ===== OBJECTS =====

    /// Register an object and return its key.
    pub fn insert(&mut self, desc: CullObjectDesc) -> Result<CullObjectKey> {
        if !desc.local_bounds.is_valid() {
            return Err(engine_err!(LOG_SOURCE, InvalidOperation,
                "Cannot insert object with invalid bounds {:?}", desc.local_bounds));
        }
        let world_bounds = desc.local_bounds.transformed(&desc.world_matrix);
        if !world_bounds.is_valid() {
            return Err(engine_err!(LOG_SOURCE, InvalidOperation,
                "World matrix maps {:?} to invalid bounds", desc.local_bounds));
        }

        let bvh = &mut self.bvh;
        let key = self.objects.insert_with_key(|key| CullObject {
            desc,
            world_bounds,
            leaf: bvh.insert(world_bounds, key),
        });
        Ok(key)
    }

    /// Unregister an object and return its description.
    pub fn remove(&mut self, key: CullObjectKey) -> Result<CullObjectDesc> {
        let leaf = self.objects.get(key)
            .ok_or_else(|| engine_err!(LOG_SOURCE, InvalidHandle, "Cannot remove {:?}: unknown object", key))?
            .leaf;
        self.bvh.remove(leaf)?;
        self.objects.remove(key)
            .map(|object| object.desc)
            .ok_or_else(|| engine_err!(LOG_SOURCE, InvalidHandle, "Object {:?} vanished during removal", key))
    }

    /// Move an object. Its leaf is re-inserted; the key stays valid.
    pub fn set_world_matrix(&mut self, key: CullObjectKey, matrix: Mat4) -> Result<()> {
        let object = self.objects.get_mut(key)
            .ok_or_else(|| engine_err!(LOG_SOURCE, InvalidHandle, "Cannot move {:?}: unknown object", key))?;
        let world_bounds = object.desc.local_bounds.transformed(&matrix);
        if !world_bounds.is_valid() {
            return Err(engine_err!(LOG_SOURCE, InvalidOperation,
                "World matrix maps {:?} of {:?} to invalid bounds", object.desc.local_bounds, key));
        }
        object.desc.world_matrix = matrix;
        object.world_bounds = world_bounds;
        let leaf = object.leaf;
        self.bvh.reinsert(leaf, world_bounds)
    }

    pub fn set_flags(&mut self, key: CullObjectKey, flags: CullFlags) -> Result<()> {
        let object = self.objects.get_mut(key)
            .ok_or_else(|| engine_err!(LOG_SOURCE, InvalidHandle, "Cannot set flags of {:?}: unknown object", key))?;
        object.desc.flags = flags;
        Ok(())
    }

    pub fn object(&self, key: CullObjectKey) -> Option<&CullObject> {
        self.objects.get(key)
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn object_keys(&self) -> impl Iterator<Item = CullObjectKey> + '_ {
        self.objects.keys()
    }

    /// Remove every object.
    pub fn clear(&mut self) {
        self.objects.clear();
        self.bvh.clear();
        self.last_stats = CullStats::default();
    }

    // ===== FRAME PASSES =====

    /// Frustum planes of `camera`, plus the fog planes when `fog` is set.
    pub fn frame_planes(&self, camera: &Camera, frustum: &Frustum, fog: Option<&FogVolume>) -> PlaneSet {
        let mut planes = frustum.to_plane_set();
        if let Some(fog) = fog {
            let fog_planes = fog.cull_planes(camera.position(), camera.forward(), self.config.fog_max_optical_depth);
            planes.extend_from(&fog_planes);
        }
        planes
    }

    /// Reset the visibility flags and mark the tree against `planes`.
    pub fn mark(&mut self, planes: &PlaneSet) -> Result<MarkStats> {
        self.bvh.clear_back_copy();
        self.bvh.mark_visibility(|aabb| planes.classify_aabb(aabb))
    }

    /// Frustum and fog pass for this frame.
    pub fn update(&mut self, camera: &Camera, fog: Option<&FogVolume>) -> Result<MarkStats> {
        let frustum = Frustum::from_camera(camera);
        let planes = self.frame_planes(camera, &frustum, fog);
        self.mark(&planes)
    }

    /// Objects left visible by the last marking pass.
    pub fn extract_visible(&self) -> Result<Vec<CullObjectKey>> {
        let mut visible = Vec::with_capacity(self.bvh.leaf_count());
        self.bvh.extract_entity(&mut visible)?;
        Ok(visible)
    }

    /// Remove from `candidates` the objects hidden behind `OCCLUDER`
    /// objects. Keys no longer registered are dropped.
    pub fn occlude_by_occluder(
        &self,
        camera: &Camera,
        frustum: &Frustum,
        candidates: &[CullObjectKey],
    ) -> (Vec<CullObjectKey>, OccluderPassStats) {
        let boxes: Vec<OccluderCandidate<CullObjectKey>> = candidates
            .iter()
            .filter_map(|&key| {
                self.objects.get(key).map(|object| OccluderCandidate {
                    key,
                    bounds: object.oriented_bounds(),
                    is_occluder: object.flags().contains(CullFlags::OCCLUDER),
                })
            })
            .collect();
        OccluderPass::from_config(&self.config).run(camera.position(), frustum, &boxes)
    }

    /// Remove from `candidates` the objects `hzb` reports occluded.
    pub fn occlude_by_hzb(&self, hzb: &HzbOcclusion, candidates: &[CullObjectKey]) -> Vec<CullObjectKey> {
        candidates
            .iter()
            .copied()
            .filter(|&key| {
                self.objects
                    .get(key)
                    .is_some_and(|object| !hzb.is_occluded(&object.world_bounds))
            })
            .collect()
    }

    /// Objects flagged `HZB_OCCLUDER`, as drawn into the depth target.
    pub fn hzb_occluders(&self) -> Vec<DepthOccluder> {
        self.objects
            .values()
            .filter(|object| object.flags().contains(CullFlags::HZB_OCCLUDER))
            .map(|object| DepthOccluder {
                world_matrix: object.desc.world_matrix,
                local_bounds: object.desc.local_bounds,
            })
            .collect()
    }

    /// Run every enabled pass and return the visible objects.
    ///
    /// If the frustum pass fails (corrupt tree), every object is returned.
    /// If the depth target cannot be rendered, the HZB pass is skipped.
    pub fn cull_frame(
        &mut self,
        camera: &Camera,
        fog: Option<&FogVolume>,
        hzb: Option<(&mut HzbOcclusion, &mut dyn DepthRasterizer)>,
    ) -> Vec<CullObjectKey> {
        let total = self.objects.len();
        let frustum = Frustum::from_camera(camera);
        let planes = self.frame_planes(camera, &frustum, fog);

        let (frustum_marks, mut visible) = match self.mark(&planes).and_then(|marks| {
            self.extract_visible().map(|visible| (marks, visible))
        }) {
            Ok(result) => result,
            Err(e) => {
                engine_error!(LOG_SOURCE, "Frustum pass aborted ({}), keeping all {} objects", e, total);
                self.last_stats = CullStats {
                    total_objects: total,
                    after_frustum: total,
                    after_occluders: total,
                    after_hzb: total,
                    ..Default::default()
                };
                return self.objects.keys().collect();
            }
        };

        let mut stats = CullStats {
            total_objects: total,
            after_frustum: visible.len(),
            frustum_marks,
            ..Default::default()
        };

        if self.config.occluder_pass && !visible.is_empty() {
            let (kept, pass_stats) = self.occlude_by_occluder(camera, &frustum, &visible);
            visible = kept;
            stats.occluders_used = pass_stats.occluders_used;
        }
        stats.after_occluders = visible.len();

        if let Some((buffer, rasterizer)) = hzb {
            if self.config.hzb.enabled && !visible.is_empty() {
                let occluders = self.hzb_occluders();
                match buffer.rebuild(rasterizer, &occluders, camera) {
                    Ok(()) => visible = self.occlude_by_hzb(buffer, &visible),
                    Err(e) => engine_warn!(LOG_SOURCE, "HZB pass skipped: {}", e),
                }
            }
        }
        stats.after_hzb = visible.len();

        engine_trace!(LOG_SOURCE,
            "{} objects: {} after frustum ({} nodes visited), {} after occluders ({} used), {} after HZB",
            stats.total_objects, stats.after_frustum, stats.frustum_marks.visited,
            stats.after_occluders, stats.occluders_used, stats.after_hzb);
        self.last_stats = stats;
        visible
    }

    /// Statistics of the last `cull_frame()`
    pub fn last_stats(&self) -> &CullStats {
        &self.last_stats
    }

    // ===== DIAGNOSTICS =====

    pub fn balance_report(&self) -> BalanceReport {
        let report = self.bvh.balance_report();
        engine_debug!(LOG_SOURCE, "{}", report);
        report
    }

    pub fn dump_leaves(&self) -> String {
        self.bvh.dump_leaves()
    }

    /// Apply SAH-lowering rotations over the whole tree.
    ///
    /// Resets visibility flags of rotated nodes: call between frames, not
    /// between a marking pass and its extraction.
    pub fn optimize_rotations(&mut self) -> usize {
        self.bvh.optimize_rotations()
    }

    /// Check the BVH invariants.
    pub fn validate(&self) -> Result<()> {
        self.bvh.validate()
    }
}

#[cfg(test)]
#[path = "culling_system_tests.rs"]
mod tests;
