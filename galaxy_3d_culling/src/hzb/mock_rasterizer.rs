/// Mock depth rasterizer for testing without GPU.
///
/// Ray casts every pixel center against the occluder boxes on the CPU
/// and stores the nearest hit depth. Slow, exact, and only meant for
/// small targets.

use glam::{Mat4, Vec3, Vec4};
use crate::error::Result;
use crate::occluder::OrientedBox;
use super::{DepthOccluder, DepthRasterizer, DepthTarget};

/// CPU depth rasterizer.
#[derive(Debug, Default)]
pub struct MockDepthRasterizer {
    /// Number of `render_depth` calls
    pub render_count: usize,
    /// Fail the next call with `BackendError`
    pub fail_next: bool,
}

impl MockDepthRasterizer {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Entry parameter of the segment `origin + t * dir`, t in [0, 1],
/// into the box, or `None` if it misses.
fn segment_entry(obb: &OrientedBox, origin: Vec3, dir: Vec3) -> Option<f32> {
    let local_origin = obb.to_local(origin);
    let local_dir = Vec3::new(dir.dot(obb.axes[0]), dir.dot(obb.axes[1]), dir.dot(obb.axes[2]));
    let (mut t0, mut t1) = (0.0f32, 1.0f32);

    for i in 0..3 {
        let h = obb.half_size[i];
        if local_dir[i].abs() < 1e-12 {
            if local_origin[i].abs() > h {
                return None;
            }
            continue;
        }
        let a = (-h - local_origin[i]) / local_dir[i];
        let b = (h - local_origin[i]) / local_dir[i];
        t0 = t0.max(a.min(b));
        t1 = t1.min(a.max(b));
        if t0 > t1 {
            return None;
        }
    }
    Some(t0)
}

fn unproject(inverse: &Mat4, x: f32, y: f32, z: f32) -> Vec3 {
    let p = *inverse * Vec4::new(x, y, z, 1.0);
    p.truncate() / p.w
}

impl DepthRasterizer for MockDepthRasterizer {
    fn render_depth(
        &mut self,
        occluders: &[DepthOccluder],
        view: &Mat4,
        projection: &Mat4,
        width: u32,
        height: u32,
    ) -> Result<DepthTarget> {
        self.render_count += 1;
        if self.fail_next {
            self.fail_next = false;
            return Err(crate::engine_err!("galaxy3d::MockDepthRasterizer", BackendError,
                "Simulated depth render failure"));
        }

        let view_projection = *projection * *view;
        let inverse = view_projection.inverse();
        let boxes: Vec<OrientedBox> = occluders
            .iter()
            .filter_map(|o| OrientedBox::from_matrix(&o.world_matrix, &o.local_bounds))
            .collect();

        let mut target = DepthTarget::new(width, height);
        for py in 0..height {
            for px in 0..width {
                let x = (px as f32 + 0.5) / width as f32 * 2.0 - 1.0;
                let y = 1.0 - (py as f32 + 0.5) / height as f32 * 2.0;
                let near = unproject(&inverse, x, y, 0.0);
                let far = unproject(&inverse, x, y, 1.0);
                let dir = far - near;

                let mut depth = 1.0f32;
                for obb in &boxes {
                    if let Some(t) = segment_entry(obb, near, dir) {
                        let hit = near + dir * t;
                        let clip = view_projection * hit.extend(1.0);
                        depth = depth.min((clip.z / clip.w).clamp(0.0, 1.0));
                    }
                }
                target.set(px, py, depth);
            }
        }
        Ok(target)
    }
}

#[cfg(test)]
#[path = "mock_rasterizer_tests.rs"]
mod tests;
