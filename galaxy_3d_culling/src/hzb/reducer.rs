/// Pyramid reducers: build level i+1 from level i.
///
/// Both reducers share the same per-row kernel, so their output is
/// bit-identical. A GPU backend implements the same trait with one
/// compute dispatch per level and a barrier before the next level reads.

use rayon::prelude::*;
use super::DepthLevel;

/// Max-reduction of one pyramid level into the next.
///
/// `dst` is already sized `max(1, w / 2)` x `max(1, h / 2)`.
pub trait PyramidReducer: Send + Sync {
    fn reduce(&self, src: &DepthLevel, dst: &mut DepthLevel);

    fn name(&self) -> &str;
}

/// Source range `[start, end)` covered by output index `i`.
/// The last output column/row also takes the leftover odd source column/row.
#[inline]
pub(crate) fn footprint(i: u32, src_len: u32, dst_len: u32) -> (u32, u32) {
    let start = (2 * i).min(src_len.saturating_sub(1));
    let end = if i + 1 == dst_len { src_len } else { (2 * i + 2).min(src_len) };
    (start, end)
}

/// Reduce output row `y` of a `dst_width` x `dst_height` level into `out`.
fn reduce_row(src: &DepthLevel, dst_width: u32, dst_height: u32, y: u32, out: &mut [f32]) {
    let (y0, y1) = footprint(y, src.height, dst_height);
    let stride = src.width as usize;

    for (x, texel) in (0..dst_width).zip(out.iter_mut()) {
        let (x0, x1) = footprint(x, src.width, dst_width);
        let mut farthest = f32::MIN;
        for sy in y0..y1 {
            let row = &src.data[sy as usize * stride..(sy as usize + 1) * stride];
            for &depth in &row[x0 as usize..x1 as usize] {
                farthest = farthest.max(depth);
            }
        }
        *texel = farthest;
    }
}

/// Single-threaded reference reducer.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialReducer;

impl PyramidReducer for SerialReducer {
    fn reduce(&self, src: &DepthLevel, dst: &mut DepthLevel) {
        let (width, height) = (dst.width, dst.height);
        for (y, row) in dst.data.chunks_mut(width as usize).enumerate() {
            reduce_row(src, width, height, y as u32, row);
        }
    }

    fn name(&self) -> &str {
        "serial"
    }
}

/// Reducer running disjoint row ranges on the rayon thread pool.
///
/// Each task owns `rows_per_task` output rows and only reads the source
/// level; `reduce` returns once every task has finished.
#[derive(Debug, Clone, Copy)]
pub struct ParallelReducer {
    rows_per_task: usize,
}

impl ParallelReducer {
    pub fn new(rows_per_task: usize) -> Self {
        Self { rows_per_task: rows_per_task.max(1) }
    }

    pub fn rows_per_task(&self) -> usize {
        self.rows_per_task
    }
}

impl Default for ParallelReducer {
    fn default() -> Self {
        Self::new(8)
    }
}

impl PyramidReducer for ParallelReducer {
    fn reduce(&self, src: &DepthLevel, dst: &mut DepthLevel) {
        let (width, height) = (dst.width, dst.height);
        let rows_per_task = self.rows_per_task;
        dst.data
            .par_chunks_mut(width as usize * rows_per_task)
            .enumerate()
            .for_each(|(task, rows)| {
                for (r, row) in rows.chunks_mut(width as usize).enumerate() {
                    let y = (task * rows_per_task + r) as u32;
                    reduce_row(src, width, height, y, row);
                }
            });
    }

    fn name(&self) -> &str {
        "parallel"
    }
}

#[cfg(test)]
#[path = "reducer_tests.rs"]
mod tests;
