/// Tree rotations that lower the SAH cost without touching the leaves.
///
/// For a node A with children B and C, a rotation swaps B with a child
/// of C (or C with a child of B). Only the area of the rotated child
/// changes, so a rotation is kept only when it shrinks that child.

use super::{DynamicBvh, NodeKey};
use crate::engine_debug;

#[derive(Debug, Clone, Copy)]
struct Rotation {
    /// Child of A that moves down
    lowered: NodeKey,
    /// Child of A that receives `lowered`
    pivot: NodeKey,
    /// Grandchild (child of `pivot`) that moves up
    raised: NodeKey,
    /// New area of `pivot`
    area: f32,
}

impl<P: Copy> DynamicBvh<P> {
    /// Try the four child/grandchild swaps at `key` and apply the best
    /// one if it strictly reduces the cost. Returns `true` if rotated.
    pub(crate) fn rotate(&mut self, key: NodeKey) -> bool {
        let nodes = self.nodes();
        let Some((b, c)) = nodes.get(key).and_then(|n| n.children()) else {
            return false;
        };

        let mut best: Option<Rotation> = None;
        let mut consider = |lowered: NodeKey, pivot: NodeKey| {
            let Some((g1, g2)) = nodes[pivot].children() else {
                return;
            };
            let current = nodes[pivot].aabb.area();
            let lowered_aabb = nodes[lowered].aabb;
            // Swapping `lowered` with g1 leaves pivot = lowered ∪ g2, and vice versa
            for (raised, kept) in [(g1, g2), (g2, g1)] {
                let area = lowered_aabb.union(&nodes[kept].aabb).area();
                let improves = area < current && best.map_or(true, |r| area < r.area);
                if improves {
                    best = Some(Rotation { lowered, pivot, raised, area });
                }
            }
        };
        consider(b, c);
        consider(c, b);

        let Some(rotation) = best else {
            return false;
        };
        self.apply_rotation(key, rotation);
        true
    }

    fn apply_rotation(&mut self, key: NodeKey, rotation: Rotation) {
        let Rotation { lowered, pivot, raised, .. } = rotation;

        self.replace_child(key, lowered, raised);
        self.replace_child(pivot, raised, lowered);

        let nodes = self.nodes_mut();
        nodes[raised].parent = Some(key);
        nodes[lowered].parent = Some(pivot);

        if let Some((c1, c2)) = nodes[pivot].children() {
            let merged = nodes[c1].aabb.union(&nodes[c2].aabb);
            nodes[pivot].aabb = merged;
        }
        for touched in [key, pivot] {
            nodes[touched].left_visible = true;
            nodes[touched].right_visible = true;
        }
    }

    /// Run rotations over the whole tree, children before parents.
    /// Returns the number of rotations applied.
    pub fn optimize_rotations(&mut self) -> usize {
        let order = self.preorder();
        let mut applied = 0;
        for &key in order.iter().rev() {
            if self.rotate(key) {
                applied += 1;
            }
        }
        if applied > 0 {
            engine_debug!("galaxy3d::Bvh", "Applied {} rotations, SAH cost {:.3}", applied, self.sah_cost());
        }
        applied
    }
}

#[cfg(test)]
#[path = "rotation_tests.rs"]
mod tests;
