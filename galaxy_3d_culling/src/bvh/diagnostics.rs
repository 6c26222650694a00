/// Tree quality diagnostics: balance report and leaf dump.

use std::fmt;
use std::fmt::Write as _;
use rustc_hash::FxHashMap;
use super::{DynamicBvh, NodeKey};

/// Shape statistics of a BVH.
///
/// Ratios are `smaller / larger` between the two children of each
/// internal node, so 1.0 is perfectly balanced and values near 0 are
/// lopsided.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BalanceReport {
    pub leaf_count: usize,
    pub node_count: usize,
    pub min_leaf_depth: usize,
    pub max_leaf_depth: usize,
    pub mean_leaf_depth: f32,
    /// Lowest child leaf-count ratio over all internal nodes
    pub worst_child_count_ratio: f32,
    pub mean_child_count_ratio: f32,
    /// Lowest child area ratio over all internal nodes
    pub worst_sibling_area_ratio: f32,
    pub mean_sibling_area_ratio: f32,
    /// Sum of internal node areas
    pub sah_cost: f32,
}

impl fmt::Display for BalanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "BVH: {} leaves, {} nodes", self.leaf_count, self.node_count)?;
        writeln!(
            f,
            "  leaf depth: min {} / max {} / mean {:.2}",
            self.min_leaf_depth, self.max_leaf_depth, self.mean_leaf_depth
        )?;
        writeln!(
            f,
            "  child count ratio: worst {:.3} / mean {:.3}",
            self.worst_child_count_ratio, self.mean_child_count_ratio
        )?;
        writeln!(
            f,
            "  sibling area ratio: worst {:.3} / mean {:.3}",
            self.worst_sibling_area_ratio, self.mean_sibling_area_ratio
        )?;
        write!(f, "  SAH cost: {:.3}", self.sah_cost)
    }
}

fn ratio(a: f32, b: f32) -> f32 {
    let (lo, hi) = if a < b { (a, b) } else { (b, a) };
    if hi > 0.0 { lo / hi } else { 1.0 }
}

impl<P: Copy> DynamicBvh<P> {
    /// Compute the balance report. All fields are zero for an empty tree.
    pub fn balance_report(&self) -> BalanceReport {
        let Some(root) = self.root() else {
            return BalanceReport::default();
        };
        let nodes = self.nodes();

        // Depth of every reachable node, parents first
        let order = self.preorder();
        let mut depth: FxHashMap<NodeKey, usize> = FxHashMap::default();
        depth.insert(root, 0);
        for &key in &order {
            let d = depth.get(&key).copied().unwrap_or(0);
            if let Some((c1, c2)) = nodes[key].children() {
                depth.insert(c1, d + 1);
                depth.insert(c2, d + 1);
            }
        }

        // Leaf count of every subtree, children first
        let mut leaves_below: FxHashMap<NodeKey, usize> = FxHashMap::default();
        let mut report = BalanceReport {
            min_leaf_depth: usize::MAX,
            worst_child_count_ratio: 1.0,
            worst_sibling_area_ratio: 1.0,
            ..Default::default()
        };
        let mut depth_sum = 0usize;
        let mut internal = 0usize;

        for &key in order.iter().rev() {
            let node = &nodes[key];
            report.node_count += 1;
            match node.children() {
                None => {
                    let d = depth.get(&key).copied().unwrap_or(0);
                    report.leaf_count += 1;
                    report.min_leaf_depth = report.min_leaf_depth.min(d);
                    report.max_leaf_depth = report.max_leaf_depth.max(d);
                    depth_sum += d;
                    leaves_below.insert(key, 1);
                }
                Some((c1, c2)) => {
                    let n1 = leaves_below.get(&c1).copied().unwrap_or(0);
                    let n2 = leaves_below.get(&c2).copied().unwrap_or(0);
                    leaves_below.insert(key, n1 + n2);

                    let count_ratio = ratio(n1 as f32, n2 as f32);
                    let area_ratio = ratio(nodes[c1].aabb.area(), nodes[c2].aabb.area());
                    report.worst_child_count_ratio = report.worst_child_count_ratio.min(count_ratio);
                    report.worst_sibling_area_ratio = report.worst_sibling_area_ratio.min(area_ratio);
                    report.mean_child_count_ratio += count_ratio;
                    report.mean_sibling_area_ratio += area_ratio;
                    report.sah_cost += node.aabb.area();
                    internal += 1;
                }
            }
        }

        if report.leaf_count > 0 {
            report.mean_leaf_depth = depth_sum as f32 / report.leaf_count as f32;
        } else {
            report.min_leaf_depth = 0;
        }
        if internal > 0 {
            report.mean_child_count_ratio /= internal as f32;
            report.mean_sibling_area_ratio /= internal as f32;
        } else {
            report.mean_child_count_ratio = 1.0;
            report.mean_sibling_area_ratio = 1.0;
        }
        report
    }

    /// One line per leaf in depth-first order, indented by depth:
    /// `depth=D min=(x, y, z) max=(x, y, z)`.
    pub fn dump_leaves(&self) -> String {
        let mut out = String::new();
        let mut stack: Vec<(NodeKey, usize)> = self.root().into_iter().map(|r| (r, 0)).collect();
        let nodes = self.nodes();

        while let Some((key, d)) = stack.pop() {
            let Some(node) = nodes.get(key) else {
                continue;
            };
            match node.children() {
                Some((c1, c2)) => {
                    stack.push((c2, d + 1));
                    stack.push((c1, d + 1));
                }
                None => {
                    let (min, max) = (node.aabb.min, node.aabb.max);
                    let _ = writeln!(
                        out,
                        "{:indent$}depth={} min=({}, {}, {}) max=({}, {}, {})",
                        "", d, min.x, min.y, min.z, max.x, max.y, max.z,
                        indent = d * 2
                    );
                }
            }
        }
        out
    }
}

#[cfg(test)]
#[path = "diagnostics_tests.rs"]
mod tests;
