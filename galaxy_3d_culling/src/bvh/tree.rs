/// Dynamic BVH: SAH insertion, removal, refit and visibility marking.
///
/// Nodes live in a slotmap arena. Leaf keys stay valid until the leaf is
/// removed, including across `reinsert()`.

use std::collections::VecDeque;
use slotmap::SlotMap;
use crate::config::SiblingSearch;
use crate::culling::FrustumTest;
use crate::error::Result;
use crate::{engine_err, engine_trace};
use super::{AABB, Node, NodeKey};

const LOG_SOURCE: &str = "galaxy3d::Bvh";

/// Counters of one `mark_visibility()` pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarkStats {
    /// Nodes classified
    pub visited: usize,
    /// Subtrees unlinked (classified `Outside`)
    pub culled: usize,
    /// Subtrees accepted without descending (classified `Inside`)
    pub accepted: usize,
}

/// Dynamic bounding volume hierarchy over leaves of payload `P`.
pub struct DynamicBvh<P: Copy> {
    nodes: SlotMap<NodeKey, Node<P>>,
    root: Option<NodeKey>,
    leaf_count: usize,
    sibling_search: SiblingSearch,
    rotations: bool,
}

impl<P: Copy> Default for DynamicBvh<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Copy> DynamicBvh<P> {
    /// Empty tree using branch-and-bound sibling search, no rotations.
    pub fn new() -> Self {
        Self::with_search(SiblingSearch::default())
    }

    pub fn with_search(sibling_search: SiblingSearch) -> Self {
        Self {
            nodes: SlotMap::with_key(),
            root: None,
            leaf_count: 0,
            sibling_search,
            rotations: false,
        }
    }

    // ===== ACCESSORS =====

    pub fn root(&self) -> Option<NodeKey> {
        self.root
    }

    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    /// Total number of nodes (leaves + internal)
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn node(&self, key: NodeKey) -> Option<&Node<P>> {
        self.nodes.get(key)
    }

    /// Root bounds, `None` for an empty tree.
    pub fn bounds(&self) -> Option<AABB> {
        self.root.and_then(|r| self.nodes.get(r)).map(|n| n.aabb)
    }

    pub fn sibling_search(&self) -> SiblingSearch {
        self.sibling_search
    }

    pub fn set_sibling_search(&mut self, sibling_search: SiblingSearch) {
        self.sibling_search = sibling_search;
    }

    pub fn rotations_enabled(&self) -> bool {
        self.rotations
    }

    /// Apply SAH-lowering rotations along the refit path of each insertion.
    pub fn set_rotations_enabled(&mut self, enabled: bool) {
        self.rotations = enabled;
    }

    /// Every leaf as (key, payload, bounds), ignoring visibility flags.
    pub fn leaves(&self) -> Vec<(NodeKey, P, AABB)> {
        self.nodes
            .iter()
            .filter_map(|(key, node)| node.payload.map(|p| (key, p, node.aabb)))
            .collect()
    }

    /// Sum of the areas of all internal nodes.
    pub fn sah_cost(&self) -> f32 {
        self.nodes
            .values()
            .filter(|n| !n.is_leaf())
            .map(|n| n.aabb.area())
            .sum()
    }

    // ===== INSERTION / REMOVAL =====

    /// Insert a new leaf and return its key.
    pub fn insert(&mut self, aabb: AABB, payload: P) -> NodeKey {
        let leaf = self.nodes.insert(Node::leaf(aabb, payload));
        self.leaf_count += 1;
        self.link_leaf(leaf);
        engine_trace!(LOG_SOURCE, "Inserted leaf {:?} ({} leaves)", leaf, self.leaf_count);
        leaf
    }

    /// Remove a leaf and return its payload.
    ///
    /// The sibling of the removed leaf takes the place of their parent.
    /// Ancestors are not refit: their bounds stay valid, only looser.
    pub fn remove(&mut self, leaf: NodeKey) -> Result<P> {
        self.check_leaf(leaf, "remove")?;

        self.detach_leaf(leaf);
        let node = self.nodes.remove(leaf)
            .ok_or_else(|| engine_err!(LOG_SOURCE, InvalidHandle, "Leaf {:?} vanished during removal", leaf))?;
        self.leaf_count -= 1;

        engine_trace!(LOG_SOURCE, "Removed leaf {:?} ({} leaves)", leaf, self.leaf_count);
        node.payload
            .ok_or_else(|| engine_err!(LOG_SOURCE, CorruptTree, "Leaf {:?} had no payload", leaf))
    }

    /// Move a leaf to new bounds. The leaf keeps its key and payload.
    pub fn reinsert(&mut self, leaf: NodeKey, aabb: AABB) -> Result<()> {
        self.check_leaf(leaf, "reinsert")?;

        if let Some(refit_from) = self.detach_leaf(leaf) {
            self.refit_path(refit_from);
        }
        let node = &mut self.nodes[leaf];
        node.aabb = aabb;
        node.left_visible = true;
        node.right_visible = true;
        self.link_leaf(leaf);
        Ok(())
    }

    /// Remove every node.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
        self.leaf_count = 0;
    }

    fn check_leaf(&self, key: NodeKey, operation: &str) -> Result<()> {
        let node = self.nodes.get(key)
            .ok_or_else(|| engine_err!(LOG_SOURCE, InvalidHandle, "Cannot {} {:?}: unknown node", operation, key))?;
        if !node.is_leaf() {
            return Err(engine_err!(LOG_SOURCE, InvalidOperation,
                "Cannot {} {:?}: node is internal", operation, key));
        }
        Ok(())
    }

    /// Splice `leaf` (already in the arena, unlinked) into the tree.
    fn link_leaf(&mut self, leaf: NodeKey) {
        let Some(root) = self.root else {
            self.nodes[leaf].parent = None;
            self.root = Some(leaf);
            return;
        };

        let aabb = self.nodes[leaf].aabb;
        let sibling = self.best_sibling(&aabb).map(|(key, _)| key).unwrap_or(root);

        let old_parent = self.nodes[sibling].parent;
        let merged = self.nodes[sibling].aabb.union(&aabb);
        let new_parent = self.nodes.insert(Node::internal(merged, old_parent, sibling, leaf));

        match old_parent {
            Some(parent) => self.replace_child(parent, sibling, new_parent),
            None => self.root = Some(new_parent),
        }
        self.nodes[sibling].parent = Some(new_parent);
        self.nodes[leaf].parent = Some(new_parent);

        if let Some(parent) = old_parent {
            self.refit_path(parent);
            if self.rotations {
                let mut current = Some(parent);
                while let Some(key) = current {
                    self.rotate(key);
                    current = self.nodes[key].parent;
                }
            }
        }
    }

    /// Unlink `leaf` from the tree, promoting its sibling.
    /// Returns the node where the structure changed (the grandparent).
    fn detach_leaf(&mut self, leaf: NodeKey) -> Option<NodeKey> {
        let Some(parent) = self.nodes[leaf].parent else {
            self.root = None;
            return None;
        };

        let sibling = match self.nodes[parent].children() {
            Some((c1, c2)) if c1 == leaf => c2,
            Some((c1, _)) => c1,
            None => return None,
        };
        let grandparent = self.nodes[parent].parent;

        match grandparent {
            Some(g) => self.replace_child(g, parent, sibling),
            None => self.root = Some(sibling),
        }
        self.nodes[sibling].parent = grandparent;
        self.nodes.remove(parent);
        self.nodes[leaf].parent = None;
        grandparent
    }

    /// Replace `old` by `new` among the children of `parent`.
    pub(crate) fn replace_child(&mut self, parent: NodeKey, old: NodeKey, new: NodeKey) {
        let node = &mut self.nodes[parent];
        if node.child1 == Some(old) {
            node.child1 = Some(new);
        } else if node.child2 == Some(old) {
            node.child2 = Some(new);
        }
    }

    // ===== SIBLING SEARCH =====

    /// Best sibling for a leaf of bounds `aabb`, with its insertion cost,
    /// using the configured strategy.
    pub fn best_sibling(&mut self, aabb: &AABB) -> Option<(NodeKey, f32)> {
        match self.sibling_search {
            SiblingSearch::Global => self.find_best_sibling_global(aabb),
            SiblingSearch::BranchAndBound => self.find_best_sibling_branch_and_bound(aabb),
        }
    }

    /// Exhaustive search: evaluate the insertion cost at every node.
    ///
    /// cost(node) = area(node ∪ L) + Σ over ancestors (area(anc ∪ L) − area(anc))
    pub fn find_best_sibling_global(&self, aabb: &AABB) -> Option<(NodeKey, f32)> {
        let root = self.root?;
        let mut best = (root, f32::INFINITY);
        let mut stack = vec![(root, 0.0f32)];

        while let Some((key, inherited)) = stack.pop() {
            let node = &self.nodes[key];
            let direct = node.aabb.union(aabb).area();
            let cost = direct + inherited;
            if cost < best.1 {
                best = (key, cost);
            }
            if let Some((c1, c2)) = node.children() {
                let child_inherited = inherited + direct - node.aabb.area();
                stack.push((c2, child_inherited));
                stack.push((c1, child_inherited));
            }
        }
        Some(best)
    }

    /// Branch-and-bound search: a subtree is skipped when
    /// `area(L) + inherited cost` already reaches the best cost found.
    pub fn find_best_sibling_branch_and_bound(&mut self, aabb: &AABB) -> Option<(NodeKey, f32)> {
        let root = self.root?;
        let leaf_area = aabb.area();
        self.nodes[root].inherited_cost = 0.0;

        let mut best = (root, f32::INFINITY);
        let mut stack = vec![root];

        while let Some(key) = stack.pop() {
            let node = &self.nodes[key];
            let direct = node.aabb.union(aabb).area();
            let inherited = node.inherited_cost;
            let cost = direct + inherited;
            if cost < best.1 {
                best = (key, cost);
            }

            if let Some((c1, c2)) = node.children() {
                let child_inherited = inherited + direct - node.aabb.area();
                if leaf_area + child_inherited < best.1 {
                    self.nodes[c1].inherited_cost = child_inherited;
                    self.nodes[c2].inherited_cost = child_inherited;
                    stack.push(c2);
                    stack.push(c1);
                }
            }
        }
        Some(best)
    }

    /// Insertion cost of choosing `sibling` for a leaf of bounds `aabb`,
    /// computed by walking up from `sibling`.
    pub fn insertion_cost(&self, sibling: NodeKey, aabb: &AABB) -> Option<f32> {
        let node = self.nodes.get(sibling)?;
        let mut cost = node.aabb.union(aabb).area();
        let mut current = node.parent;
        while let Some(key) = current {
            let ancestor = self.nodes.get(key)?;
            cost += ancestor.aabb.union(aabb).area() - ancestor.aabb.area();
            current = ancestor.parent;
        }
        Some(cost)
    }

    // ===== REFIT =====

    /// Recompute bounds from `start` up to the root.
    pub fn refit_ancestors(&mut self, start: NodeKey) -> Result<()> {
        if !self.nodes.contains_key(start) {
            return Err(engine_err!(LOG_SOURCE, InvalidHandle, "Cannot refit from {:?}: unknown node", start));
        }
        self.refit_path(start);
        Ok(())
    }

    fn refit_path(&mut self, start: NodeKey) {
        let mut current = Some(start);
        while let Some(key) = current {
            if let Some((c1, c2)) = self.nodes[key].children() {
                let merged = self.nodes[c1].aabb.union(&self.nodes[c2].aabb);
                self.nodes[key].aabb = merged;
            }
            current = self.nodes[key].parent;
        }
    }

    /// Recompute the bounds of every internal node, bottom-up.
    pub fn refit_all(&mut self) {
        let order = self.preorder();
        for &key in order.iter().rev() {
            if let Some((c1, c2)) = self.nodes[key].children() {
                let merged = self.nodes[c1].aabb.union(&self.nodes[c2].aabb);
                self.nodes[key].aabb = merged;
            }
        }
    }

    /// Keys reachable from the root, parents before children.
    pub(crate) fn preorder(&self) -> Vec<NodeKey> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeKey> = self.root.into_iter().collect();
        while let Some(key) = stack.pop() {
            order.push(key);
            if let Some((c1, c2)) = self.nodes.get(key).and_then(|n| n.children()) {
                stack.push(c2);
                stack.push(c1);
            }
        }
        order
    }

    // ===== VISIBILITY =====

    /// Mark every node visible (start of frame).
    pub fn clear_back_copy(&mut self) {
        for node in self.nodes.values_mut() {
            node.left_visible = true;
            node.right_visible = true;
        }
    }

    /// Hide the subtree rooted at `key` for this frame.
    ///
    /// Clears the parent's flag for this child; on the root, clears the
    /// root's own flags.
    pub fn unlink_back_copy(&mut self, key: NodeKey) -> Result<()> {
        let parent = self.nodes.get(key)
            .ok_or_else(|| engine_err!(LOG_SOURCE, InvalidHandle, "Cannot unlink {:?}: unknown node", key))?
            .parent;

        match parent {
            Some(parent_key) => {
                let parent = self.nodes.get_mut(parent_key)
                    .ok_or_else(|| engine_err!(LOG_SOURCE, CorruptTree,
                        "Parent {:?} of {:?} is missing", parent_key, key))?;
                if parent.child1 == Some(key) {
                    parent.left_visible = false;
                } else if parent.child2 == Some(key) {
                    parent.right_visible = false;
                } else {
                    return Err(engine_err!(LOG_SOURCE, CorruptTree,
                        "{:?} is not a child of its parent {:?}", key, parent_key));
                }
            }
            None => {
                let node = &mut self.nodes[key];
                node.left_visible = false;
                node.right_visible = false;
            }
        }
        Ok(())
    }

    /// Whether the root is still visible this frame.
    pub fn root_visible(&self) -> bool {
        self.root
            .and_then(|r| self.nodes.get(r))
            .map(|n| n.left_visible || n.right_visible)
            .unwrap_or(false)
    }

    /// Top-down marking pass.
    ///
    /// `classify` is called on node bounds. `Outside` unlinks the node,
    /// `Inside` accepts the whole subtree, `Partial` descends into the
    /// children that are still visible.
    pub fn mark_visibility<F>(&mut self, mut classify: F) -> Result<MarkStats>
    where
        F: FnMut(&AABB) -> FrustumTest,
    {
        let mut stats = MarkStats::default();
        let Some(root) = self.root else {
            return Ok(stats);
        };
        if !self.root_visible() {
            return Ok(stats);
        }

        let mut queue = VecDeque::from([root]);
        while let Some(key) = queue.pop_front() {
            let node = self.nodes.get(key)
                .ok_or_else(|| engine_err!(LOG_SOURCE, CorruptTree, "Dangling node {:?} during marking", key))?;
            let aabb = node.aabb;
            let children = node.children();
            let (left, right) = (node.left_visible, node.right_visible);
            stats.visited += 1;

            match classify(&aabb) {
                FrustumTest::Outside => {
                    self.unlink_back_copy(key)?;
                    stats.culled += 1;
                }
                FrustumTest::Inside => stats.accepted += 1,
                FrustumTest::Partial => {
                    if let Some((c1, c2)) = children {
                        if left {
                            queue.push_back(c1);
                        }
                        if right {
                            queue.push_back(c2);
                        }
                    }
                }
            }
        }
        Ok(stats)
    }

    /// Visit every visible leaf, following only visible edges.
    pub fn visit_visible_leaves<F>(&self, mut visit: F) -> Result<()>
    where
        F: FnMut(NodeKey, &Node<P>),
    {
        let Some(root) = self.root else {
            return Ok(());
        };
        if !self.root_visible() {
            return Ok(());
        }

        let mut stack = vec![root];
        while let Some(key) = stack.pop() {
            let node = self.nodes.get(key)
                .ok_or_else(|| engine_err!(LOG_SOURCE, CorruptTree, "Dangling node {:?} during extraction", key))?;
            if node.is_leaf() {
                visit(key, node);
                continue;
            }
            let (c1, c2) = node.children()
                .ok_or_else(|| engine_err!(LOG_SOURCE, CorruptTree, "Internal node {:?} has one child", key))?;
            if node.right_visible {
                stack.push(c2);
            }
            if node.left_visible {
                stack.push(c1);
            }
        }
        Ok(())
    }

    /// Append the payload of every visible leaf to `out`.
    pub fn extract_entity(&self, out: &mut Vec<P>) -> Result<()> {
        self.visit_visible_leaves(|_, node| {
            if let Some(payload) = node.payload {
                out.push(payload);
            }
        })
    }

    /// Append the bounds of every visible leaf to `out`.
    pub fn extract_aabb(&self, out: &mut Vec<AABB>) -> Result<()> {
        self.visit_visible_leaves(|_, node| out.push(node.aabb))
    }

    // ===== VALIDATION =====

    /// Check the structural invariants of the whole tree.
    ///
    /// Parent/child links agree, internal nodes have two children and no
    /// payload, every node's bounds contain its children's, and the leaf
    /// and node counts match what is reachable from the root.
    pub fn validate(&self) -> Result<()> {
        let Some(root) = self.root else {
            if self.nodes.is_empty() && self.leaf_count == 0 {
                return Ok(());
            }
            return Err(engine_err!(LOG_SOURCE, CorruptTree,
                "Empty tree still owns {} nodes / {} leaves", self.nodes.len(), self.leaf_count));
        };

        let root_node = self.nodes.get(root)
            .ok_or_else(|| engine_err!(LOG_SOURCE, CorruptTree, "Root {:?} is missing", root))?;
        if root_node.parent.is_some() {
            return Err(engine_err!(LOG_SOURCE, CorruptTree, "Root {:?} has a parent", root));
        }

        let mut reachable = 0usize;
        let mut leaves = 0usize;
        let mut stack = vec![root];
        while let Some(key) = stack.pop() {
            let node = self.nodes.get(key)
                .ok_or_else(|| engine_err!(LOG_SOURCE, CorruptTree, "Dangling node {:?}", key))?;
            reachable += 1;

            match (node.child1, node.child2) {
                (None, None) => {
                    if node.payload.is_none() {
                        return Err(engine_err!(LOG_SOURCE, CorruptTree, "Leaf {:?} has no payload", key));
                    }
                    leaves += 1;
                }
                (Some(c1), Some(c2)) => {
                    if node.payload.is_some() {
                        return Err(engine_err!(LOG_SOURCE, CorruptTree, "Internal node {:?} has a payload", key));
                    }
                    for child in [c1, c2] {
                        let child_node = self.nodes.get(child)
                            .ok_or_else(|| engine_err!(LOG_SOURCE, CorruptTree, "Child {:?} of {:?} is missing", child, key))?;
                        if child_node.parent != Some(key) {
                            return Err(engine_err!(LOG_SOURCE, CorruptTree,
                                "Child {:?} does not point back to {:?}", child, key));
                        }
                        if !node.aabb.contains(&child_node.aabb) {
                            return Err(engine_err!(LOG_SOURCE, CorruptTree,
                                "Bounds of {:?} do not contain child {:?}", key, child));
                        }
                        stack.push(child);
                    }
                }
                _ => {
                    return Err(engine_err!(LOG_SOURCE, CorruptTree, "Internal node {:?} has one child", key));
                }
            }
        }

        if leaves != self.leaf_count {
            return Err(engine_err!(LOG_SOURCE, CorruptTree,
                "Leaf count mismatch: {} reachable, {} recorded", leaves, self.leaf_count));
        }
        if reachable != self.nodes.len() {
            return Err(engine_err!(LOG_SOURCE, CorruptTree,
                "{} nodes allocated but {} reachable", self.nodes.len(), reachable));
        }
        Ok(())
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut SlotMap<NodeKey, Node<P>> {
        &mut self.nodes
    }

    pub(crate) fn nodes(&self) -> &SlotMap<NodeKey, Node<P>> {
        &self.nodes
    }
}

#[cfg(test)]
#[path = "tree_tests.rs"]
mod tests;
