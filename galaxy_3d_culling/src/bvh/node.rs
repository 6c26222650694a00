/// BVH node storage.

use slotmap::new_key_type;
use super::AABB;

new_key_type! {
    /// Stable key of a BVH node (leaf or internal)
    pub struct NodeKey;
}

/// A BVH node.
///
/// Leaves have a payload and no children. Internal nodes have two
/// children and no payload. `left_visible` / `right_visible` tell whether
/// the traversal may follow `child1` / `child2` this frame; on the root
/// they tell whether the root itself is visible.
#[derive(Debug, Clone)]
pub struct Node<P> {
    pub(crate) aabb: AABB,
    pub(crate) parent: Option<NodeKey>,
    pub(crate) child1: Option<NodeKey>,
    pub(crate) child2: Option<NodeKey>,
    pub(crate) payload: Option<P>,
    pub(crate) left_visible: bool,
    pub(crate) right_visible: bool,
    /// Scratch value of the branch-and-bound sibling search
    pub(crate) inherited_cost: f32,
}

impl<P> Node<P> {
    pub(crate) fn leaf(aabb: AABB, payload: P) -> Self {
        Self {
            aabb,
            parent: None,
            child1: None,
            child2: None,
            payload: Some(payload),
            left_visible: true,
            right_visible: true,
            inherited_cost: 0.0,
        }
    }

    pub(crate) fn internal(aabb: AABB, parent: Option<NodeKey>, child1: NodeKey, child2: NodeKey) -> Self {
        Self {
            aabb,
            parent,
            child1: Some(child1),
            child2: Some(child2),
            payload: None,
            left_visible: true,
            right_visible: true,
            inherited_cost: 0.0,
        }
    }

    pub fn aabb(&self) -> &AABB {
        &self.aabb
    }

    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    pub fn child1(&self) -> Option<NodeKey> {
        self.child1
    }

    pub fn child2(&self) -> Option<NodeKey> {
        self.child2
    }

    /// Both children of an internal node, `None` for a leaf.
    pub fn children(&self) -> Option<(NodeKey, NodeKey)> {
        self.child1.zip(self.child2)
    }

    pub fn payload(&self) -> Option<&P> {
        self.payload.as_ref()
    }

    pub fn is_leaf(&self) -> bool {
        self.child1.is_none()
    }

    pub fn left_visible(&self) -> bool {
        self.left_visible
    }

    pub fn right_visible(&self) -> bool {
        self.right_visible
    }
}
