//! Dynamic bounding volume hierarchy.
//!
//! Leaves carry a copyable payload (typically an object key). Internal
//! nodes always have exactly two children. Per-frame visibility is kept
//! in the nodes themselves as two "child visible" flags, so culling a
//! subtree never changes the tree structure.

mod aabb;
mod node;
mod tree;
mod rotation;
mod diagnostics;

pub use aabb::AABB;
pub use node::{Node, NodeKey};
pub use tree::{DynamicBvh, MarkStats};
pub use diagnostics::BalanceReport;
