//! Tree snapshot model
//!
//! An immutable snapshot of one tree: its identity plus every node record,
//! in the caller's stored order. The analysis core reads it, never writes it;
//! the caller owns persistence and any mutation between calls.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::node::TreeNode;

/// A tree identity plus its ordered node records
///
/// Node order matters: child enumeration, tie-breaking at decision nodes,
/// and root selection all follow stored order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeSnapshot {
    /// Tree identity shared by all nodes
    pub tree_id: Uuid,

    /// Node records in stored order
    pub nodes: Vec<TreeNode>,
}

impl TreeSnapshot {
    /// Create a snapshot from a node list
    pub fn new(tree_id: Uuid, nodes: Vec<TreeNode>) -> Self {
        TreeSnapshot { tree_id, nodes }
    }

    /// Number of nodes in the snapshot
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Iterate roots (nodes without a parent) in stored order
    pub fn roots(&self) -> impl Iterator<Item = &TreeNode> {
        self.nodes.iter().filter(|node| node.is_root())
    }
}
