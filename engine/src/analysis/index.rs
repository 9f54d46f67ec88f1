//! Per-call tree index
//!
//! Snapshots carry parent pointers only. Every analysis call derives a
//! children-by-parent index once, up front, instead of scanning the node list
//! per lookup. The index borrows the snapshot and is discarded on return, so
//! no state outlives the call.

use std::collections::HashMap;

use uuid::Uuid;

use crate::models::{NodeKind, TreeNode, TreeSnapshot};

/// How a chance node combines its children, derived from its parent
///
/// The same `chance` kind plays two roles in this model. The role is never
/// stored on the node; it is re-derived from the parent on every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChanceRole {
    /// Direct child of a decision node, or a root: an option the decider can
    /// pick. Carries no probability of its own; combines children by
    /// summation/weighting.
    Choice,

    /// Child of a non-decision node: a probabilistic outcome. Carries a
    /// probability consumed by its parent's weighting step.
    UncertainEvent,
}

/// Lookup structure over a borrowed snapshot
///
/// Child vectors preserve snapshot order, which downstream code relies on for
/// deterministic tie-breaking and enumeration.
pub struct TreeIndex<'a> {
    by_id: HashMap<Uuid, &'a TreeNode>,
    children: HashMap<Uuid, Vec<&'a TreeNode>>,
    roots: Vec<&'a TreeNode>,
}

impl<'a> TreeIndex<'a> {
    /// Build the index in one pass over the snapshot
    pub fn build(snapshot: &'a TreeSnapshot) -> Self {
        let mut by_id = HashMap::with_capacity(snapshot.nodes.len());
        for node in &snapshot.nodes {
            by_id.insert(node.id, node);
        }

        let mut children: HashMap<Uuid, Vec<&'a TreeNode>> = HashMap::new();
        let mut roots = Vec::new();
        for node in &snapshot.nodes {
            match node.parent_id {
                Some(parent_id) => children.entry(parent_id).or_default().push(node),
                None => roots.push(node),
            }
        }

        TreeIndex {
            by_id,
            children,
            roots,
        }
    }

    /// Look up a node by id
    pub fn node(&self, id: Uuid) -> Option<&'a TreeNode> {
        self.by_id.get(&id).copied()
    }

    /// Resolve a node's parent, if any
    pub fn parent(&self, node: &TreeNode) -> Option<&'a TreeNode> {
        node.parent_id.and_then(|parent_id| self.node(parent_id))
    }

    /// Children of a node in stored order (empty slice for leaves)
    pub fn children(&self, id: Uuid) -> &[&'a TreeNode] {
        self.children.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Roots in stored order
    pub fn roots(&self) -> &[&'a TreeNode] {
        &self.roots
    }

    /// Classify a chance node by its parent's kind
    ///
    /// Returns `None` for non-chance nodes. A parent id that does not resolve
    /// classifies as a choice; the dangling reference itself is the
    /// validator's problem, not the classifier's.
    pub fn chance_role(&self, node: &TreeNode) -> Option<ChanceRole> {
        if node.kind != NodeKind::Chance {
            return None;
        }
        match self.parent(node) {
            Some(parent) if parent.kind != NodeKind::Decision => {
                Some(ChanceRole::UncertainEvent)
            }
            _ => Some(ChanceRole::Choice),
        }
    }

    /// Check whether a node is an uncertain chance outcome
    pub fn is_uncertain_event(&self, node: &TreeNode) -> bool {
        self.chance_role(node) == Some(ChanceRole::UncertainEvent)
    }
}
