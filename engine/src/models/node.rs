//! Tree node model
//!
//! A node in a decision tree. Each node has:
//! - A unique id and an optional parent id (absent = root)
//! - A kind: decision, chance, or terminal
//! - Optional probability (uncertain chance outcomes only)
//! - Optional cost (treated as 0 when absent, must be >= 0)
//! - Optional utility (terminal nodes only)
//! - Opaque metadata, passed through untouched

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Node kind
///
/// Closed set: the evaluator dispatches on this with an exhaustive match,
/// so adding a kind forces every valuation rule to be revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// A choice point; valued as the best of its children
    Decision,

    /// Stochastic or alternative outcomes; sub-classified by parent kind
    /// (see [`crate::analysis::ChanceRole`])
    Chance,

    /// A leaf outcome; valued as utility minus cost
    Terminal,
}

/// A single node record inside a tree snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    /// Unique node identifier
    pub id: Uuid,

    /// Parent node id; `None` marks a root
    #[serde(default)]
    pub parent_id: Option<Uuid>,

    /// Human-readable name, used in issue strings and path steps
    pub name: String,

    /// Node kind
    pub kind: NodeKind,

    /// Probability in [0, 1]; required only for uncertain chance outcomes
    #[serde(default)]
    pub probability: Option<f64>,

    /// Cost incurred at this node; absent means free
    #[serde(default)]
    pub cost: Option<f64>,

    /// Utility of the outcome; terminal nodes only
    #[serde(default)]
    pub utility: Option<f64>,

    /// Free-form metadata, opaque to the analysis core
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl TreeNode {
    /// Create a node with a fresh id and no optional attributes
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        TreeNode {
            id: Uuid::new_v4(),
            parent_id: None,
            name: name.into(),
            kind,
            probability: None,
            cost: None,
            utility: None,
            metadata: serde_json::Value::Null,
        }
    }

    /// Create a decision node
    pub fn decision(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Decision)
    }

    /// Create a chance node
    pub fn chance(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Chance)
    }

    /// Create a terminal node with the given utility
    pub fn terminal(name: impl Into<String>, utility: f64) -> Self {
        let mut node = Self::new(name, NodeKind::Terminal);
        node.utility = Some(utility);
        node
    }

    /// Attach this node under a parent
    pub fn with_parent(mut self, parent_id: Uuid) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Set the probability
    pub fn with_probability(mut self, probability: f64) -> Self {
        self.probability = Some(probability);
        self
    }

    /// Set the cost
    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = Some(cost);
        self
    }

    /// Check if this node is a root (no parent)
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Cost with the absent-means-free convention applied
    pub fn cost_or_zero(&self) -> f64 {
        self.cost.unwrap_or(0.0)
    }
}

// ============================================================================
// TESTS
// ============================================================================
