//! Optimal path extraction
//!
//! Walks evaluator output from the root into a flat, ordered trace of the
//! optimal policy: which option to pick at each decision, what the possible
//! outcomes of each chance node are, and where the path terminates. The trace
//! is renderer-friendly (step index plus indentation depth), not a wire
//! format.

use serde::{Deserialize, Serialize};

use crate::analysis::evaluator::{evaluate, AnalysisError, EvaluationResult};
use crate::analysis::index::TreeIndex;
use crate::models::{NodeKind, TreeNode, TreeSnapshot};

/// One entry in the optimal path trace
///
/// Either a node visit (`node_name`/`node_type`/`expected_value`) or a
/// free-text `action` describing a branch or selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathStep {
    /// 1-based position in the trace
    pub step: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<NodeKind>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_value: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,

    /// Indentation depth for rendering
    pub depth: usize,
}

/// Optimal path output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimalPathResult {
    pub optimal_path: Vec<PathStep>,
    pub root_expected_value: f64,
}

/// Extract the optimal policy trace for a snapshot
///
/// Runs the evaluator (which validates first) and propagates its failure
/// untouched.
pub fn optimal_path(snapshot: &TreeSnapshot) -> Result<OptimalPathResult, AnalysisError> {
    let evaluation = evaluate(snapshot)?;
    let index = TreeIndex::build(snapshot);
    let root = index
        .node(evaluation.root_node_id)
        .ok_or_else(|| AnalysisError::InvalidTree {
            issues: vec!["tree has no root node".to_string()],
        })?;

    let mut walk = PathWalk {
        index: &index,
        evaluation: &evaluation,
        steps: Vec::new(),
    };
    walk.visit(root, 0);

    Ok(OptimalPathResult {
        optimal_path: walk.steps,
        root_expected_value: evaluation.root_expected_value,
    })
}

struct PathWalk<'a> {
    index: &'a TreeIndex<'a>,
    evaluation: &'a EvaluationResult,
    steps: Vec<PathStep>,
}

impl<'a> PathWalk<'a> {
    fn value_of(&self, node: &TreeNode) -> f64 {
        self.evaluation
            .node_expected_values
            .get(&node.id)
            .copied()
            .unwrap_or(0.0)
    }

    fn push_node(&mut self, node: &TreeNode, depth: usize) {
        self.steps.push(PathStep {
            step: self.steps.len() + 1,
            node_name: Some(node.name.clone()),
            node_type: Some(node.kind),
            expected_value: Some(self.value_of(node)),
            action: None,
            depth,
        });
    }

    fn push_action(&mut self, action: String, expected_value: Option<f64>, depth: usize) {
        self.steps.push(PathStep {
            step: self.steps.len() + 1,
            node_name: None,
            node_type: None,
            expected_value,
            action: Some(action),
            depth,
        });
    }

    /// First child achieving the maximum value, in stored order
    fn best_child(&self, children: &[&'a TreeNode]) -> &'a TreeNode {
        let mut best = children[0];
        let mut best_value = self.value_of(best);
        for &child in &children[1..] {
            let value = self.value_of(child);
            if value > best_value {
                best = child;
                best_value = value;
            }
        }
        best
    }

    fn visit(&mut self, node: &'a TreeNode, depth: usize) {
        self.push_node(node, depth);
        let children: Vec<&'a TreeNode> = self.index.children(node.id).to_vec();

        match node.kind {
            // Terminal stops the walk; any children were already flagged by
            // the validator and are ignored here
            NodeKind::Terminal => {}
            NodeKind::Decision if !children.is_empty() => {
                let best = self.best_child(&children);
                self.push_action(
                    format!("Choose: {}", best.name),
                    Some(self.value_of(best)),
                    depth + 1,
                );
                self.visit(best, depth + 2);
            }
            NodeKind::Chance if !children.is_empty() => {
                self.push_action("Possible outcomes:".to_string(), None, depth + 1);
                for &child in &children {
                    let value = self.value_of(child);
                    let line = if self.index.is_uncertain_event(child) {
                        let percent = child.probability.unwrap_or(0.0) * 100.0;
                        format!(
                            "- {} ({percent:.1}% chance, EV: {value:.2})",
                            child.name
                        )
                    } else {
                        format!("- {} (EV: {value:.2})", child.name)
                    };
                    self.push_action(line, Some(value), depth + 2);
                }
                let best = self.best_child(&children);
                self.visit(best, depth + 2);
            }
            // Decision or chance leaves: nothing to descend into
            _ => {}
        }
    }
}
