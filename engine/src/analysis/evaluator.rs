//! Expected-value evaluator
//!
//! Memoized bottom-up valuation of a validated snapshot. Valuation rules by
//! node kind:
//! - Terminal: utility - cost
//! - Decision: max(child values) - cost (first stored child wins ties)
//! - Chance as choice: sum of child contributions - cost, where an
//!   uncertain-event child contributes probability x value and any other
//!   child contributes its value directly
//! - Chance as uncertain event: pass-through for one child, unweighted mean
//!   for several, each minus cost
//!
//! An uncertain event's own probability is deliberately not used in its own
//! valuation; the parent's weighting step consumes it. The model attaches the
//! probability one level below where it is applied, and the evaluator keeps
//! that asymmetry intact.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::analysis::index::{ChanceRole, TreeIndex};
use crate::analysis::validation::validate;
use crate::models::{NodeKind, TreeNode, TreeSnapshot};

/// Maximum valuation recursion depth
///
/// Recursion depth equals tree depth. The validator does not prove
/// acyclicity, so anything deeper than this is treated as a cycle and fails
/// cleanly instead of overflowing the stack.
pub const MAX_TREE_DEPTH: usize = 100;

/// Analysis failures shared by the evaluator and the path extractor
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("tree validation failed with {} issue(s): {}", .issues.len(), .issues.join("; "))]
    InvalidTree { issues: Vec<String> },

    #[error("tree exceeds maximum depth {} at node '{node_name}' - possible cycle", MAX_TREE_DEPTH)]
    MaxDepthExceeded { node_name: String },
}

/// Per-node record of how a value was derived
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationBreakdown {
    /// Kind the valuation rule was dispatched on
    pub kind: NodeKind,

    /// Human-readable derivation of the value
    pub calculation: String,

    /// Cost applied at this node
    pub cost: f64,

    /// Utility consumed (terminal nodes only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utility: Option<f64>,

    /// The node's own probability, if it carries one (consumed by the parent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probability: Option<f64>,

    /// Child values combined by this node, in stored child order
    #[serde(default)]
    pub children_values: Vec<f64>,
}

/// Complete evaluator output for one snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Expected value at the root
    pub root_expected_value: f64,

    /// Expected value of every node reachable from the root
    pub node_expected_values: HashMap<Uuid, f64>,

    /// Derivation record per evaluated node
    pub calculation_breakdown: HashMap<Uuid, CalculationBreakdown>,

    /// The root the evaluation started from (first root in stored order)
    pub root_node_id: Uuid,
}

/// Evaluate expected values for a snapshot
///
/// Validates first and refuses to compute on an invalid tree. Builds a fresh
/// index and memo map per call; nothing persists between invocations, so
/// evaluating the same snapshot twice yields identical results.
pub fn evaluate(snapshot: &TreeSnapshot) -> Result<EvaluationResult, AnalysisError> {
    let report = validate(snapshot);
    if !report.valid {
        return Err(AnalysisError::InvalidTree {
            issues: report.issues,
        });
    }

    let index = TreeIndex::build(snapshot);
    // The validator guarantees at least one root on a valid snapshot
    let root = index
        .roots()
        .first()
        .copied()
        .ok_or_else(|| AnalysisError::InvalidTree {
            issues: vec!["tree has no root node".to_string()],
        })?;

    let mut pass = EvalPass {
        index: &index,
        values: HashMap::new(),
        breakdowns: HashMap::new(),
    };
    let root_expected_value = pass.eval_node(root, 0)?;

    Ok(EvaluationResult {
        root_expected_value,
        node_expected_values: pass.values,
        calculation_breakdown: pass.breakdowns,
        root_node_id: root.id,
    })
}

/// One evaluation invocation: borrowed index plus transient memo maps
struct EvalPass<'a> {
    index: &'a TreeIndex<'a>,
    values: HashMap<Uuid, f64>,
    breakdowns: HashMap<Uuid, CalculationBreakdown>,
}

impl<'a> EvalPass<'a> {
    /// Memoized recursive valuation
    fn eval_node(&mut self, node: &'a TreeNode, depth: usize) -> Result<f64, AnalysisError> {
        if let Some(&value) = self.values.get(&node.id) {
            return Ok(value);
        }
        if depth > MAX_TREE_DEPTH {
            return Err(AnalysisError::MaxDepthExceeded {
                node_name: node.name.clone(),
            });
        }

        let children: Vec<&'a TreeNode> = self.index.children(node.id).to_vec();
        let cost = node.cost_or_zero();

        let (value, breakdown) = match node.kind {
            NodeKind::Terminal => {
                // Children of a terminal node are ignored by design
                let utility = node.utility.unwrap_or(0.0);
                let value = utility - cost;
                (
                    value,
                    CalculationBreakdown {
                        kind: NodeKind::Terminal,
                        calculation: format!(
                            "EV = {utility} (utility) - {cost} (cost) = {value}"
                        ),
                        cost,
                        utility: Some(utility),
                        probability: node.probability,
                        children_values: Vec::new(),
                    },
                )
            }
            NodeKind::Decision => self.eval_decision(&children, cost, depth)?,
            NodeKind::Chance => match self.index.chance_role(node) {
                Some(ChanceRole::UncertainEvent) => {
                    self.eval_uncertain_event(node, &children, cost, depth)?
                }
                _ => self.eval_choice(node, &children, cost, depth)?,
            },
        };

        self.values.insert(node.id, value);
        self.breakdowns.insert(node.id, breakdown);
        Ok(value)
    }

    /// Decision: best child value minus cost
    fn eval_decision(
        &mut self,
        children: &[&'a TreeNode],
        cost: f64,
        depth: usize,
    ) -> Result<(f64, CalculationBreakdown), AnalysisError> {
        if children.is_empty() {
            let value = -cost;
            return Ok((
                value,
                CalculationBreakdown {
                    kind: NodeKind::Decision,
                    calculation: format!("EV = 0 (no options) - {cost} (cost) = {value}"),
                    cost,
                    utility: None,
                    probability: None,
                    children_values: Vec::new(),
                },
            ));
        }

        let mut child_values = Vec::with_capacity(children.len());
        for &child in children {
            child_values.push(self.eval_node(child, depth + 1)?);
        }
        let best = child_values
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        let value = best - cost;

        let options: Vec<String> = children
            .iter()
            .zip(&child_values)
            .map(|(child, child_value)| format!("{}: {child_value:.2}", child.name))
            .collect();
        Ok((
            value,
            CalculationBreakdown {
                kind: NodeKind::Decision,
                calculation: format!(
                    "EV = max({}) - {cost} (cost) = {value:.2}",
                    options.join(", ")
                ),
                cost,
                utility: None,
                probability: None,
                children_values: child_values,
            },
        ))
    }

    /// Choice: sum of child contributions minus cost
    ///
    /// Uncertain-event children are weighted by their own probability; any
    /// other child (terminal, decision) contributes its value directly.
    fn eval_choice(
        &mut self,
        node: &'a TreeNode,
        children: &[&'a TreeNode],
        cost: f64,
        depth: usize,
    ) -> Result<(f64, CalculationBreakdown), AnalysisError> {
        if children.is_empty() {
            let value = -cost;
            return Ok((
                value,
                CalculationBreakdown {
                    kind: NodeKind::Chance,
                    calculation: format!("EV = 0 (no outcomes) - {cost} (cost) = {value}"),
                    cost,
                    utility: None,
                    probability: node.probability,
                    children_values: Vec::new(),
                },
            ));
        }

        let mut total = 0.0;
        let mut child_values = Vec::with_capacity(children.len());
        let mut steps = Vec::with_capacity(children.len());
        for &child in children {
            let child_value = self.eval_node(child, depth + 1)?;
            child_values.push(child_value);
            if self.index.is_uncertain_event(child) {
                let probability = child.probability.unwrap_or(0.0);
                let contribution = probability * child_value;
                total += contribution;
                steps.push(format!(
                    "{probability} * {child_value:.2} = {contribution:.2}"
                ));
            } else {
                total += child_value;
                steps.push(format!("{}: {child_value:.2}", child.name));
            }
        }
        let value = total - cost;

        Ok((
            value,
            CalculationBreakdown {
                kind: NodeKind::Chance,
                calculation: format!(
                    "EV = ({}) - {cost} (cost) = {value:.2}",
                    steps.join(" + ")
                ),
                cost,
                utility: None,
                probability: node.probability,
                children_values: child_values,
            },
        ))
    }

    /// Uncertain event: pass-through or unweighted mean of children
    ///
    /// The node's own probability is not applied here; the parent's choice
    /// rule consumes it.
    fn eval_uncertain_event(
        &mut self,
        node: &'a TreeNode,
        children: &[&'a TreeNode],
        cost: f64,
        depth: usize,
    ) -> Result<(f64, CalculationBreakdown), AnalysisError> {
        if children.is_empty() {
            let value = -cost;
            return Ok((
                value,
                CalculationBreakdown {
                    kind: NodeKind::Chance,
                    calculation: format!("EV = 0 (no outcomes) - {cost} (cost) = {value}"),
                    cost,
                    utility: None,
                    probability: node.probability,
                    children_values: Vec::new(),
                },
            ));
        }

        let mut child_values = Vec::with_capacity(children.len());
        for &child in children {
            child_values.push(self.eval_node(child, depth + 1)?);
        }

        let (value, calculation) = if child_values.len() == 1 {
            let value = child_values[0] - cost;
            (
                value,
                format!(
                    "EV = {:.2} (single outcome) - {cost} (cost) = {value:.2}",
                    child_values[0]
                ),
            )
        } else {
            let mean: f64 = child_values.iter().sum::<f64>() / child_values.len() as f64;
            let value = mean - cost;
            let listed: Vec<String> = child_values
                .iter()
                .map(|child_value| format!("{child_value:.2}"))
                .collect();
            (
                value,
                format!(
                    "EV = mean({}) - {cost} (cost) = {value:.2}",
                    listed.join(", ")
                ),
            )
        };

        Ok((
            value,
            CalculationBreakdown {
                kind: NodeKind::Chance,
                calculation,
                cost,
                utility: None,
                probability: node.probability,
                children_values: child_values,
            },
        ))
    }
}
