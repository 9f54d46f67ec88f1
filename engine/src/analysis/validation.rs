//! Structural validation
//!
//! Pre-evaluation checks to ensure a snapshot is well-formed:
//! - Root presence (zero roots is an error, several is only a warning)
//! - Type-specific attribute rules, aware of chance-node roles
//! - Parent reference resolution (orphan detection)
//! - Probability sums across uncertain-event siblings
//!
//! Validation never fails as an operation: it always returns a structured
//! report. `valid` is true iff `issues` is empty; warnings never affect it.

use serde::{Deserialize, Serialize};

use crate::analysis::index::{ChanceRole, TreeIndex};
use crate::models::{NodeKind, TreeNode, TreeSnapshot};

/// Allowed deviation of an uncertain-event sibling group's probability sum
/// from 1.0
pub const PROBABILITY_SUM_TOLERANCE: f64 = 1e-3;

/// Outcome of validating one snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// True iff no issues were found
    pub valid: bool,

    /// Hard problems; evaluation refuses to run while any exist
    pub issues: Vec<String>,

    /// Soft anomalies; never block evaluation
    pub warnings: Vec<String>,

    /// Total nodes inspected
    pub node_count: usize,

    /// Number of nodes without a parent
    pub root_count: usize,
}

/// Validate a snapshot for expected-value calculation readiness
///
/// Runs every check and accumulates all findings rather than stopping at the
/// first problem.
pub fn validate(snapshot: &TreeSnapshot) -> ValidationReport {
    if snapshot.nodes.is_empty() {
        return ValidationReport {
            valid: false,
            issues: vec!["tree has no nodes".to_string()],
            warnings: Vec::new(),
            node_count: 0,
            root_count: 0,
        };
    }

    let index = TreeIndex::build(snapshot);
    let mut issues = Vec::new();
    let mut warnings = Vec::new();

    let root_count = index.roots().len();
    if root_count == 0 {
        issues.push("tree has no root node".to_string());
    } else if root_count > 1 {
        warnings.push(format!(
            "tree has {root_count} root nodes (typically should have 1)"
        ));
    }

    for node in &snapshot.nodes {
        check_node(node, &index, &mut issues, &mut warnings);
    }
    check_probability_sums(snapshot, &index, &mut issues);

    ValidationReport {
        valid: issues.is_empty(),
        issues,
        warnings,
        node_count: snapshot.nodes.len(),
        root_count,
    }
}

/// Attribute and reference checks for a single node
fn check_node(
    node: &TreeNode,
    index: &TreeIndex<'_>,
    issues: &mut Vec<String>,
    warnings: &mut Vec<String>,
) {
    let children = index.children(node.id);

    if let Some(parent_id) = node.parent_id {
        if index.node(parent_id).is_none() {
            issues.push(format!("node '{}' has invalid parent reference", node.name));
        }
    }

    if let Some(cost) = node.cost {
        if cost < 0.0 {
            issues.push(format!("node '{}' has negative cost: {cost}", node.name));
        }
    }

    match node.kind {
        NodeKind::Terminal => {
            if node.utility.is_none() {
                issues.push(format!(
                    "terminal node '{}' is missing utility value",
                    node.name
                ));
            }
            if node.probability.is_some() {
                issues.push(format!(
                    "terminal node '{}' has probability but terminal nodes carry none",
                    node.name
                ));
            }
            if !children.is_empty() {
                warnings.push(format!(
                    "terminal node '{}' has children (they will be ignored)",
                    node.name
                ));
            }
        }
        NodeKind::Chance => {
            match index.chance_role(node) {
                Some(ChanceRole::Choice) => {
                    if node.probability.is_some() {
                        issues.push(format!(
                            "chance node '{}' represents a choice and must not have a probability",
                            node.name
                        ));
                    }
                }
                Some(ChanceRole::UncertainEvent) => match node.probability {
                    None => {
                        let parent_name = index
                            .parent(node)
                            .map(|parent| parent.name.as_str())
                            .unwrap_or("?");
                        issues.push(format!(
                            "chance node '{}' is missing probability (child of '{parent_name}')",
                            node.name
                        ));
                    }
                    Some(p) if !(0.0..=1.0).contains(&p) => {
                        issues.push(format!(
                            "chance node '{}' has invalid probability: {p} (must be 0-1)",
                            node.name
                        ));
                    }
                    Some(_) => {}
                },
                // chance_role is Some for every chance node
                None => {}
            }
            if node.utility.is_some() {
                issues.push(format!(
                    "chance node '{}' has utility but chance nodes carry none",
                    node.name
                ));
            }
            if children.is_empty() {
                issues.push(format!(
                    "chance node '{}' has no children - cannot compute expected value",
                    node.name
                ));
            }
        }
        NodeKind::Decision => {
            if node.probability.is_some() {
                issues.push(format!(
                    "decision node '{}' has probability but decisions carry none",
                    node.name
                ));
            }
            if node.utility.is_some() {
                issues.push(format!(
                    "decision node '{}' has utility but decisions carry none",
                    node.name
                ));
            }
            if children.is_empty() {
                warnings.push(format!(
                    "decision node '{}' has no choices to decide between",
                    node.name
                ));
            } else if children.iter().any(|child| child.kind != NodeKind::Chance) {
                warnings.push(format!(
                    "decision node '{}' has non-chance children - unusual structure",
                    node.name
                ));
            }
        }
    }
}

/// Probability-sum check per uncertain-event sibling group
///
/// A missing probability on any sibling suppresses the group check: the
/// missing value is already reported per node, and a partial sum would only
/// duplicate the noise.
fn check_probability_sums(
    snapshot: &TreeSnapshot,
    index: &TreeIndex<'_>,
    issues: &mut Vec<String>,
) {
    for node in &snapshot.nodes {
        let uncertain: Vec<&TreeNode> = index
            .children(node.id)
            .iter()
            .copied()
            .filter(|child| index.is_uncertain_event(child))
            .collect();

        if uncertain.len() < 2 {
            continue;
        }
        if uncertain.iter().any(|child| child.probability.is_none()) {
            continue;
        }

        let total: f64 = uncertain.iter().filter_map(|child| child.probability).sum();
        if (total - 1.0).abs() > PROBABILITY_SUM_TOLERANCE {
            issues.push(format!(
                "children of chance node '{}' have probabilities that sum to {total:.3}, should sum to 1.0",
                node.name
            ));
        }
    }
}
