// Expected-value evaluator - integration tests
//
// Covers the valuation rule per node kind, validation short-circuiting,
// breakdown records, determinism, and the depth guard.

use decision_tree_engine_rs::{evaluate, AnalysisError, NodeKind, TreeNode, TreeSnapshot};
use uuid::Uuid;

fn snapshot(nodes: Vec<TreeNode>) -> TreeSnapshot {
    TreeSnapshot::new(Uuid::new_v4(), nodes)
}

// ============================================================================
// Concrete scenarios
// ============================================================================

#[test]
fn test_single_terminal_root_value() {
    // utility 100, cost 10 => EV 90
    let root = TreeNode::terminal("payoff", 100.0).with_cost(10.0);
    let root_id = root.id;

    let result = evaluate(&snapshot(vec![root])).unwrap();
    assert_eq!(result.root_expected_value, 90.0);
    assert_eq!(result.root_node_id, root_id);
    assert_eq!(result.node_expected_values[&root_id], 90.0);

    let breakdown = &result.calculation_breakdown[&root_id];
    assert_eq!(breakdown.kind, NodeKind::Terminal);
    assert_eq!(breakdown.utility, Some(100.0));
    assert_eq!(breakdown.cost, 10.0);
    assert!(breakdown.calculation.contains("utility"));
}

#[test]
fn test_decision_picks_max_child() {
    let decide = TreeNode::decision("decide");
    let low = TreeNode::terminal("low", 50.0).with_parent(decide.id);
    let high = TreeNode::terminal("high", 80.0).with_parent(decide.id);
    let high_id = high.id;
    let decide_id = decide.id;

    let result = evaluate(&snapshot(vec![decide, low, high])).unwrap();
    assert_eq!(result.root_expected_value, 80.0);
    assert_eq!(result.node_expected_values[&high_id], 80.0);

    let breakdown = &result.calculation_breakdown[&decide_id];
    assert_eq!(breakdown.kind, NodeKind::Decision);
    assert_eq!(breakdown.children_values, vec![50.0, 80.0]);
    assert!(breakdown.calculation.starts_with("EV = max("));
}

#[test]
fn test_choice_weights_uncertain_children() {
    // Root choice with uncertain children 0.4 -> 100 and 0.6 -> 0
    let root = TreeNode::chance("root event");
    let grows = TreeNode::chance("grows")
        .with_parent(root.id)
        .with_probability(0.4);
    let shrinks = TreeNode::chance("shrinks")
        .with_parent(root.id)
        .with_probability(0.6);
    let win = TreeNode::terminal("win", 100.0).with_parent(grows.id);
    let nothing = TreeNode::terminal("nothing", 0.0).with_parent(shrinks.id);
    let root_id = root.id;

    let result = evaluate(&snapshot(vec![root, grows, shrinks, win, nothing])).unwrap();
    assert!((result.root_expected_value - 40.0).abs() < 1e-9);

    let breakdown = &result.calculation_breakdown[&root_id];
    assert_eq!(breakdown.kind, NodeKind::Chance);
    assert_eq!(breakdown.children_values, vec![100.0, 0.0]);
}

// ============================================================================
// Per-kind rules
// ============================================================================

#[test]
fn test_decision_without_children_costs_only() {
    let decide = TreeNode::decision("stuck").with_cost(25.0);
    let decide_id = decide.id;

    let result = evaluate(&snapshot(vec![decide])).unwrap();
    assert_eq!(result.root_expected_value, -25.0);
    assert!(result.calculation_breakdown[&decide_id]
        .calculation
        .contains("no options"));
}

#[test]
fn test_choice_sums_direct_terminal_children() {
    // Terminal children of a choice node contribute their value directly
    let root = TreeNode::chance("bundle").with_cost(5.0);
    let a = TreeNode::terminal("a", 10.0).with_parent(root.id);
    let b = TreeNode::terminal("b", 20.0).with_parent(root.id);

    let result = evaluate(&snapshot(vec![root, a, b])).unwrap();
    assert_eq!(result.root_expected_value, 25.0);
}

#[test]
fn test_uncertain_event_single_child_pass_through() {
    let root = TreeNode::chance("root");
    let event = TreeNode::chance("event")
        .with_parent(root.id)
        .with_probability(1.0)
        .with_cost(3.0);
    let leaf = TreeNode::terminal("leaf", 50.0).with_parent(event.id);
    let event_id = event.id;

    let result = evaluate(&snapshot(vec![root, event, leaf])).unwrap();
    // event: 50 - 3 = 47; root choice: 1.0 * 47 = 47
    assert_eq!(result.node_expected_values[&event_id], 47.0);
    assert_eq!(result.root_expected_value, 47.0);
}

#[test]
fn test_uncertain_event_averages_multiple_children_unweighted() {
    // The event's own probability weights it at the parent; its children are
    // combined by unweighted mean
    let root = TreeNode::chance("root");
    let event = TreeNode::chance("event")
        .with_parent(root.id)
        .with_probability(0.5);
    let other = TreeNode::chance("other")
        .with_parent(root.id)
        .with_probability(0.5);
    let low = TreeNode::terminal("low", 10.0).with_parent(event.id);
    let high = TreeNode::terminal("high", 30.0).with_parent(event.id);
    let flat = TreeNode::terminal("flat", 8.0).with_parent(other.id);
    let event_id = event.id;

    let result = evaluate(&snapshot(vec![root, event, other, low, high, flat])).unwrap();
    assert_eq!(result.node_expected_values[&event_id], 20.0);
    // root: 0.5 * 20 + 0.5 * 8 = 14
    assert!((result.root_expected_value - 14.0).abs() < 1e-9);

    let breakdown = &result.calculation_breakdown[&event_id];
    assert!(breakdown.calculation.contains("mean"));
    assert_eq!(breakdown.probability, Some(0.5));
}

#[test]
fn test_costs_subtract_at_every_level() {
    let decide = TreeNode::decision("decide").with_cost(2.0);
    let option = TreeNode::chance("option")
        .with_parent(decide.id)
        .with_cost(3.0);
    let leaf = TreeNode::terminal("leaf", 100.0)
        .with_parent(option.id)
        .with_cost(5.0);

    let result = evaluate(&snapshot(vec![decide, option, leaf])).unwrap();
    // leaf 95, option 95 - 3 = 92, decide 92 - 2 = 90
    assert_eq!(result.root_expected_value, 90.0);
}

// ============================================================================
// Preconditions and failure modes
// ============================================================================

#[test]
fn test_invalid_tree_refused_with_issue_list() {
    let mut leaf = TreeNode::terminal("broken", 0.0);
    leaf.utility = None;

    let err = evaluate(&snapshot(vec![leaf])).unwrap_err();
    match err {
        AnalysisError::InvalidTree { issues } => {
            assert!(issues.iter().any(|issue| issue.contains("missing utility")));
        }
        other => panic!("expected InvalidTree, got {other:?}"),
    }
}

#[test]
fn test_empty_snapshot_refused() {
    let err = evaluate(&snapshot(vec![])).unwrap_err();
    match err {
        AnalysisError::InvalidTree { issues } => {
            assert_eq!(issues, vec!["tree has no nodes".to_string()]);
        }
        other => panic!("expected InvalidTree, got {other:?}"),
    }
}

#[test]
fn test_depth_guard_trips_on_pathological_chain() {
    // A 150-deep chain of single-child uncertain events passes validation
    // but exceeds the evaluator's depth cap
    let root = TreeNode::chance("root");
    let mut nodes = vec![root.clone()];
    let mut parent_id = root.id;
    for i in 0..150 {
        let link = TreeNode::chance(format!("link {i}"))
            .with_parent(parent_id)
            .with_probability(1.0);
        parent_id = link.id;
        nodes.push(link);
    }
    nodes.push(TreeNode::terminal("end", 1.0).with_parent(parent_id));

    let err = evaluate(&snapshot(nodes)).unwrap_err();
    assert!(matches!(err, AnalysisError::MaxDepthExceeded { .. }));
}

// ============================================================================
// Determinism
// ============================================================================

#[test]
fn test_evaluation_is_idempotent() {
    let decide = TreeNode::decision("decide");
    let risky = TreeNode::chance("risky").with_parent(decide.id);
    let up = TreeNode::chance("up")
        .with_parent(risky.id)
        .with_probability(0.3);
    let down = TreeNode::chance("down")
        .with_parent(risky.id)
        .with_probability(0.7);
    let win = TreeNode::terminal("win", 100.0).with_parent(up.id);
    let lose = TreeNode::terminal("lose", -20.0).with_parent(down.id);

    let snap = snapshot(vec![decide, risky, up, down, win, lose]);
    let first = evaluate(&snap).unwrap();
    let second = evaluate(&snap).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_unreachable_second_root_not_evaluated() {
    // Evaluation starts from the first stored root; a second root's subtree
    // does not appear in the value maps
    let main_root = TreeNode::terminal("main", 10.0);
    let stray_root = TreeNode::terminal("stray", 99.0);
    let stray_id = stray_root.id;

    let result = evaluate(&snapshot(vec![main_root, stray_root])).unwrap();
    assert_eq!(result.root_expected_value, 10.0);
    assert!(!result.node_expected_values.contains_key(&stray_id));
}

#[test]
fn test_result_serializes_to_json() {
    let root = TreeNode::terminal("payoff", 100.0).with_cost(10.0);
    let result = evaluate(&snapshot(vec![root])).unwrap();

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["root_expected_value"], 90.0);
    assert!(json["calculation_breakdown"].is_object());
}
