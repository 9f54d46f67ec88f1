//! Decision tree analysis core
//!
//! Three operations over an immutable [`crate::models::TreeSnapshot`]:
//! - Structural validation (pass/fail plus issue and warning lists)
//! - Expected-value evaluation (memoized bottom-up valuation)
//! - Optimal path extraction (human-readable policy trace)
//!
//! Architecture:
//! - index.rs: Per-call children-by-parent index and chance classification
//! - validation.rs: Structural checks (roots, attributes, probability sums)
//! - evaluator.rs: Recursive expected-value computation with breakdowns
//! - path.rs: Optimal policy walk over evaluator output

pub mod evaluator;
pub mod index;
pub mod path;
pub mod validation;

// Re-export main types for convenience
pub use evaluator::{
    evaluate, AnalysisError, CalculationBreakdown, EvaluationResult, MAX_TREE_DEPTH,
};
pub use index::{ChanceRole, TreeIndex};
pub use path::{optimal_path, OptimalPathResult, PathStep};
pub use validation::{validate, ValidationReport, PROBABILITY_SUM_TOLERANCE};
