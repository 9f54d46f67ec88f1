//! Decision Tree Engine - Analysis Core
//!
//! Computes expected values and optimal policies over immutable decision
//! tree snapshots.
//!
//! # Architecture
//!
//! - **models**: Domain records (TreeNode, TreeSnapshot)
//! - **analysis**: The core pipeline (validation, evaluation, optimal path)
//!
//! # Critical Invariants
//!
//! 1. Snapshots are read-only input; the engine never mutates node records
//! 2. No state survives an analysis call (memo maps and indexes are per-call)
//! 3. Evaluation refuses to run on a snapshot that fails validation

// Module declarations
pub mod analysis;
pub mod models;

// Re-exports for convenience
pub use analysis::{
    evaluate, optimal_path, validate, AnalysisError, CalculationBreakdown, ChanceRole,
    EvaluationResult, OptimalPathResult, PathStep, TreeIndex, ValidationReport,
};
pub use models::{NodeKind, TreeNode, TreeSnapshot};
