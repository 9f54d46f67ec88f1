//! Domain records
//!
//! The snapshot types handed to the analysis core by the caller. These are
//! plain data: no back-references, no interior mutability. Parent/child
//! structure is expressed through `parent_id` lookup keys only.

pub mod node;
pub mod snapshot;

pub use node::{NodeKind, TreeNode};
pub use snapshot::TreeSnapshot;
