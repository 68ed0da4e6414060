//! Person-identifier unification

mod engine;
mod row;

use thiserror::Error;

pub use engine::Unifier;
pub use row::{Batch, BatchSummary, Identifier, PersonRow};

/// Errors that can occur during unification
#[derive(Debug, Error)]
pub enum UnifyError {
    #[error(transparent)]
    Graph(#[from] crate::graph::GraphError),

    /// Reserved: raised if survivor selection ever fails to produce a
    /// single deterministic root. The value-token order is total, so a
    /// correct build never constructs this.
    #[error("ambiguous merge: no deterministic surviving person-root")]
    AmbiguousMerge,
}

/// Result type for unification operations
pub type UnifyResult<T> = Result<T, UnifyError>;
