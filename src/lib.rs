//! Idplex: Identifier-Unification Graph Engine
//!
//! Merges identifier records harvested from heterogeneous source systems
//! into one property graph in which every distinct real-world person is
//! represented by exactly one synthetic aggregation node.
//!
//! # Core Concepts
//!
//! - **Nodes**: one per distinct `(name, value)` identifier pair, carrying
//!   `_source`/`_history` provenance across harvests
//! - **Edges**: undirected links, materialized in both directions so
//!   neighbor lookup from either endpoint is single-hop
//! - **person-root**: the synthetic node aggregating all identifiers known
//!   for one person; clusters grow and merge as harvests supply evidence
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use idplex::{Batch, GraphSession, MemoryStore, PersonRow, Unifier};
//!
//! let session = Arc::new(GraphSession::with_store(Arc::new(MemoryStore::new())));
//! let unifier = Unifier::new(session);
//!
//! let batch = Batch::new("SysA", "initial harvest")
//!     .with_row(PersonRow::new().with("ORCID", "0000-0001").with("FULL_NAME", "Jane Doe"));
//! let summary = unifier.process_batch(&batch).unwrap();
//! assert_eq!(summary.roots_created, 1);
//! ```

mod graph;
pub mod provenance;
pub mod storage;
pub mod unify;

pub use graph::{category, GraphError, GraphResult, GraphSession, Node, NodeInput, NodeKey, PERSON_ROOT};
pub use storage::{GraphStore, MemoryStore, NeighborFilter, OpenStore, SqliteStore, StorageError, StorageResult};
pub use unify::{Batch, BatchSummary, Identifier, PersonRow, Unifier, UnifyError, UnifyResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
