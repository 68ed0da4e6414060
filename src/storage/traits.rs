//! Storage trait definitions

use std::path::Path;

use thiserror::Error;

use crate::graph::{Node, NodeKey};

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Filter criteria for neighbor lookups
#[derive(Debug, Clone, Default)]
pub struct NeighborFilter {
    /// Restrict to neighbors with this identifier kind
    pub name: Option<String>,
    /// Restrict to neighbors in this category
    pub category: Option<String>,
}

impl NeighborFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// True when a node passes this filter.
    pub fn matches(&self, node: &Node) -> bool {
        self.name.as_deref().map_or(true, |n| node.name == n)
            && self.category.as_deref().map_or(true, |c| node.category == c)
    }
}

/// Trait for graph storage backends
///
/// Backends expose only these primitives; all merge/provenance policy lives
/// above them in [`GraphSession`](crate::GraphSession). Implementations must
/// be thread-safe (`Send + Sync`); the engine serializes writes, but
/// read-only consumers may query concurrently.
pub trait GraphStore: Send + Sync {
    // === Node Operations ===

    /// Load a node by key.
    fn get_node(&self, key: &NodeKey) -> StorageResult<Option<Node>>;

    /// Insert a node that is known not to exist yet, at its derived key.
    fn create_node(&self, key: &NodeKey, node: &Node) -> StorageResult<()>;

    /// Replace the stored fields of the node at `key`.
    fn update_node(&self, key: &NodeKey, node: &Node) -> StorageResult<()>;

    /// Delete a node and every edge incident on it.
    ///
    /// Returns `false` when no node with that key existed.
    fn delete_node(&self, key: &NodeKey) -> StorageResult<bool>;

    /// All nodes with the given identifier kind, ordered by key.
    fn nodes_by_name(&self, name: &str) -> StorageResult<Vec<Node>>;

    // === Edge Operations ===

    /// Create the mutual directed pair for an undirected edge.
    ///
    /// Idempotent: returns `false` when the edge already exists. Endpoint
    /// existence and self-loop rejection are enforced by the session above.
    fn create_edge(&self, a: &NodeKey, b: &NodeKey) -> StorageResult<bool>;

    /// Single-hop neighbors of a node, filtered, ordered by key.
    fn neighbors(&self, key: &NodeKey, filter: &NeighborFilter) -> StorageResult<Vec<Node>>;

    // === Counts ===

    /// Number of nodes in the graph.
    fn node_count(&self) -> StorageResult<usize>;

    /// Number of undirected edges in the graph.
    fn edge_count(&self) -> StorageResult<usize>;
}

/// Extension trait for opening stores from paths
pub trait OpenStore: GraphStore + Sized {
    /// Open or create a store at the given path
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;

    /// Create an in-memory store (useful for testing)
    fn open_in_memory() -> StorageResult<Self>;
}
