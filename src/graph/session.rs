//! GraphSession: the single mutation path into the identity graph
//!
//! Every write — harvester batches, maintenance scripts, the unification
//! engine — goes through the idempotent upsert primitives here, so every
//! path observes the same provenance and merge rules. The session holds the
//! backend explicitly; there is no module-global connection.

use std::sync::Arc;

use thiserror::Error;

use super::key::NodeKey;
use super::node::{Node, NodeInput, PERSON_ROOT};
use crate::provenance;
use crate::storage::{GraphStore, NeighborFilter, StorageError};

/// Errors that can occur in graph operations
#[derive(Debug, Error)]
pub enum GraphError {
    /// Malformed identifier name/value. Recoverable: the caller skips the
    /// offending identifier or row.
    #[error("invalid identifier key: {0}")]
    InvalidKey(String),

    /// A node expected to exist was not found
    #[error("node not found: {0}")]
    NodeNotFound(String),

    /// Backend I/O failure. Fatal for the current batch; not retried here.
    #[error("storage error: {0}")]
    Backend(#[from] StorageError),
}

/// Result type for graph operations
pub type GraphResult<T> = Result<T, GraphError>;

/// A scoped session over one graph storage backend.
///
/// All node and edge mutations are funneled through this type. The engine
/// is single-writer by design: callers wanting to parallelize across
/// independent harvests must still serialize mutations behind one session.
pub struct GraphSession {
    store: Arc<dyn GraphStore>,
}

impl GraphSession {
    /// Create a session over the given backend.
    pub fn with_store(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    /// Look up a node by key.
    pub fn get_node(&self, key: &NodeKey) -> GraphResult<Option<Node>> {
        Ok(self.store.get_node(key)?)
    }

    /// Look up a node by its `(name, value)` pair.
    pub fn find_node(&self, name: &str, value: &str) -> GraphResult<Option<Node>> {
        let key = NodeKey::derive(name, value)?;
        self.get_node(&key)
    }

    /// Create or update a node.
    ///
    /// When no node with the derived key exists, one is created from the
    /// input. When one exists, the input's source is unioned into
    /// `_source`, its event is appended to `_history`, and any descriptive
    /// field that was previously empty is filled in. A non-empty descriptive
    /// field is never overwritten, so enrichment from one source cannot be
    /// clobbered by another. `name`, `value`, and `category` never change.
    pub fn upsert_node(&self, input: NodeInput) -> GraphResult<Node> {
        let key = NodeKey::derive(&input.name, &input.value)?;

        let Some(mut node) = self.store.get_node(&key)? else {
            let node = input.into_node();
            self.store.create_node(&key, &node)?;
            return Ok(node);
        };

        if let Some(source) = input.source.as_deref().filter(|s| !s.is_empty()) {
            node.sources.insert(source.to_string());
        }
        if let Some(event) = input.event.as_deref().filter(|s| !s.is_empty()) {
            provenance::record(&mut node.history, event);
        }
        fill_empty(&mut node.comment, input.comment);
        fill_empty(&mut node.year, input.year);
        fill_empty(&mut node.url_main, input.url_main);
        fill_empty(&mut node.url_other, input.url_other);

        self.store.update_node(&key, &node)?;
        Ok(node)
    }

    /// Create the undirected edge between two nodes.
    ///
    /// Returns `Ok(false)` without touching storage when either endpoint is
    /// missing, when the endpoints are equal (no self-loops), or when the
    /// edge already exists. Commutative: `(a, b)` and `(b, a)` address the
    /// same edge.
    pub fn upsert_edge(&self, a: &NodeKey, b: &NodeKey) -> GraphResult<bool> {
        if a == b {
            return Ok(false);
        }
        if self.store.get_node(a)?.is_none() || self.store.get_node(b)?.is_none() {
            return Ok(false);
        }
        Ok(self.store.create_edge(a, b)?)
    }

    /// Neighbors of a node, optionally filtered by name and/or category.
    ///
    /// Single-hop in either direction; ordering is deterministic (by key).
    pub fn neighbors(&self, key: &NodeKey, filter: &NeighborFilter) -> GraphResult<Vec<Node>> {
        Ok(self.store.neighbors(key, filter)?)
    }

    /// The person-root nodes adjacent to a node.
    ///
    /// A consistent graph has at most one entry here for any identifier
    /// node; more than one is only observed mid-merge by the unification
    /// engine.
    pub fn person_roots_of(&self, key: &NodeKey) -> GraphResult<Vec<Node>> {
        self.neighbors(key, &NeighborFilter::new().with_name(PERSON_ROOT))
    }

    /// Merge the provenance of `loser` into the node at `survivor` and
    /// persist the result. Used when two person-root clusters are combined.
    pub fn merge_node_provenance(&self, survivor: &NodeKey, loser: &Node) -> GraphResult<Node> {
        let Some(mut node) = self.store.get_node(survivor)? else {
            return Err(GraphError::NodeNotFound(survivor.to_string()));
        };
        provenance::merge_provenance(&mut node, loser);
        self.store.update_node(survivor, &node)?;
        Ok(node)
    }

    /// Delete a node and every edge incident on it.
    pub fn delete_node(&self, key: &NodeKey) -> GraphResult<bool> {
        Ok(self.store.delete_node(key)?)
    }

    /// All nodes with the given identifier kind.
    pub fn nodes_by_name(&self, name: &str) -> GraphResult<Vec<Node>> {
        Ok(self.store.nodes_by_name(name)?)
    }

    /// Total node count.
    pub fn node_count(&self) -> GraphResult<usize> {
        Ok(self.store.node_count()?)
    }

    /// Total undirected edge count.
    pub fn edge_count(&self) -> GraphResult<usize> {
        Ok(self.store.edge_count()?)
    }
}

/// First writer wins for empty descriptive fields; existing text is kept.
fn fill_empty(slot: &mut Option<String>, incoming: Option<String>) {
    if slot.is_none() {
        if let Some(value) = incoming.filter(|s| !s.is_empty()) {
            *slot = Some(value);
        }
    }
}
