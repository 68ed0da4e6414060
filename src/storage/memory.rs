//! In-process storage backend
//!
//! Keeps the whole graph in concurrent maps. The default backend for tests
//! and for embedding the engine without a database file.

use std::collections::BTreeSet;

use dashmap::DashMap;

use super::traits::{GraphStore, NeighborFilter, StorageResult};
use crate::graph::{Node, NodeKey};

/// Memory-backed graph store
///
/// Nodes are keyed by [`NodeKey`]; the adjacency map holds both directions
/// of every undirected edge so neighbor lookup from either endpoint is a
/// single map read. `BTreeSet` adjacency keeps neighbor order deterministic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    nodes: DashMap<NodeKey, Node>,
    adjacency: DashMap<NodeKey, BTreeSet<NodeKey>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl GraphStore for MemoryStore {
    fn get_node(&self, key: &NodeKey) -> StorageResult<Option<Node>> {
        Ok(self.nodes.get(key).map(|entry| entry.clone()))
    }

    fn create_node(&self, key: &NodeKey, node: &Node) -> StorageResult<()> {
        self.nodes.insert(key.clone(), node.clone());
        Ok(())
    }

    fn update_node(&self, key: &NodeKey, node: &Node) -> StorageResult<()> {
        self.nodes.insert(key.clone(), node.clone());
        Ok(())
    }

    fn delete_node(&self, key: &NodeKey) -> StorageResult<bool> {
        let existed = self.nodes.remove(key).is_some();
        if let Some((_, neighbors)) = self.adjacency.remove(key) {
            for neighbor in neighbors {
                if let Some(mut reverse) = self.adjacency.get_mut(&neighbor) {
                    reverse.remove(key);
                }
            }
        }
        Ok(existed)
    }

    fn nodes_by_name(&self, name: &str) -> StorageResult<Vec<Node>> {
        let mut found: Vec<Node> = self
            .nodes
            .iter()
            .filter(|entry| entry.value().name == name)
            .map(|entry| entry.value().clone())
            .collect();
        found.sort_by(|a, b| a.value.cmp(&b.value));
        Ok(found)
    }

    fn create_edge(&self, a: &NodeKey, b: &NodeKey) -> StorageResult<bool> {
        let created = self
            .adjacency
            .entry(a.clone())
            .or_default()
            .insert(b.clone());
        if created {
            self.adjacency
                .entry(b.clone())
                .or_default()
                .insert(a.clone());
        }
        Ok(created)
    }

    fn neighbors(&self, key: &NodeKey, filter: &NeighborFilter) -> StorageResult<Vec<Node>> {
        let Some(neighbor_keys) = self.adjacency.get(key) else {
            return Ok(Vec::new());
        };
        let mut found = Vec::new();
        for neighbor_key in neighbor_keys.iter() {
            if let Some(node) = self.nodes.get(neighbor_key) {
                if filter.matches(&node) {
                    found.push(node.clone());
                }
            }
        }
        Ok(found)
    }

    fn node_count(&self) -> StorageResult<usize> {
        Ok(self.nodes.len())
    }

    fn edge_count(&self) -> StorageResult<usize> {
        let directed: usize = self.adjacency.iter().map(|entry| entry.len()).sum();
        Ok(directed / 2)
    }
}
