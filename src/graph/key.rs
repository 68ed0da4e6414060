//! Key derivation for graph nodes
//!
//! A node's identity is its `(name, value)` pair. The codec folds that pair
//! into a single string key used as the uniqueness constraint in storage.

use serde::{Deserialize, Serialize};

use super::session::{GraphError, GraphResult};

/// Storage key of a node, derived from its `(name, value)` pair.
///
/// The encoding is `{name.len()}|{name}{value}`. The numeric length prefix
/// makes the split point explicit, so `("AB", "C")` and `("A", "BC")` can
/// never produce the same key, whatever characters the inputs contain.
///
/// Serializes as a plain string. `Ord` follows the encoded string, giving
/// storage backends and the unification engine a total, stable order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeKey(String);

impl NodeKey {
    /// Derive the key for a `(name, value)` pair.
    ///
    /// Pure and stable across process restarts. Fails with
    /// [`GraphError::InvalidKey`] when either part is empty.
    pub fn derive(name: &str, value: &str) -> GraphResult<Self> {
        if name.is_empty() {
            return Err(GraphError::InvalidKey("empty identifier name".to_string()));
        }
        if value.is_empty() {
            return Err(GraphError::InvalidKey(format!(
                "empty value for identifier '{name}'"
            )));
        }
        Ok(Self(format!("{}|{}{}", name.len(), name, value)))
    }

    /// Get the encoded key string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NodeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
