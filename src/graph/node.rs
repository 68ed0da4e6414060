//! Node representation in the identity graph

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::key::NodeKey;
use super::session::GraphResult;
use crate::provenance;

/// Reserved identifier kind for synthetic person aggregation nodes.
///
/// A person-root carries a generated opaque token as its value, never a
/// real-world identifier.
pub const PERSON_ROOT: &str = "person-root";

/// Well-known node categories.
///
/// Categories classify what a node describes; they play no role in node
/// identity. Research-output categories are free-form strings chosen by
/// harvesters.
pub mod category {
    pub const PERSON: &str = "person";
    pub const ORGANIZATION: &str = "organization";
}

/// A node in the identity graph.
///
/// The only entity type: one node per distinct `(name, value)` identifier
/// pair. `_source` and `_history` carry provenance across harvests and
/// survive cluster merges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Identifier kind (e.g. `ORCID`, `FULL_NAME`, `person-root`)
    pub name: String,
    /// Identifier value
    pub value: String,
    /// Classification (e.g. `person`, `organization`)
    pub category: String,
    /// Free-form descriptive note
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Year associated with the record (kept as text, harvests vary)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    /// Primary URL for the record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_main: Option<String>,
    /// Secondary URL for the record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_other: Option<String>,
    /// Every source system that ever contributed this node
    #[serde(rename = "_source", default)]
    pub sources: BTreeSet<String>,
    /// Append-only log of timestamped events; duplicates are historical facts
    #[serde(rename = "_history", default)]
    pub history: Vec<String>,
}

impl Node {
    /// Derive this node's storage key from its `(name, value)` pair.
    ///
    /// The key is computed, never stored as an input field.
    pub fn key(&self) -> GraphResult<NodeKey> {
        NodeKey::derive(&self.name, &self.value)
    }

    /// True for synthetic person aggregation nodes.
    pub fn is_person_root(&self) -> bool {
        self.name == PERSON_ROOT
    }
}

/// Input fields for a node upsert.
///
/// Built by harvesters and the unification engine, consumed by
/// [`GraphSession::upsert_node`](super::GraphSession::upsert_node). Empty
/// descriptive strings are treated as absent.
#[derive(Debug, Clone, Default)]
pub struct NodeInput {
    pub name: String,
    pub value: String,
    pub category: String,
    pub comment: Option<String>,
    pub year: Option<String>,
    pub url_main: Option<String>,
    pub url_other: Option<String>,
    /// Source system contributing this upsert
    pub source: Option<String>,
    /// History event to record with this upsert
    pub event: Option<String>,
}

impl NodeInput {
    /// Create an input with the identity fields set.
    pub fn new(
        name: impl Into<String>,
        value: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            category: category.into(),
            ..Default::default()
        }
    }

    /// Set the descriptive comment.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Set the year.
    pub fn with_year(mut self, year: impl Into<String>) -> Self {
        self.year = Some(year.into());
        self
    }

    /// Set the primary URL.
    pub fn with_url_main(mut self, url: impl Into<String>) -> Self {
        self.url_main = Some(url.into());
        self
    }

    /// Set the secondary URL.
    pub fn with_url_other(mut self, url: impl Into<String>) -> Self {
        self.url_other = Some(url.into());
        self
    }

    /// Set the contributing source system.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Set the history event string.
    pub fn with_event(mut self, event: impl Into<String>) -> Self {
        self.event = Some(event.into());
        self
    }

    /// Build a fresh node from this input.
    ///
    /// Descriptive fields that are empty strings are dropped; the source and
    /// event (when present) become the node's initial provenance.
    pub(crate) fn into_node(self) -> Node {
        let mut sources = BTreeSet::new();
        if let Some(source) = non_empty(self.source) {
            sources.insert(source);
        }
        let mut history = Vec::new();
        if let Some(event) = non_empty(self.event) {
            provenance::record(&mut history, &event);
        }
        Node {
            name: self.name,
            value: self.value,
            category: self.category,
            comment: non_empty(self.comment),
            year: non_empty(self.year),
            url_main: non_empty(self.url_main),
            url_other: non_empty(self.url_other),
            sources,
            history,
        }
    }
}

fn non_empty(field: Option<String>) -> Option<String> {
    field.filter(|s| !s.is_empty())
}
