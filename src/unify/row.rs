//! Harvest batch and row types
//!
//! A batch is what one harvest run hands to the unification engine: a source
//! tag, a history event string, and a sequence of rows. Each row is the set
//! of identifiers believed to belong to one real person. Rows are validated
//! here, at the harvester boundary, so the engine never inspects raw input.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One `(name, value)` personal-identifier pair within a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    pub name: String,
    pub value: String,
}

impl Identifier {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// The identifiers one harvest row knows for one person.
///
/// Serializes as a plain name→value map, the shape harvest exports use.
/// Identifiers with an empty name or value are discarded on insert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, String>",
    into = "BTreeMap<String, String>"
)]
pub struct PersonRow {
    identifiers: Vec<Identifier>,
}

impl PersonRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an identifier; empty names or values are silently discarded.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let identifier = Identifier::new(name, value);
        if identifier.name.is_empty() || identifier.value.is_empty() {
            return;
        }
        self.identifiers.push(identifier);
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// The usable identifiers of this row, in insertion order.
    pub fn identifiers(&self) -> &[Identifier] {
        &self.identifiers
    }

    /// True when the row carries no usable identifier.
    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }
}

impl From<BTreeMap<String, String>> for PersonRow {
    fn from(map: BTreeMap<String, String>) -> Self {
        let mut row = Self::new();
        for (name, value) in map {
            row.insert(name, value);
        }
        row
    }
}

impl From<PersonRow> for BTreeMap<String, String> {
    fn from(row: PersonRow) -> Self {
        row.identifiers
            .into_iter()
            .map(|id| (id.name, id.value))
            .collect()
    }
}

/// A batch of rows from one harvest run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    /// Source system tag, recorded in `_source` of every touched node
    pub source: String,
    /// History event string shared by the whole batch
    pub event: String,
    /// Rows, processed strictly in order
    #[serde(default)]
    pub rows: Vec<PersonRow>,
}

impl Batch {
    pub fn new(source: impl Into<String>, event: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            event: event.into(),
            rows: Vec::new(),
        }
    }

    /// Append a row.
    pub fn push_row(&mut self, row: PersonRow) {
        self.rows.push(row);
    }

    /// Builder form of [`push_row`](Self::push_row).
    pub fn with_row(mut self, row: PersonRow) -> Self {
        self.push_row(row);
        self
    }
}

/// What one batch did to the graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    /// Rows that reached cluster resolution
    pub rows_processed: usize,
    /// Rows skipped for lack of usable identifiers
    pub rows_skipped: usize,
    /// Fresh person-roots created
    pub roots_created: usize,
    /// Rows that extended an existing cluster
    pub roots_extended: usize,
    /// Losing person-roots absorbed by merges
    pub roots_merged: usize,
}
