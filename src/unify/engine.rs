//! The unification engine
//!
//! Processes harvest batches row by row against the growing graph. For each
//! row it upserts the identifier nodes, finds which person-root clusters the
//! row already touches, and then creates, extends, or merges clusters so
//! that afterwards every identifier in the row hangs off exactly one root.
//!
//! Rows are processed strictly sequentially: a merge performed for row *k*
//! is visible to row *k+1* of the same batch. This matters when a batch
//! itself contains rows that link previously-unrelated earlier rows.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use super::row::{Batch, BatchSummary, PersonRow};
use super::UnifyResult;
use crate::graph::{category, GraphSession, Node, NodeInput, NodeKey, PERSON_ROOT};
use crate::storage::NeighborFilter;

/// What cluster resolution did for one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowOutcome {
    /// No usable identifiers; nothing touched
    Skipped,
    /// A fresh person-root was created
    Created,
    /// One existing cluster absorbed the row
    Extended,
    /// This many losing roots were folded into the survivor
    Merged(usize),
}

/// Entity-resolution engine over one graph session.
///
/// Single-writer by contract: process one batch at a time. Batches are
/// idempotent, so re-running a batch after a failure is safe.
pub struct Unifier {
    session: Arc<GraphSession>,
}

impl Unifier {
    /// Create an engine over the given session.
    pub fn new(session: Arc<GraphSession>) -> Self {
        Self { session }
    }

    /// The underlying session, for read access after a batch.
    pub fn session(&self) -> &GraphSession {
        &self.session
    }

    /// Process a whole batch, row by row, in input order.
    ///
    /// Rows without usable identifiers are skipped with a warning. Backend
    /// failures abort the batch; rows already committed stay committed.
    pub fn process_batch(&self, batch: &Batch) -> UnifyResult<BatchSummary> {
        info!(source = %batch.source, rows = batch.rows.len(), "processing batch");

        let mut summary = BatchSummary::default();
        for (index, row) in batch.rows.iter().enumerate() {
            match self.process_row(row, batch)? {
                RowOutcome::Skipped => {
                    warn!(row = index, source = %batch.source, "row has no usable identifiers, skipped");
                    summary.rows_skipped += 1;
                }
                RowOutcome::Created => {
                    summary.rows_processed += 1;
                    summary.roots_created += 1;
                }
                RowOutcome::Extended => {
                    summary.rows_processed += 1;
                    summary.roots_extended += 1;
                }
                RowOutcome::Merged(absorbed) => {
                    summary.rows_processed += 1;
                    summary.roots_merged += absorbed;
                }
            }
        }

        info!(
            source = %batch.source,
            processed = summary.rows_processed,
            skipped = summary.rows_skipped,
            created = summary.roots_created,
            extended = summary.roots_extended,
            merged = summary.roots_merged,
            "batch complete"
        );
        Ok(summary)
    }

    fn process_row(&self, row: &PersonRow, batch: &Batch) -> UnifyResult<RowOutcome> {
        if row.is_empty() {
            return Ok(RowOutcome::Skipped);
        }

        // Upsert every identifier node in the row.
        let mut keys: Vec<NodeKey> = Vec::with_capacity(row.identifiers().len());
        for identifier in row.identifiers() {
            let input = NodeInput::new(&identifier.name, &identifier.value, category::PERSON)
                .with_source(&batch.source)
                .with_event(&batch.event);
            let node = self.session.upsert_node(input)?;
            keys.push(node.key()?);
        }

        // Distinct person-roots already reachable from any identifier here.
        let mut roots: BTreeMap<NodeKey, Node> = BTreeMap::new();
        for key in &keys {
            for root in self.session.person_roots_of(key)? {
                roots.insert(root.key()?, root);
            }
        }

        let mut roots: Vec<Node> = roots.into_values().collect();
        match roots.len() {
            0 => self.create_cluster(&keys, batch),
            1 => self.extend_cluster(roots.remove(0), &keys, batch),
            _ => self.merge_clusters(roots, &keys, batch),
        }
    }

    /// No cluster touches the row: start one around a fresh person-root.
    fn create_cluster(&self, keys: &[NodeKey], batch: &Batch) -> UnifyResult<RowOutcome> {
        let token = Uuid::new_v4().to_string();
        let input = NodeInput::new(PERSON_ROOT, &token, category::PERSON)
            .with_source(&batch.source)
            .with_event(format!("person-root created over {} identifiers", keys.len()));
        let root = self.session.upsert_node(input)?;
        let root_key = root.key()?;

        for key in keys {
            self.session.upsert_edge(&root_key, key)?;
        }

        debug!(root = %token, identifiers = keys.len(), "cluster created");
        Ok(RowOutcome::Created)
    }

    /// Exactly one cluster touches the row: attach what is not yet attached.
    fn extend_cluster(
        &self,
        root: Node,
        keys: &[NodeKey],
        batch: &Batch,
    ) -> UnifyResult<RowOutcome> {
        let root_key = root.key()?;

        let mut attached = 0;
        for key in keys {
            if self.session.upsert_edge(&root_key, key)? {
                attached += 1;
            }
        }
        self.record_root_event(
            &root,
            batch,
            &format!("cluster extended with {attached} identifiers"),
        )?;

        debug!(root = %root.value, attached, "cluster extended");
        Ok(RowOutcome::Extended)
    }

    /// Two or more clusters are shown to be the same person: fold every
    /// losing root into the deterministic survivor.
    ///
    /// The survivor is the root with the lexicographically smallest value
    /// token — a total order over any root set, so re-running the same
    /// batch from the same state picks the same survivor.
    fn merge_clusters(
        &self,
        mut roots: Vec<Node>,
        keys: &[NodeKey],
        batch: &Batch,
    ) -> UnifyResult<RowOutcome> {
        roots.sort_by(|a, b| a.value.cmp(&b.value));
        let survivor = roots.remove(0);
        let survivor_key = survivor.key()?;
        let absorbed = roots.len();

        for loser in &roots {
            let loser_key = loser.key()?;

            // Re-point every identifier edge incident on the losing root.
            for neighbor in self.session.neighbors(&loser_key, &NeighborFilter::new())? {
                self.session.upsert_edge(&survivor_key, &neighbor.key()?)?;
            }

            self.session.merge_node_provenance(&survivor_key, loser)?;
            self.session.delete_node(&loser_key)?;
            info!(survivor = %survivor.value, absorbed = %loser.value, "person-root merged");
        }

        // Attach the row itself, then record what happened.
        for key in keys {
            self.session.upsert_edge(&survivor_key, key)?;
        }
        self.record_root_event(
            &survivor,
            batch,
            &format!("merged {absorbed} person-root clusters"),
        )?;

        Ok(RowOutcome::Merged(absorbed))
    }

    /// Record the unification action on the surviving root, through the
    /// same upsert path every other provenance write takes.
    fn record_root_event(&self, root: &Node, batch: &Batch, action: &str) -> UnifyResult<Node> {
        let input = NodeInput::new(PERSON_ROOT, &root.value, category::PERSON)
            .with_source(&batch.source)
            .with_event(action);
        Ok(self.session.upsert_node(input)?)
    }
}
