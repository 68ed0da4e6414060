//! Provenance tracking: `_source` sets and `_history` logs
//!
//! Sources are a set (union on merge, no duplicates). History is a log:
//! append-only, never deduplicated, never reordered. Both survive cluster
//! merges intact.

use std::collections::BTreeSet;

use chrono::{SecondsFormat, Utc};

use crate::graph::Node;

/// Append a timestamped event to a history log.
pub fn record(history: &mut Vec<String>, event: &str) {
    let stamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    history.push(format!("{stamp}  {event}"));
}

/// Union `from` into `into`, returning how many entries were new.
pub fn union_sources(into: &mut BTreeSet<String>, from: &BTreeSet<String>) -> usize {
    let before = into.len();
    into.extend(from.iter().cloned());
    into.len() - before
}

/// Fold the provenance of `loser` into `survivor` during a cluster merge.
///
/// Sources are unioned. Histories are concatenated, survivor first: each
/// list is internally chronological and a node is a merge target at most
/// once per batch, so concatenation preserves per-source event order.
pub fn merge_provenance(survivor: &mut Node, loser: &Node) {
    union_sources(&mut survivor.sources, &loser.sources);
    survivor.history.extend(loser.history.iter().cloned());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{category, NodeInput, PERSON_ROOT};

    #[test]
    fn record_appends_timestamped_entries() {
        let mut history = Vec::new();
        record(&mut history, "harvested from SysA");
        record(&mut history, "harvested from SysA");

        assert_eq!(history.len(), 2);
        assert!(history[0].ends_with("harvested from SysA"));
        // Entries carry an RFC 3339 UTC stamp.
        assert!(history[0].contains('T'));
        assert!(history[0].split("  ").next().unwrap().ends_with('Z'));
    }

    #[test]
    fn union_sources_deduplicates() {
        let mut into: BTreeSet<String> = ["SysA".to_string()].into_iter().collect();
        let from: BTreeSet<String> = ["SysA".to_string(), "SysB".to_string()]
            .into_iter()
            .collect();

        let added = union_sources(&mut into, &from);
        assert_eq!(added, 1);
        assert_eq!(into.len(), 2);
    }

    #[test]
    fn merge_concatenates_history_survivor_first() {
        let mut survivor = NodeInput::new(PERSON_ROOT, "token-a", category::PERSON)
            .with_source("SysA")
            .with_event("root created")
            .into_node();
        let loser = NodeInput::new(PERSON_ROOT, "token-b", category::PERSON)
            .with_source("SysB")
            .with_event("root created")
            .into_node();

        merge_provenance(&mut survivor, &loser);

        assert_eq!(survivor.sources.len(), 2);
        assert_eq!(survivor.history.len(), 2);
        assert!(survivor.sources.contains("SysA"));
        assert!(survivor.sources.contains("SysB"));
    }
}
