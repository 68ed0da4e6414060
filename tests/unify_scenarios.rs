//! End-to-end unification scenarios
//!
//! Every scenario runs against both storage backends: clusters must behave
//! identically whether the graph lives in process or in SQLite.

use std::sync::Arc;

use idplex::{
    category, Batch, GraphSession, MemoryStore, NeighborFilter, Node, OpenStore, PersonRow,
    SqliteStore, Unifier, PERSON_ROOT,
};

/// Run a scenario against a memory-backed and a sqlite-backed engine.
fn on_both_backends(scenario: impl Fn(Unifier)) {
    scenario(Unifier::new(Arc::new(GraphSession::with_store(Arc::new(
        MemoryStore::new(),
    )))));
    scenario(Unifier::new(Arc::new(GraphSession::with_store(Arc::new(
        SqliteStore::open_in_memory().unwrap(),
    )))));
}

fn batch(source: &str, rows: Vec<PersonRow>) -> Batch {
    let mut batch = Batch::new(source, format!("harvest from {source}"));
    batch.rows = rows;
    batch
}

fn person_roots(unifier: &Unifier) -> Vec<Node> {
    unifier.session().nodes_by_name(PERSON_ROOT).unwrap()
}

fn neighbors_of(unifier: &Unifier, node: &Node) -> Vec<Node> {
    unifier
        .session()
        .neighbors(&node.key().unwrap(), &NeighborFilter::new())
        .unwrap()
}

#[test]
fn resubmitting_an_identical_batch_changes_nothing_but_history() {
    on_both_backends(|unifier| {
        let harvest = batch(
            "SysA",
            vec![
                PersonRow::new()
                    .with("ORCID", "0000-0001")
                    .with("FULL_NAME", "Jane Doe"),
                PersonRow::new().with("ORCID", "0000-0002"),
            ],
        );

        unifier.process_batch(&harvest).unwrap();
        let nodes_before = unifier.session().node_count().unwrap();
        let edges_before = unifier.session().edge_count().unwrap();
        let history_before = person_roots(&unifier)[0].history.len();

        unifier.process_batch(&harvest).unwrap();

        assert_eq!(unifier.session().node_count().unwrap(), nodes_before);
        assert_eq!(unifier.session().edge_count().unwrap(), edges_before);

        // No duplicate _source entries...
        let orcid = unifier
            .session()
            .find_node("ORCID", "0000-0001")
            .unwrap()
            .unwrap();
        assert_eq!(orcid.sources.len(), 1);

        // ...but history legitimately grows per re-run.
        assert!(person_roots(&unifier)[0].history.len() > history_before);
    });
}

#[test]
fn every_person_identifier_has_exactly_one_root() {
    on_both_backends(|unifier| {
        unifier
            .process_batch(&batch(
                "SysA",
                vec![
                    PersonRow::new()
                        .with("ORCID", "0000-0001")
                        .with("FULL_NAME", "Jane Doe"),
                    PersonRow::new().with("EMPLOYEE_ID", "E42"),
                    PersonRow::new()
                        .with("FULL_NAME", "Jane Doe")
                        .with("EMPLOYEE_ID", "E42"),
                ],
            ))
            .unwrap();

        for name in ["ORCID", "FULL_NAME", "EMPLOYEE_ID"] {
            for node in unifier.session().nodes_by_name(name).unwrap() {
                assert_eq!(node.category, category::PERSON);
                let roots = unifier
                    .session()
                    .person_roots_of(&node.key().unwrap())
                    .unwrap();
                assert_eq!(roots.len(), 1, "{name} node must have exactly one root");
            }
        }
    });
}

#[test]
fn no_dangling_roots_after_any_batch() {
    on_both_backends(|unifier| {
        unifier
            .process_batch(&batch(
                "SysA",
                vec![
                    PersonRow::new().with("ORCID", "0000-0001"),
                    PersonRow::new().with("EMPLOYEE_ID", "E42"),
                ],
            ))
            .unwrap();
        // This row merges the two clusters; the losing root must vanish.
        unifier
            .process_batch(&batch(
                "SysB",
                vec![PersonRow::new()
                    .with("ORCID", "0000-0001")
                    .with("EMPLOYEE_ID", "E42")],
            ))
            .unwrap();

        let roots = person_roots(&unifier);
        assert_eq!(roots.len(), 1);
        for root in &roots {
            assert!(
                !neighbors_of(&unifier, root).is_empty(),
                "person-root without neighbors must not persist"
            );
        }
    });
}

#[test]
fn transitive_evidence_merges_previously_separate_clusters() {
    on_both_backends(|unifier| {
        // Cluster 1 grows over two rows: {A, B} then {B, C}.
        unifier
            .process_batch(&batch(
                "SysA",
                vec![
                    PersonRow::new()
                        .with("ORCID", "0000-0001")
                        .with("FULL_NAME", "J. Doe"),
                    PersonRow::new()
                        .with("FULL_NAME", "J. Doe")
                        .with("SCOPUS_ID", "S7"),
                ],
            ))
            .unwrap();
        // Cluster 2 is created independently over {D}.
        unifier
            .process_batch(&batch(
                "SysB",
                vec![PersonRow::new().with("EMPLOYEE_ID", "E42")],
            ))
            .unwrap();
        assert_eq!(person_roots(&unifier).len(), 2);

        // {A, C, D} spans both clusters: they must merge into one root.
        let summary = unifier
            .process_batch(&batch(
                "SysC",
                vec![PersonRow::new()
                    .with("ORCID", "0000-0001")
                    .with("SCOPUS_ID", "S7")
                    .with("EMPLOYEE_ID", "E42")],
            ))
            .unwrap();
        assert_eq!(summary.roots_merged, 1);

        let roots = person_roots(&unifier);
        assert_eq!(roots.len(), 1, "losing root must no longer exist");

        let mut names: Vec<String> = neighbors_of(&unifier, &roots[0])
            .into_iter()
            .map(|n| n.name)
            .collect();
        names.sort();
        assert_eq!(names, ["EMPLOYEE_ID", "FULL_NAME", "ORCID", "SCOPUS_ID"]);
    });
}

#[test]
fn merge_survivor_is_the_smallest_root_token() {
    on_both_backends(|unifier| {
        unifier
            .process_batch(&batch(
                "SysA",
                vec![
                    PersonRow::new().with("ORCID", "0000-0001"),
                    PersonRow::new().with("EMPLOYEE_ID", "E42"),
                ],
            ))
            .unwrap();

        let mut tokens: Vec<String> = person_roots(&unifier)
            .into_iter()
            .map(|r| r.value)
            .collect();
        tokens.sort();
        let expected_survivor = tokens[0].clone();

        unifier
            .process_batch(&batch(
                "SysB",
                vec![PersonRow::new()
                    .with("ORCID", "0000-0001")
                    .with("EMPLOYEE_ID", "E42")],
            ))
            .unwrap();

        let roots = person_roots(&unifier);
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].value, expected_survivor);
    });
}

#[test]
fn merge_unions_provenance_of_both_clusters() {
    on_both_backends(|unifier| {
        unifier
            .process_batch(&batch(
                "SysX",
                vec![PersonRow::new().with("ORCID", "0000-0001")],
            ))
            .unwrap();
        unifier
            .process_batch(&batch(
                "SysY",
                vec![PersonRow::new().with("EMPLOYEE_ID", "E42")],
            ))
            .unwrap();

        let loser_history: usize = person_roots(&unifier)
            .iter()
            .map(|r| r.history.len())
            .sum();

        unifier
            .process_batch(&batch(
                "SysX",
                vec![PersonRow::new()
                    .with("ORCID", "0000-0001")
                    .with("EMPLOYEE_ID", "E42")],
            ))
            .unwrap();

        let roots = person_roots(&unifier);
        assert_eq!(roots.len(), 1);
        let sources: Vec<&str> = roots[0].sources.iter().map(|s| s.as_str()).collect();
        assert_eq!(sources, ["SysX", "SysY"]);
        // Both clusters' histories survive the merge, plus the merge event.
        assert_eq!(roots[0].history.len(), loser_history + 1);
    });
}

#[test]
fn two_single_row_batches_unify_around_a_shared_name() {
    on_both_backends(|unifier| {
        unifier
            .process_batch(&batch(
                "SysA",
                vec![PersonRow::new()
                    .with("ORCID", "0001")
                    .with("FULL_NAME", "Jane Doe")],
            ))
            .unwrap();
        unifier
            .process_batch(&batch(
                "SysB",
                vec![PersonRow::new()
                    .with("EMPLOYEE_ID", "E42")
                    .with("FULL_NAME", "Jane Doe")],
            ))
            .unwrap();

        // Exactly one person-root over the three distinct identifier nodes;
        // the second FULL_NAME upsert extended the existing node instead of
        // duplicating it.
        let roots = person_roots(&unifier);
        assert_eq!(roots.len(), 1);

        let mut names: Vec<String> = neighbors_of(&unifier, &roots[0])
            .into_iter()
            .map(|n| n.name)
            .collect();
        names.sort();
        assert_eq!(names, ["EMPLOYEE_ID", "FULL_NAME", "ORCID"]);

        let full_name = unifier
            .session()
            .find_node("FULL_NAME", "Jane Doe")
            .unwrap()
            .unwrap();
        let sources: Vec<&str> = full_name.sources.iter().map(|s| s.as_str()).collect();
        assert_eq!(sources, ["SysA", "SysB"]);

        assert!(roots[0].history.len() >= 2);
    });
}

#[test]
fn descriptive_enrichment_survives_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("idplex.db");

    {
        let session = Arc::new(GraphSession::with_store(Arc::new(
            SqliteStore::open(&path).unwrap(),
        )));
        let unifier = Unifier::new(session);
        unifier
            .process_batch(&batch(
                "SysA",
                vec![PersonRow::new()
                    .with("ORCID", "0000-0001")
                    .with("FULL_NAME", "Jane Doe")],
            ))
            .unwrap();
    }

    // A new process over the same file sees the cluster and extends it.
    let session = Arc::new(GraphSession::with_store(Arc::new(
        SqliteStore::open(&path).unwrap(),
    )));
    let unifier = Unifier::new(session);
    unifier
        .process_batch(&batch(
            "SysB",
            vec![PersonRow::new()
                .with("FULL_NAME", "Jane Doe")
                .with("EMPLOYEE_ID", "E42")],
        ))
        .unwrap();

    assert_eq!(person_roots(&unifier).len(), 1);
    let full_name = unifier
        .session()
        .find_node("FULL_NAME", "Jane Doe")
        .unwrap()
        .unwrap();
    assert_eq!(full_name.sources.len(), 2);
}
