#![forbid(unsafe_code)]

use bf_core::ids::{BlockId, WorkspaceId};
use bf_core::model::BlockKind;
use bf_core::tree::BlockRecord;
use bf_storage::{
    ConnectionPool, CreateBlockRequest, CreateWorkspaceRequest, MoveBlockRequest,
    PositionPolicy, SqliteStore, StoreConfig, StoreError,
};
use std::collections::BTreeMap;
use tempfile::TempDir;

fn open_store(policy: PositionPolicy) -> (TempDir, SqliteStore) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let mut config = StoreConfig::new(dir.path());
    config.position_policy = policy;
    let store = SqliteStore::open(&config).expect("open store");
    (dir, store)
}

fn workspace(store: &SqliteStore) -> WorkspaceId {
    store
        .workspace_create(CreateWorkspaceRequest {
            name: "positions".to_string(),
            description: None,
        })
        .expect("create workspace")
        .id
}

fn attach(
    store: &SqliteStore,
    ws: WorkspaceId,
    parent: Option<BlockId>,
    position: usize,
) -> Result<BlockRecord, StoreError> {
    let request = match parent {
        Some(parent) => CreateBlockRequest::child(ws, BlockKind::Text, parent, position),
        None => CreateBlockRequest::root(ws, BlockKind::Page),
    };
    store.create_block(request)
}

fn child_ids(store: &SqliteStore, parent: BlockId) -> Vec<BlockId> {
    store
        .get_children(&parent)
        .expect("children")
        .into_iter()
        .map(|record| record.id)
        .collect()
}

/// Checks that every live parent's live children sit at exactly `0..n`, that no live block
/// hangs under a deleted parent, and that every live block is reachable from a root.
fn assert_forest_consistent(store: &SqliteStore, ws: &WorkspaceId) {
    let conn = store.pool().acquire().expect("acquire");
    let mut stmt = conn
        .prepare(
            "SELECT e.parent_block_id, e.position FROM block_edges e \
             JOIN blocks c ON c.id = e.child_block_id \
             JOIN blocks p ON p.id = e.parent_block_id \
             WHERE c.deleted_at_ms IS NULL AND p.deleted_at_ms IS NULL",
        )
        .expect("prepare");
    let rows: Vec<(String, i64)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
        .expect("query")
        .collect::<Result<_, _>>()
        .expect("rows");
    let mut by_parent: BTreeMap<String, Vec<i64>> = BTreeMap::new();
    for (parent, position) in rows {
        by_parent.entry(parent).or_default().push(position);
    }
    for (parent, mut positions) in by_parent {
        positions.sort_unstable();
        let expected: Vec<i64> = (0..positions.len() as i64).collect();
        assert_eq!(positions, expected, "positions under {parent} are not contiguous");
    }

    let dangling: i64 = conn
        .query_row(
            "SELECT COUNT(1) FROM block_edges e \
             JOIN blocks c ON c.id = e.child_block_id \
             JOIN blocks p ON p.id = e.parent_block_id \
             WHERE c.deleted_at_ms IS NULL AND p.deleted_at_ms IS NOT NULL",
            [],
            |row| row.get(0),
        )
        .expect("dangling");
    assert_eq!(dangling, 0, "live block under a deleted parent");
    drop(stmt);
    drop(conn);

    let reachable: usize = store
        .get_forest(ws)
        .expect("forest")
        .iter()
        .map(|node| node.descendant_count() + 1)
        .sum();
    assert_eq!(reachable, store.list_all().expect("list").len());
}

/// Deterministic linear congruential generator; keeps the sequence reproducible.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        self.0 >> 33
    }

    fn below(&mut self, bound: usize) -> usize {
        (self.next() % bound as u64) as usize
    }
}

#[test]
fn random_structural_edits_keep_positions_contiguous() {
    let (_dir, store) = open_store(PositionPolicy::Clamp);
    let ws = workspace(&store);
    let mut rng = Lcg(0x5eed);
    let mut live: Vec<BlockId> = Vec::new();

    for step in 0..300 {
        let roll = rng.below(10);
        if live.is_empty() || roll < 4 {
            let parent = if live.is_empty() || rng.below(5) == 0 {
                None
            } else {
                Some(live[rng.below(live.len())])
            };
            let position = rng.below(6);
            let record = attach(&store, ws, parent, position).expect("attach");
            live.push(record.id);
        } else if roll < 8 {
            let block = live[rng.below(live.len())];
            let request = if rng.below(5) == 0 {
                MoveBlockRequest::to_root()
            } else {
                MoveBlockRequest::under(live[rng.below(live.len())], rng.below(6))
            };
            match store.move_block(&block, request) {
                Ok(_) | Err(StoreError::Validation(_)) => {}
                Err(other) => panic!("step {step}: unexpected move failure {other:?}"),
            }
        } else {
            let block = live[rng.below(live.len())];
            let outcome = store.delete_block(&block).expect("delete");
            live.retain(|id| !outcome.removed.contains(id));
        }
        assert_forest_consistent(&store, &ws);
    }
}

#[test]
fn moving_under_own_descendant_is_rejected() {
    let (_dir, store) = open_store(PositionPolicy::Clamp);
    let ws = workspace(&store);
    let a = attach(&store, ws, None, 0).expect("a");
    let b = attach(&store, ws, Some(a.id), 0).expect("b");
    let c = attach(&store, ws, Some(b.id), 0).expect("c");

    let err = store
        .move_block(&a.id, MoveBlockRequest::under(c.id, 0))
        .expect_err("cycle");
    assert!(matches!(err, StoreError::Validation(_)));
    let err = store
        .move_block(&b.id, MoveBlockRequest::under(b.id, 0))
        .expect_err("self parent");
    assert!(matches!(err, StoreError::Validation(_)));

    assert_eq!(store.get_position(&a.id).expect("a"), None);
    assert_eq!(store.get_position(&b.id).expect("b"), Some((a.id, 0)));
    assert_eq!(store.get_position(&c.id).expect("c"), Some((b.id, 0)));

    // Moving a descendant up is fine.
    store
        .move_block(&c.id, MoveBlockRequest::under(a.id, 0))
        .expect("hoist c");
    assert_eq!(child_ids(&store, a.id), vec![c.id, b.id]);
    assert_forest_consistent(&store, &ws);
}

#[test]
fn out_of_range_position_is_clamped_to_append() {
    let (_dir, store) = open_store(PositionPolicy::Clamp);
    let ws = workspace(&store);
    let parent = attach(&store, ws, None, 0).expect("parent");
    let first = attach(&store, ws, Some(parent.id), 0).expect("first");
    let second = attach(&store, ws, Some(parent.id), 1).expect("second");

    let third = attach(&store, ws, Some(parent.id), 99).expect("third");
    assert_eq!(third.position, 2);
    assert_eq!(child_ids(&store, parent.id), vec![first.id, second.id, third.id]);

    // Within one parent the moving block does not count toward the bound.
    let moved = store
        .move_block(&first.id, MoveBlockRequest::under(parent.id, 99))
        .expect("move to end");
    assert_eq!(moved.position, 2);
    assert_eq!(child_ids(&store, parent.id), vec![second.id, third.id, first.id]);

    let moved = store
        .move_block(&first.id, MoveBlockRequest::under(parent.id, 1))
        .expect("move to middle");
    assert_eq!(moved.position, 1);
    assert_eq!(child_ids(&store, parent.id), vec![second.id, first.id, third.id]);
    assert_forest_consistent(&store, &ws);
}

#[test]
fn reject_policy_refuses_out_of_range_positions() {
    let (_dir, store) = open_store(PositionPolicy::Reject);
    let ws = workspace(&store);
    let parent = attach(&store, ws, None, 0).expect("parent");
    let first = attach(&store, ws, Some(parent.id), 0).expect("first");
    let second = attach(&store, ws, Some(parent.id), 1).expect("second");
    let other = attach(&store, ws, None, 0).expect("other");

    let err = attach(&store, ws, Some(parent.id), 3).expect_err("beyond count");
    assert!(matches!(err, StoreError::Validation(_)));
    let appended = attach(&store, ws, Some(parent.id), 2).expect("at count");
    assert_eq!(appended.position, 2);

    let err = store
        .move_block(&other.id, MoveBlockRequest::under(parent.id, 4))
        .expect_err("move beyond count");
    assert!(matches!(err, StoreError::Validation(_)));
    assert_eq!(store.get_position(&other.id).expect("other"), None);
    assert_eq!(
        child_ids(&store, parent.id),
        vec![first.id, second.id, appended.id]
    );
    assert_eq!(store.position_policy(), PositionPolicy::Reject);
}

#[test]
fn deep_chains_are_walked_without_recursion() {
    let (_dir, store) = open_store(PositionPolicy::Clamp);
    let ws = workspace(&store);
    let top = attach(&store, ws, None, 0).expect("top");
    let mut tail = top.id;
    for _ in 0..2_000 {
        tail = attach(&store, ws, Some(tail), 0).expect("link").id;
    }

    let node = store.get_subtree(&top.id).expect("subtree");
    assert_eq!(node.depth(), 2_000);

    let err = store
        .move_block(&top.id, MoveBlockRequest::under(tail, 0))
        .expect_err("cycle through deep chain");
    assert!(matches!(err, StoreError::Validation(_)));

    let outcome = store.delete_block(&top.id).expect("delete chain");
    assert_eq!(outcome.removed.len(), 2_001);
    assert!(store.list_all().expect("list").is_empty());
}
