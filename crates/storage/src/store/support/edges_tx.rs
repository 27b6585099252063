#![forbid(unsafe_code)]

use super::super::StoreError;
use super::rows::{block_id_at, position_at, to_sqlite_i64};
use bf_core::ids::BlockId;
use rusqlite::{Connection, OptionalExtension, Transaction, params};
use std::collections::HashSet;

/// `(parent_id, position)` of `child`, or `None` for a root.
pub(in crate::store) fn parent_edge(
    conn: &Connection,
    child: &BlockId,
) -> Result<Option<(BlockId, usize)>, StoreError> {
    let edge = conn
        .query_row(
            "SELECT parent_block_id, position FROM block_edges WHERE child_block_id=?1",
            params![child.to_string()],
            |row| Ok((block_id_at(row, 0)?, position_at(row, 1)?)),
        )
        .optional()?;
    Ok(edge)
}

pub(in crate::store) fn insert_edge_tx(
    tx: &Transaction<'_>,
    parent_id: &BlockId,
    child_id: &BlockId,
    position: usize,
) -> Result<(), StoreError> {
    tx.execute(
        "INSERT INTO block_edges(parent_block_id, child_block_id, position) VALUES (?1, ?2, ?3)",
        params![
            parent_id.to_string(),
            child_id.to_string(),
            to_sqlite_i64(position)?
        ],
    )?;
    Ok(())
}

pub(in crate::store) fn delete_parent_edge_tx(
    tx: &Transaction<'_>,
    child_id: &BlockId,
) -> Result<usize, StoreError> {
    let removed = tx.execute(
        "DELETE FROM block_edges WHERE child_block_id=?1",
        params![child_id.to_string()],
    )?;
    Ok(removed)
}

pub(in crate::store) fn delete_edges_touching_tx(
    tx: &Transaction<'_>,
    block_id: &BlockId,
) -> Result<usize, StoreError> {
    let removed = tx.execute(
        "DELETE FROM block_edges WHERE parent_block_id=?1 OR child_block_id=?1",
        params![block_id.to_string()],
    )?;
    Ok(removed)
}

/// Rejects making `block_id` a child of `new_parent_id` when that would close a cycle,
/// i.e. when `block_id` is `new_parent_id` or one of its ancestors.
pub(in crate::store) fn ensure_not_ancestor(
    conn: &Connection,
    block_id: &BlockId,
    new_parent_id: &BlockId,
) -> Result<(), StoreError> {
    let mut seen = HashSet::new();
    let mut current = *new_parent_id;
    loop {
        if current == *block_id {
            return Err(StoreError::invalid(format!(
                "cannot move block {block_id} under itself or one of its descendants"
            )));
        }
        if !seen.insert(current) {
            return Err(StoreError::ConstraintViolation(format!(
                "ancestor chain of block {new_parent_id} loops"
            )));
        }
        match parent_edge(conn, &current)? {
            Some((parent_id, _)) => current = parent_id,
            None => return Ok(()),
        }
    }
}

/// Ids of `root` and every block below it, parents before children.
///
/// Walks edges with an explicit stack so tree depth never grows the call stack.
pub(in crate::store) fn collect_subtree_ids(
    conn: &Connection,
    root: &BlockId,
) -> Result<Vec<BlockId>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT child_block_id FROM block_edges WHERE parent_block_id=?1 ORDER BY position DESC",
    )?;
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    let mut stack = vec![*root];
    while let Some(current) = stack.pop() {
        if !seen.insert(current) {
            continue;
        }
        out.push(current);
        let rows = stmt.query_map(params![current.to_string()], |row| block_id_at(row, 0))?;
        for child in rows {
            stack.push(child?);
        }
    }
    Ok(out)
}
