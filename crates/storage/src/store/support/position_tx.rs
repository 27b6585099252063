#![forbid(unsafe_code)]

//! Sibling ordering. Positions under one parent are always exactly `0..n`.
//!
//! Both shifts run inside the caller's transaction and are not idempotent: call each
//! exactly once per inserted or removed edge.

use super::super::StoreError;
use super::rows::to_sqlite_i64;
use bf_core::ids::BlockId;
use rusqlite::{Connection, Transaction, params};

/// Opens a slot at `from_position` by moving every sibling at or after it one place down.
pub(in crate::store) fn shift_up_tx(
    tx: &Transaction<'_>,
    parent_id: &BlockId,
    from_position: usize,
) -> Result<usize, StoreError> {
    let shifted = tx.execute(
        "UPDATE block_edges SET position = position + 1 \
         WHERE parent_block_id=?1 AND position >= ?2",
        params![parent_id.to_string(), to_sqlite_i64(from_position)?],
    )?;
    Ok(shifted)
}

/// Closes the gap left at `removed_position` after its edge was deleted.
pub(in crate::store) fn shift_down_tx(
    tx: &Transaction<'_>,
    parent_id: &BlockId,
    removed_position: usize,
) -> Result<usize, StoreError> {
    let shifted = tx.execute(
        "UPDATE block_edges SET position = position - 1 \
         WHERE parent_block_id=?1 AND position > ?2",
        params![parent_id.to_string(), to_sqlite_i64(removed_position)?],
    )?;
    Ok(shifted)
}

/// Number of edges under `parent_id`, which is the length of its position sequence.
///
/// A child flagged through the row-level helper keeps its edge, and its slot, until the
/// reaper removes it.
pub(in crate::store) fn child_count(
    conn: &Connection,
    parent_id: &BlockId,
) -> Result<usize, StoreError> {
    let count = conn.query_row(
        "SELECT COUNT(1) FROM block_edges WHERE parent_block_id=?1",
        params![parent_id.to_string()],
        |row| row.get::<_, i64>(0),
    )?;
    usize::try_from(count).map_err(|_| StoreError::invalid("numeric overflow"))
}
