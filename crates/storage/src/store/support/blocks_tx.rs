#![forbid(unsafe_code)]

//! Row-level block access, independent of tree position.

use super::super::StoreError;
use super::rows::{block_record_from_row, block_record_sql};
use bf_core::ids::{BlockId, WorkspaceId};
use bf_core::model::{BlockKind, Properties};
use bf_core::tree::BlockRecord;
use rusqlite::{Connection, OptionalExtension, Transaction, ffi, params};

pub(in crate::store) fn load_live_block(
    conn: &Connection,
    id: &BlockId,
) -> Result<Option<BlockRecord>, StoreError> {
    let record = conn
        .query_row(
            block_record_sql!("WHERE b.id=?1 AND b.deleted_at_ms IS NULL"),
            params![id.to_string()],
            block_record_from_row,
        )
        .optional()?;
    Ok(record)
}

pub(in crate::store) fn require_live_block(
    conn: &Connection,
    id: &BlockId,
) -> Result<BlockRecord, StoreError> {
    load_live_block(conn, id)?.ok_or_else(|| StoreError::not_found("block", id))
}

pub(in crate::store) fn insert_block_tx(
    tx: &Transaction<'_>,
    id: &BlockId,
    kind: BlockKind,
    properties: &Properties,
    workspace_id: &WorkspaceId,
    now_ms: i64,
) -> Result<(), StoreError> {
    let properties_json = serde_json::to_string(properties)?;
    let inserted = tx.execute(
        "INSERT INTO blocks(id, kind, properties_json, workspace_id, created_at_ms, updated_at_ms) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
        params![
            id.to_string(),
            kind.as_str(),
            properties_json,
            workspace_id.to_string(),
            now_ms
        ],
    );
    match inserted {
        Ok(_) => Ok(()),
        Err(err) => Err(map_block_insert_error(err, id)),
    }
}

/// Rewrites kind and properties of a live block and bumps `updated_at_ms`.
pub(in crate::store) fn write_block_tx(
    tx: &Transaction<'_>,
    id: &BlockId,
    kind: BlockKind,
    properties: &Properties,
    now_ms: i64,
) -> Result<(), StoreError> {
    let properties_json = serde_json::to_string(properties)?;
    let updated = tx.execute(
        "UPDATE blocks SET kind=?2, properties_json=?3, updated_at_ms=?4 \
         WHERE id=?1 AND deleted_at_ms IS NULL",
        params![id.to_string(), kind.as_str(), properties_json, now_ms],
    )?;
    if updated == 0 {
        return Err(StoreError::not_found("block", id));
    }
    Ok(())
}

pub(in crate::store) fn touch_block_tx(
    tx: &Transaction<'_>,
    id: &BlockId,
    now_ms: i64,
) -> Result<(), StoreError> {
    tx.execute(
        "UPDATE blocks SET updated_at_ms=?2 WHERE id=?1",
        params![id.to_string(), now_ms],
    )?;
    Ok(())
}

/// Flags the given rows as deleted. Already deleted rows keep their original timestamp.
pub(in crate::store) fn soft_delete_blocks_tx(
    tx: &Transaction<'_>,
    ids: &[BlockId],
    now_ms: i64,
) -> Result<usize, StoreError> {
    let mut stmt = tx.prepare(
        "UPDATE blocks SET deleted_at_ms=?2, updated_at_ms=?2 \
         WHERE id=?1 AND deleted_at_ms IS NULL",
    )?;
    let mut flagged = 0;
    for id in ids {
        flagged += stmt.execute(params![id.to_string(), now_ms])?;
    }
    Ok(flagged)
}

/// Physically removes one row. Edges touching it must already be gone.
pub(in crate::store) fn hard_delete_block_tx(
    tx: &Transaction<'_>,
    id: &BlockId,
) -> Result<usize, StoreError> {
    let removed = tx.execute("DELETE FROM blocks WHERE id=?1", params![id.to_string()])?;
    Ok(removed)
}

fn map_block_insert_error(err: rusqlite::Error, id: &BlockId) -> StoreError {
    if let rusqlite::Error::SqliteFailure(code, _) = &err
        && matches!(
            code.extended_code,
            ffi::SQLITE_CONSTRAINT_PRIMARYKEY | ffi::SQLITE_CONSTRAINT_UNIQUE
        )
    {
        return StoreError::ConstraintViolation(format!("block {id} already exists"));
    }
    StoreError::from(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(extended_code: i32) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(
            ffi::Error::new(extended_code),
            Some("constraint failed".to_string()),
        )
    }

    #[test]
    fn duplicate_ids_are_classified_by_extended_code() {
        let id = BlockId::new_v4();
        let err = map_block_insert_error(failure(ffi::SQLITE_CONSTRAINT_PRIMARYKEY), &id);
        assert_eq!(err.to_string(), format!("constraint violation: block {id} already exists"));

        let err = map_block_insert_error(failure(ffi::SQLITE_CONSTRAINT_FOREIGNKEY), &id);
        assert!(matches!(err, StoreError::ConstraintViolation(message) if message == "constraint failed"));

        let err = map_block_insert_error(failure(ffi::SQLITE_BUSY), &id);
        assert!(matches!(err, StoreError::StorageUnavailable(_)));
    }
}
