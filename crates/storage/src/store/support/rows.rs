#![forbid(unsafe_code)]

use super::super::StoreError;
use bf_core::ids::{BlockId, WorkspaceId};
use bf_core::model::{BlockKind, Properties};
use bf_core::tree::BlockRecord;
use rusqlite::Row;
use rusqlite::types::Type;

/// `SELECT` prefix producing columns in the order [`block_record_from_row`] expects.
/// Roots have no edge row, so their parent is NULL and their position reads as 0.
macro_rules! block_record_sql {
    ($tail:literal) => {
        concat!(
            "SELECT b.id, b.kind, b.properties_json, b.workspace_id, \
                    e.parent_block_id, COALESCE(e.position, 0), b.created_at_ms, b.updated_at_ms \
             FROM blocks b LEFT JOIN block_edges e ON e.child_block_id = b.id ",
            $tail
        )
    };
}
pub(in crate::store) use block_record_sql;

pub(in crate::store) fn block_record_from_row(row: &Row<'_>) -> rusqlite::Result<BlockRecord> {
    Ok(BlockRecord {
        id: block_id_at(row, 0)?,
        kind: kind_at(row, 1)?,
        properties: properties_at(row, 2)?,
        workspace_id: workspace_id_at(row, 3)?,
        parent_id: optional_block_id_at(row, 4)?,
        position: position_at(row, 5)?,
        created_at_ms: row.get(6)?,
        updated_at_ms: row.get(7)?,
    })
}

pub(in crate::store) fn block_id_at(row: &Row<'_>, index: usize) -> rusqlite::Result<BlockId> {
    let raw = row.get::<_, String>(index)?;
    BlockId::parse(&raw).map_err(|err| conversion_error(index, err))
}

pub(in crate::store) fn optional_block_id_at(
    row: &Row<'_>,
    index: usize,
) -> rusqlite::Result<Option<BlockId>> {
    match row.get::<_, Option<String>>(index)? {
        Some(raw) => BlockId::parse(&raw)
            .map(Some)
            .map_err(|err| conversion_error(index, err)),
        None => Ok(None),
    }
}

pub(in crate::store) fn workspace_id_at(
    row: &Row<'_>,
    index: usize,
) -> rusqlite::Result<WorkspaceId> {
    let raw = row.get::<_, String>(index)?;
    WorkspaceId::parse(&raw).map_err(|err| conversion_error(index, err))
}

pub(in crate::store) fn position_at(row: &Row<'_>, index: usize) -> rusqlite::Result<usize> {
    let raw = row.get::<_, i64>(index)?;
    usize::try_from(raw).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(index, raw))
}

fn kind_at(row: &Row<'_>, index: usize) -> rusqlite::Result<BlockKind> {
    let raw = row.get::<_, String>(index)?;
    BlockKind::parse(&raw).map_err(|err| conversion_error(index, err))
}

fn properties_at(row: &Row<'_>, index: usize) -> rusqlite::Result<Properties> {
    let raw = row.get::<_, String>(index)?;
    serde_json::from_str::<Properties>(&raw).map_err(|err| conversion_error(index, err))
}

fn conversion_error(
    index: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(err))
}

pub(in crate::store) fn to_sqlite_i64(value: usize) -> Result<i64, StoreError> {
    i64::try_from(value).map_err(|_| StoreError::invalid("numeric overflow"))
}
