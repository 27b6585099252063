#![forbid(unsafe_code)]

use super::*;
use bf_core::tree::BlockRecord;

impl<P: ConnectionPool> SqliteStore<P> {
    /// Every live block across all workspaces, newest first. Roots report `(None, 0)`.
    pub fn list_all(&self) -> Result<Vec<BlockRecord>, StoreError> {
        let conn = self.pool.acquire()?;
        let mut stmt = conn.prepare(block_record_sql!(
            "WHERE b.deleted_at_ms IS NULL ORDER BY b.created_at_ms DESC, b.rowid DESC"
        ))?;
        let rows = stmt.query_map([], block_record_from_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}
