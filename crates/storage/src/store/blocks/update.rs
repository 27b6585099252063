#![forbid(unsafe_code)]

use super::*;
use bf_core::ids::BlockId;
use bf_core::model::merge_properties;
use bf_core::tree::BlockRecord;

impl<P: ConnectionPool> SqliteStore<P> {
    pub fn get_block(&self, block_id: &BlockId) -> Result<BlockRecord, StoreError> {
        let conn = self.pool.acquire()?;
        require_live_block(&conn, block_id)
    }

    /// Shallow-merges `properties` into the stored document and replaces `kind` when given.
    /// `updated_at_ms` moves even when the request carries no changes.
    pub fn update_block(
        &self,
        block_id: &BlockId,
        request: UpdateBlockRequest,
    ) -> Result<BlockRecord, StoreError> {
        let now_ms = now_ms();
        let record = self.write(|tx| update_block_tx(tx, block_id, request, now_ms))?;
        tracing::debug!(%block_id, kind = %record.kind, "block updated");
        Ok(record)
    }
}

pub(in crate::store) fn update_block_tx(
    tx: &Transaction<'_>,
    block_id: &BlockId,
    request: UpdateBlockRequest,
    now_ms: i64,
) -> Result<BlockRecord, StoreError> {
    let mut record = require_live_block(tx, block_id)?;
    if let Some(patch) = request.properties {
        merge_properties(&mut record.properties, patch);
    }
    if let Some(kind) = request.kind {
        record.kind = kind;
    }
    write_block_tx(tx, block_id, record.kind, &record.properties, now_ms)?;
    record.updated_at_ms = now_ms;
    Ok(record)
}
