#![forbid(unsafe_code)]

use super::*;
use bf_core::ids::BlockId;
use rusqlite::params;

impl<P: ConnectionPool> SqliteStore<P> {
    /// Physically removes blocks soft-deleted at or before `older_than_ms`, with every edge
    /// touching them. Gaps left under surviving parents are closed; live rows are otherwise
    /// never affected.
    pub fn purge_deleted(&self, older_than_ms: i64) -> Result<PurgeOutcome, StoreError> {
        let outcome = self.write(|tx| {
            let ids = {
                let mut stmt = tx.prepare(
                    "SELECT id FROM blocks \
                     WHERE deleted_at_ms IS NOT NULL AND deleted_at_ms <= ?1 ORDER BY rowid",
                )?;
                let rows = stmt.query_map(params![older_than_ms], |row| block_id_at(row, 0))?;
                rows.collect::<Result<Vec<BlockId>, _>>()?
            };

            let mut edges_purged = 0;
            for id in ids.iter() {
                // A row flagged on its own still holds a slot under its parent.
                if let Some((parent_id, position)) = parent_edge(tx, id)? {
                    edges_purged += delete_parent_edge_tx(tx, id)?;
                    shift_down_tx(tx, &parent_id, position)?;
                }
                edges_purged += delete_edges_touching_tx(tx, id)?;
            }
            let mut blocks_purged = 0;
            for id in ids.iter() {
                blocks_purged += hard_delete_block_tx(tx, id)?;
            }
            Ok(PurgeOutcome {
                blocks_purged,
                edges_purged,
            })
        })?;

        match self.file_store().purge_archived(older_than_ms) {
            Ok(files) if files > 0 => tracing::debug!(files, "archived files purged"),
            Ok(_) => {}
            Err(err) => tracing::warn!(error = %err, "archived file purge failed"),
        }
        tracing::info!(
            blocks_purged = outcome.blocks_purged,
            edges_purged = outcome.edges_purged,
            older_than_ms,
            "purged deleted blocks"
        );
        Ok(outcome)
    }
}
