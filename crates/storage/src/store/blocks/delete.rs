#![forbid(unsafe_code)]

use super::attach::stored_file_path;
use super::*;
use bf_core::ids::BlockId;

impl<P: ConnectionPool> SqliteStore<P> {
    /// Soft-deletes a block and its whole subtree and closes the gap in its parent.
    ///
    /// Descendant edges stay in place until [`SqliteStore::purge_deleted`] removes them.
    /// Stored files of deleted `image`/`file` blocks are archived after commit.
    pub fn delete_block(&self, block_id: &BlockId) -> Result<DeleteOutcome, StoreError> {
        let now_ms = now_ms();
        let (outcome, file_paths) = self.write(|tx| delete_block_tx(tx, block_id, now_ms))?;
        tracing::debug!(%block_id, removed = outcome.removed.len(), "block deleted");

        for file_path in file_paths {
            if let Err(err) = self.file_store().archive(&file_path) {
                tracing::warn!(%block_id, %file_path, error = %err, "file archive failed");
            }
        }
        Ok(outcome)
    }
}

/// Returns the outcome plus the stored file paths that should be archived.
pub(in crate::store) fn delete_block_tx(
    tx: &Transaction<'_>,
    block_id: &BlockId,
    now_ms: i64,
) -> Result<(DeleteOutcome, Vec<String>), StoreError> {
    require_live_block(tx, block_id)?;

    let mut removed = Vec::new();
    let mut file_paths = Vec::new();
    for id in collect_subtree_ids(tx, block_id)? {
        let Some(record) = load_live_block(tx, &id)? else {
            continue;
        };
        if let Some(file_path) = stored_file_path(&record) {
            file_paths.push(file_path.to_string());
        }
        removed.push(id);
    }

    if let Some((parent_id, position)) = parent_edge(tx, block_id)? {
        delete_parent_edge_tx(tx, block_id)?;
        shift_down_tx(tx, &parent_id, position)?;
    }
    soft_delete_blocks_tx(tx, &removed, now_ms)?;

    Ok((
        DeleteOutcome {
            root: *block_id,
            removed,
        },
        file_paths,
    ))
}
