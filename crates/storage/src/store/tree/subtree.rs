#![forbid(unsafe_code)]

use super::*;
use crate::store::workspaces::require_live_workspace;
use bf_core::ids::{BlockId, WorkspaceId};
use bf_core::tree::{BlockNode, BlockRecord, assemble_forest, assemble_subtree};
use rusqlite::params;

impl<P: ConnectionPool> SqliteStore<P> {
    /// The block with every descendant expanded, ordered by position at each level.
    pub fn get_subtree(&self, block_id: &BlockId) -> Result<BlockNode, StoreError> {
        self.read(|tx| {
            let root = require_live_block(tx, block_id)?;
            let mut descendants = Vec::new();
            for id in collect_subtree_ids(tx, block_id)?.into_iter().skip(1) {
                if let Some(record) = load_live_block(tx, &id)? {
                    descendants.push(record);
                }
            }
            Ok(assemble_subtree(root, descendants))
        })
    }

    /// Every root of the workspace, in creation order, fully expanded.
    pub fn get_forest(&self, workspace_id: &WorkspaceId) -> Result<Vec<BlockNode>, StoreError> {
        self.read(|tx| {
            require_live_workspace(tx, workspace_id)?;
            let mut stmt = tx.prepare(block_record_sql!(
                "WHERE b.workspace_id=?1 AND b.deleted_at_ms IS NULL \
                 ORDER BY b.created_at_ms ASC, b.rowid ASC"
            ))?;
            let rows = stmt.query_map(params![workspace_id.to_string()], block_record_from_row)?;

            let mut roots: Vec<BlockRecord> = Vec::new();
            let mut descendants: Vec<BlockRecord> = Vec::new();
            for row in rows {
                let record = row?;
                if record.is_root() {
                    roots.push(record);
                } else {
                    descendants.push(record);
                }
            }
            Ok(assemble_forest(roots, descendants))
        })
    }
}
