#![forbid(unsafe_code)]

use super::*;
use bf_core::ids::BlockId;
use bf_core::tree::{BlockNode, BlockRecord};
use rusqlite::{Connection, params};

impl<P: ConnectionPool> SqliteStore<P> {
    /// `(parent_id, position)` of a live block, `None` when it is a root.
    pub fn get_position(&self, block_id: &BlockId) -> Result<Option<(BlockId, usize)>, StoreError> {
        self.read(|tx| {
            require_live_block(tx, block_id)?;
            parent_edge(tx, block_id)
        })
    }

    /// Live children ordered by position.
    pub fn get_children(&self, block_id: &BlockId) -> Result<Vec<BlockRecord>, StoreError> {
        self.read(|tx| {
            require_live_block(tx, block_id)?;
            load_children(tx, block_id)
        })
    }

    /// The block with one level of `content`. Children are not expanded further.
    pub fn get_block_with_children(&self, block_id: &BlockId) -> Result<BlockNode, StoreError> {
        self.read(|tx| {
            let block = require_live_block(tx, block_id)?;
            let content = load_children(tx, block_id)?
                .into_iter()
                .map(BlockNode::leaf)
                .collect();
            Ok(BlockNode { block, content })
        })
    }
}

pub(in crate::store) fn load_children(
    conn: &Connection,
    parent_id: &BlockId,
) -> Result<Vec<BlockRecord>, StoreError> {
    let mut stmt = conn.prepare(block_record_sql!(
        "WHERE e.parent_block_id=?1 AND b.deleted_at_ms IS NULL ORDER BY e.position ASC"
    ))?;
    let rows = stmt.query_map(params![parent_id.to_string()], block_record_from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}
