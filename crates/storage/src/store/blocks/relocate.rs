#![forbid(unsafe_code)]

use super::*;
use bf_core::ids::BlockId;
use bf_core::tree::BlockRecord;

impl<P: ConnectionPool> SqliteStore<P> {
    /// Re-links a block under `request.parent_id` (or to the workspace root level).
    ///
    /// The old sibling set is closed up and the new one opened in the same transaction.
    /// Moving a block under itself or one of its descendants is rejected.
    pub fn move_block(
        &self,
        block_id: &BlockId,
        request: MoveBlockRequest,
    ) -> Result<BlockRecord, StoreError> {
        let now_ms = now_ms();
        let record =
            self.write(|tx| move_block_tx(tx, block_id, &request, self.position_policy, now_ms))?;
        tracing::debug!(
            %block_id,
            parent_id = ?record.parent_id,
            position = record.position,
            "block moved"
        );
        Ok(record)
    }

    /// Turns a block into a workspace root, closing the gap it leaves behind.
    pub fn detach_block(&self, block_id: &BlockId) -> Result<BlockRecord, StoreError> {
        self.move_block(block_id, MoveBlockRequest::to_root())
    }
}

pub(in crate::store) fn move_block_tx(
    tx: &Transaction<'_>,
    block_id: &BlockId,
    request: &MoveBlockRequest,
    policy: PositionPolicy,
    now_ms: i64,
) -> Result<BlockRecord, StoreError> {
    let mut record = require_live_block(tx, block_id)?;
    if let Some(new_parent_id) = request.parent_id.as_ref() {
        let parent = require_live_block(tx, new_parent_id)?;
        if parent.workspace_id != record.workspace_id {
            return Err(StoreError::invalid(format!(
                "cannot move block {block_id} into another workspace"
            )));
        }
        ensure_not_ancestor(tx, block_id, new_parent_id)?;
    }

    if let Some((old_parent_id, old_position)) = parent_edge(tx, block_id)? {
        delete_parent_edge_tx(tx, block_id)?;
        shift_down_tx(tx, &old_parent_id, old_position)?;
    }

    let position = match request.parent_id.as_ref() {
        Some(new_parent_id) => {
            // The moving block no longer counts: its old edge is gone.
            let position = policy.resolve(request.position, child_count(tx, new_parent_id)?)?;
            shift_up_tx(tx, new_parent_id, position)?;
            insert_edge_tx(tx, new_parent_id, block_id, position)?;
            position
        }
        None => 0,
    };
    touch_block_tx(tx, block_id, now_ms)?;

    record.parent_id = request.parent_id;
    record.position = position;
    record.updated_at_ms = now_ms;
    Ok(record)
}
