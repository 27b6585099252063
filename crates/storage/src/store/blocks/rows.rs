#![forbid(unsafe_code)]

use super::*;
use bf_core::ids::BlockId;

impl<P: ConnectionPool> SqliteStore<P> {
    /// Flags one row as deleted without touching its edges. Returns whether a live row was
    /// flagged.
    pub fn soft_delete_block_row(&self, block_id: &BlockId) -> Result<bool, StoreError> {
        let now_ms = now_ms();
        let flagged =
            self.write(|tx| soft_delete_blocks_tx(tx, std::slice::from_ref(block_id), now_ms))?;
        Ok(flagged > 0)
    }

    /// Physically removes one row. Fails with a constraint violation while any edge still
    /// references it.
    pub fn hard_delete_block_row(&self, block_id: &BlockId) -> Result<bool, StoreError> {
        let removed = self.write(|tx| hard_delete_block_tx(tx, block_id))?;
        Ok(removed > 0)
    }
}
