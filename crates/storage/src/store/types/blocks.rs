#![forbid(unsafe_code)]

use bf_core::ids::BlockId;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DeleteOutcome {
    pub root: BlockId,
    /// Every id flagged as deleted, the root first.
    pub removed: Vec<BlockId>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PurgeOutcome {
    pub blocks_purged: usize,
    pub edges_purged: usize,
}
