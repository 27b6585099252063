#![forbid(unsafe_code)]

use bf_core::ids::WorkspaceId;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WorkspaceRow {
    pub id: WorkspaceId,
    pub name: String,
    pub description: Option<String>,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WorkspaceDeleteResult {
    pub workspace_id: WorkspaceId,
    pub blocks_deleted: usize,
}
