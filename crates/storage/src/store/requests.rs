#![forbid(unsafe_code)]

use bf_core::ids::{BlockId, WorkspaceId};
use bf_core::model::{BlockKind, Properties};
use serde::Deserialize;

/// Create a block, optionally under a parent. Without an id one is generated.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct CreateBlockRequest {
    #[serde(default, skip_deserializing)]
    pub block_id: Option<BlockId>,
    pub workspace_id: WorkspaceId,
    #[serde(rename = "type")]
    pub kind: BlockKind,
    #[serde(default)]
    pub properties: Properties,
    #[serde(default)]
    pub parent_id: Option<BlockId>,
    #[serde(default)]
    pub position: usize,
}

impl CreateBlockRequest {
    pub fn root(workspace_id: WorkspaceId, kind: BlockKind) -> Self {
        Self {
            block_id: None,
            workspace_id,
            kind,
            properties: Properties::new(),
            parent_id: None,
            position: 0,
        }
    }

    pub fn child(
        workspace_id: WorkspaceId,
        kind: BlockKind,
        parent_id: BlockId,
        position: usize,
    ) -> Self {
        Self {
            parent_id: Some(parent_id),
            position,
            ..Self::root(workspace_id, kind)
        }
    }

    pub fn with_id(mut self, block_id: BlockId) -> Self {
        self.block_id = Some(block_id);
        self
    }

    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AttachChildRequest {
    pub block_id: BlockId,
    pub workspace_id: WorkspaceId,
    pub kind: BlockKind,
    pub properties: Properties,
    pub parent_id: Option<BlockId>,
    pub position: usize,
}

impl From<CreateBlockRequest> for AttachChildRequest {
    fn from(value: CreateBlockRequest) -> Self {
        Self {
            block_id: value.block_id.unwrap_or_else(BlockId::new_v4),
            workspace_id: value.workspace_id,
            kind: value.kind,
            properties: value.properties,
            parent_id: value.parent_id,
            position: value.position,
        }
    }
}

/// Partial update. Absent fields are left unchanged.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct UpdateBlockRequest {
    #[serde(default, rename = "type")]
    pub kind: Option<BlockKind>,
    #[serde(default)]
    pub properties: Option<Properties>,
}

/// Destination of a move. `parent_id: None` makes the block a workspace root.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct MoveBlockRequest {
    pub parent_id: Option<BlockId>,
    #[serde(default)]
    pub position: usize,
}

impl MoveBlockRequest {
    pub fn under(parent_id: BlockId, position: usize) -> Self {
        Self {
            parent_id: Some(parent_id),
            position,
        }
    }

    pub fn to_root() -> Self {
        Self {
            parent_id: None,
            position: 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateWorkspaceRequest {
    pub name: String,
    pub description: Option<String>,
}
