#![forbid(unsafe_code)]

use super::super::{ErrorKind, StoreError};
use bf_core::ids::BlockId;
use bf_core::tree::BlockRecord;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchOperationType {
    Create,
    Update,
    Move,
    Delete,
}

impl BatchOperationType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Move => "move",
            Self::Delete => "delete",
        }
    }
}

/// One item of a batch document. `data` is decoded according to `type`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BatchOperation {
    #[serde(rename = "type")]
    pub operation_type: BatchOperationType,
    #[serde(default)]
    pub block_id: Option<BlockId>,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BatchOutcome {
    pub operation_type: BatchOperationType,
    pub block_id: Option<BlockId>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<BlockRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl BatchOutcome {
    pub(in crate::store) fn applied(
        operation_type: BatchOperationType,
        block_id: BlockId,
        result: Option<BlockRecord>,
    ) -> Self {
        Self {
            operation_type,
            block_id: Some(block_id),
            success: true,
            result,
            error: None,
            error_kind: None,
        }
    }

    pub(in crate::store) fn failed(
        operation_type: BatchOperationType,
        block_id: Option<BlockId>,
        err: &StoreError,
    ) -> Self {
        Self {
            operation_type,
            block_id,
            success: false,
            result: None,
            error: Some(err.to_string()),
            error_kind: Some(err.kind()),
        }
    }
}

/// Top-level batch document: `{"operations": [...]}`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchRequest {
    pub operations: Vec<BatchOperation>,
}
