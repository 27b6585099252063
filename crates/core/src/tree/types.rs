#![forbid(unsafe_code)]

use crate::ids::{BlockId, WorkspaceId};
use crate::model::{BlockKind, Properties};
use serde::{Deserialize, Serialize};

/// A block row with its tree position denormalized onto it.
///
/// Roots carry `parent_id: None` and `position: 0`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockRecord {
    pub id: BlockId,
    #[serde(rename = "type")]
    pub kind: BlockKind,
    pub properties: Properties,
    pub workspace_id: WorkspaceId,
    pub parent_id: Option<BlockId>,
    pub position: usize,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

impl BlockRecord {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// A block together with its ordered, recursively expanded children.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockNode {
    #[serde(flatten)]
    pub block: BlockRecord,
    #[serde(default)]
    pub content: Vec<BlockNode>,
}

impl BlockNode {
    pub fn leaf(block: BlockRecord) -> Self {
        Self {
            block,
            content: Vec::new(),
        }
    }

    pub fn id(&self) -> BlockId {
        self.block.id
    }

    /// Ids of this node and every descendant, parents before children, siblings by position.
    pub fn ids_preorder(&self) -> Vec<BlockId> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(node.block.id);
            for child in node.content.iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    pub fn descendant_count(&self) -> usize {
        self.ids_preorder().len() - 1
    }

    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(self, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            for child in node.content.iter() {
                stack.push((child, depth + 1));
            }
        }
        max_depth
    }
}

// Tear down iteratively; the default drop glue recurses once per level.
impl Drop for BlockNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.content);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.content);
        }
    }
}
