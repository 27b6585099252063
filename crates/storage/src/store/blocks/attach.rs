#![forbid(unsafe_code)]

use super::*;
use crate::store::workspaces::require_live_workspace;
use bf_core::ids::BlockId;
use bf_core::model::Properties;
use bf_core::tree::BlockRecord;
use serde_json::Value;

const TEMP_PATH_KEY: &str = "temp_path";
const FILE_PATH_KEY: &str = "file_path";

impl<P: ConnectionPool> SqliteStore<P> {
    /// Creates a block; generates its id when the request carries none.
    pub fn create_block(&self, request: CreateBlockRequest) -> Result<BlockRecord, StoreError> {
        self.attach_child(request.into())
    }

    /// Inserts a new block and, when a parent is given, links it at the resolved position.
    ///
    /// Block row, edge and sibling shift commit together or not at all. For `image`/`file`
    /// blocks the file store runs afterwards; its failure is logged and leaves the block as
    /// committed.
    pub fn attach_child(&self, request: AttachChildRequest) -> Result<BlockRecord, StoreError> {
        let now_ms = now_ms();
        let record = self.write(|tx| attach_child_tx(tx, &request, self.position_policy, now_ms))?;
        tracing::debug!(
            block_id = %record.id,
            kind = %record.kind,
            parent_id = ?record.parent_id,
            position = record.position,
            "block attached"
        );
        Ok(self.place_file(record))
    }

    fn place_file(&self, record: BlockRecord) -> BlockRecord {
        if !record.kind.is_file_backed() {
            return record;
        }
        let temp_path = record
            .properties
            .get(TEMP_PATH_KEY)
            .and_then(Value::as_str)
            .map(str::to_string);
        let placed = match self
            .file_store()
            .materialize(&record.id, record.kind, temp_path.as_deref())
        {
            Ok(Some(file_path)) => file_path,
            Ok(None) => return record,
            Err(err) => {
                tracing::warn!(block_id = %record.id, error = %err, "file placement failed");
                return record;
            }
        };
        match self.write(|tx| record_file_path_tx(tx, &record.id, &placed)) {
            Ok(updated) => updated,
            Err(err) => {
                tracing::warn!(
                    block_id = %record.id,
                    file_path = %placed,
                    error = %err,
                    "failed to record placed file"
                );
                record
            }
        }
    }
}

pub(in crate::store) fn attach_child_tx(
    tx: &Transaction<'_>,
    request: &AttachChildRequest,
    policy: PositionPolicy,
    now_ms: i64,
) -> Result<BlockRecord, StoreError> {
    require_live_workspace(tx, &request.workspace_id)?;

    let position = match request.parent_id.as_ref() {
        Some(parent_id) => {
            let parent = require_live_block(tx, parent_id)?;
            if parent.workspace_id != request.workspace_id {
                return Err(StoreError::invalid(format!(
                    "parent {parent_id} belongs to workspace {}, not {}",
                    parent.workspace_id, request.workspace_id
                )));
            }
            let position = policy.resolve(request.position, child_count(tx, parent_id)?)?;
            shift_up_tx(tx, parent_id, position)?;
            position
        }
        None => 0,
    };

    insert_block_tx(
        tx,
        &request.block_id,
        request.kind,
        &request.properties,
        &request.workspace_id,
        now_ms,
    )?;
    if let Some(parent_id) = request.parent_id.as_ref() {
        insert_edge_tx(tx, parent_id, &request.block_id, position)?;
    }

    Ok(BlockRecord {
        id: request.block_id,
        kind: request.kind,
        properties: request.properties.clone(),
        workspace_id: request.workspace_id,
        parent_id: request.parent_id,
        position,
        created_at_ms: now_ms,
        updated_at_ms: now_ms,
    })
}

fn record_file_path_tx(
    tx: &Transaction<'_>,
    block_id: &BlockId,
    file_path: &str,
) -> Result<BlockRecord, StoreError> {
    let mut record = require_live_block(tx, block_id)?;
    let mut properties: Properties = std::mem::take(&mut record.properties);
    properties.remove(TEMP_PATH_KEY);
    properties.insert(FILE_PATH_KEY.to_string(), Value::from(file_path));
    let now_ms = now_ms();
    write_block_tx(tx, block_id, record.kind, &properties, now_ms)?;
    record.properties = properties;
    record.updated_at_ms = now_ms;
    Ok(record)
}

/// Stored file of an `image`/`file` block, if any.
pub(in crate::store) fn stored_file_path(record: &BlockRecord) -> Option<&str> {
    if !record.kind.is_file_backed() {
        return None;
    }
    record.properties.get(FILE_PATH_KEY).and_then(Value::as_str)
}
