#![forbid(unsafe_code)]

use super::*;
use bf_core::ids::BlockId;
use bf_core::tree::BlockRecord;
use serde::de::DeserializeOwned;

impl<P: ConnectionPool> SqliteStore<P> {
    /// Applies each operation in its own transaction. A failing item is reported in its
    /// outcome and does not stop the ones after it.
    pub fn apply_batch(&self, operations: Vec<BatchOperation>) -> Vec<BatchOutcome> {
        let mut outcomes = Vec::with_capacity(operations.len());
        for operation in operations {
            let operation_type = operation.operation_type;
            let requested_id = operation.block_id;
            let outcome = match self.apply_batch_item(operation) {
                Ok((block_id, result)) => BatchOutcome::applied(operation_type, block_id, result),
                Err(err) => {
                    tracing::debug!(
                        operation = operation_type.as_str(),
                        block_id = ?requested_id,
                        error = %err,
                        "batch item failed"
                    );
                    BatchOutcome::failed(operation_type, requested_id, &err)
                }
            };
            outcomes.push(outcome);
        }

        let failed = outcomes.iter().filter(|outcome| !outcome.success).count();
        tracing::info!(
            total = outcomes.len(),
            applied = outcomes.len() - failed,
            failed,
            "batch applied"
        );
        outcomes
    }

    fn apply_batch_item(
        &self,
        operation: BatchOperation,
    ) -> Result<(BlockId, Option<BlockRecord>), StoreError> {
        let BatchOperation {
            operation_type,
            block_id,
            data,
        } = operation;
        match operation_type {
            BatchOperationType::Create => {
                let mut request: CreateBlockRequest = decode_data(operation_type, data)?;
                request.block_id = block_id;
                let record = self.create_block(request)?;
                Ok((record.id, Some(record)))
            }
            BatchOperationType::Update => {
                let block_id = require_block_id(operation_type, block_id)?;
                let request: UpdateBlockRequest = decode_data(operation_type, data)?;
                let record = self.update_block(&block_id, request)?;
                Ok((block_id, Some(record)))
            }
            BatchOperationType::Move => {
                let block_id = require_block_id(operation_type, block_id)?;
                let request: MoveBlockRequest = decode_data(operation_type, data)?;
                let record = self.move_block(&block_id, request)?;
                Ok((block_id, Some(record)))
            }
            BatchOperationType::Delete => {
                let block_id = require_block_id(operation_type, block_id)?;
                self.delete_block(&block_id)?;
                Ok((block_id, None))
            }
        }
    }
}

fn require_block_id(
    operation_type: BatchOperationType,
    block_id: Option<BlockId>,
) -> Result<BlockId, StoreError> {
    block_id.ok_or_else(|| {
        StoreError::invalid(format!(
            "missing block_id for {} operation",
            operation_type.as_str()
        ))
    })
}

fn decode_data<T: DeserializeOwned>(
    operation_type: BatchOperationType,
    data: Option<serde_json::Value>,
) -> Result<T, StoreError> {
    let data = data.ok_or_else(|| {
        StoreError::invalid(format!(
            "missing data for {} operation",
            operation_type.as_str()
        ))
    })?;
    serde_json::from_value(data).map_err(|err| {
        StoreError::invalid(format!(
            "invalid data for {} operation: {err}",
            operation_type.as_str()
        ))
    })
}
