#![forbid(unsafe_code)]

use super::*;
use bf_core::ids::WorkspaceId;
use rusqlite::{Connection, OptionalExtension, params};

impl<P: ConnectionPool> SqliteStore<P> {
    pub fn workspace_create(
        &self,
        request: CreateWorkspaceRequest,
    ) -> Result<WorkspaceRow, StoreError> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(StoreError::invalid("workspace name must not be empty"));
        }
        let description = request
            .description
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        let now_ms = now_ms();
        let row = WorkspaceRow {
            id: WorkspaceId::new_v4(),
            name: name.to_string(),
            description,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
        };
        self.write(|tx| {
            tx.execute(
                "INSERT INTO workspaces(id, name, description, created_at_ms, updated_at_ms) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    row.id.to_string(),
                    row.name,
                    row.description,
                    row.created_at_ms,
                    row.updated_at_ms
                ],
            )?;
            Ok(())
        })?;
        tracing::debug!(workspace_id = %row.id, name = %row.name, "workspace created");
        Ok(row)
    }

    pub fn workspace_get(&self, workspace_id: &WorkspaceId) -> Result<WorkspaceRow, StoreError> {
        let conn = self.pool.acquire()?;
        load_workspace(&conn, workspace_id)?
            .ok_or_else(|| StoreError::not_found("workspace", workspace_id))
    }

    pub fn workspace_exists(&self, workspace_id: &WorkspaceId) -> Result<bool, StoreError> {
        let conn = self.pool.acquire()?;
        workspace_is_live(&conn, workspace_id)
    }

    /// Flags the workspace and every live block in it as deleted in one transaction.
    pub fn workspace_delete(
        &self,
        workspace_id: &WorkspaceId,
    ) -> Result<WorkspaceDeleteResult, StoreError> {
        let now_ms = now_ms();
        let blocks_deleted = self.write(|tx| {
            let flagged = tx.execute(
                "UPDATE workspaces SET deleted_at_ms=?2, updated_at_ms=?2 \
                 WHERE id=?1 AND deleted_at_ms IS NULL",
                params![workspace_id.to_string(), now_ms],
            )?;
            if flagged == 0 {
                return Err(StoreError::not_found("workspace", workspace_id));
            }
            let blocks = tx.execute(
                "UPDATE blocks SET deleted_at_ms=?2, updated_at_ms=?2 \
                 WHERE workspace_id=?1 AND deleted_at_ms IS NULL",
                params![workspace_id.to_string(), now_ms],
            )?;
            Ok(blocks)
        })?;
        tracing::info!(%workspace_id, blocks_deleted, "workspace deleted");
        Ok(WorkspaceDeleteResult {
            workspace_id: *workspace_id,
            blocks_deleted,
        })
    }
}

pub(in crate::store) fn workspace_is_live(
    conn: &Connection,
    workspace_id: &WorkspaceId,
) -> Result<bool, StoreError> {
    let found = conn
        .query_row(
            "SELECT 1 FROM workspaces WHERE id=?1 AND deleted_at_ms IS NULL",
            params![workspace_id.to_string()],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

pub(in crate::store) fn require_live_workspace(
    conn: &Connection,
    workspace_id: &WorkspaceId,
) -> Result<(), StoreError> {
    if workspace_is_live(conn, workspace_id)? {
        Ok(())
    } else {
        Err(StoreError::not_found("workspace", workspace_id))
    }
}

fn load_workspace(
    conn: &Connection,
    workspace_id: &WorkspaceId,
) -> Result<Option<WorkspaceRow>, StoreError> {
    let row = conn
        .query_row(
            "SELECT id, name, description, created_at_ms, updated_at_ms FROM workspaces \
             WHERE id=?1 AND deleted_at_ms IS NULL",
            params![workspace_id.to_string()],
            |row| {
                Ok(WorkspaceRow {
                    id: workspace_id_at(row, 0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                    created_at_ms: row.get(3)?,
                    updated_at_ms: row.get(4)?,
                })
            },
        )
        .optional()?;
    Ok(row)
}
