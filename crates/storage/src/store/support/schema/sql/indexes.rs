#![forbid(unsafe_code)]

pub(super) const SQL: &str = r#"

        CREATE INDEX IF NOT EXISTS idx_blocks_workspace ON blocks(workspace_id, created_at_ms);
        CREATE INDEX IF NOT EXISTS idx_blocks_deleted ON blocks(deleted_at_ms) WHERE deleted_at_ms IS NOT NULL;
        CREATE INDEX IF NOT EXISTS idx_block_edges_parent_position ON block_edges(parent_block_id, position);
"#;
