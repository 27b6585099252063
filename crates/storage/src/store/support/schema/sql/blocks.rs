#![forbid(unsafe_code)]

pub(super) const SQL: &str = r#"

        CREATE TABLE IF NOT EXISTS blocks (
          id TEXT PRIMARY KEY,
          kind TEXT NOT NULL CHECK (kind IN (
            'root_block', 'page', 'text', 'heading_1', 'heading_2', 'heading_3',
            'bullet_list', 'numbered_list', 'to_do', 'toggle', 'code', 'image', 'file'
          )),
          properties_json TEXT NOT NULL DEFAULT '{}',
          workspace_id TEXT NOT NULL REFERENCES workspaces(id),
          created_at_ms INTEGER NOT NULL,
          updated_at_ms INTEGER NOT NULL,
          deleted_at_ms INTEGER
        );

        -- Parent -> child association with the child's rank among its siblings.
        -- A child has at most one parent: the tree is a forest, never a DAG.
        CREATE TABLE IF NOT EXISTS block_edges (
          parent_block_id TEXT NOT NULL REFERENCES blocks(id),
          child_block_id TEXT NOT NULL REFERENCES blocks(id),
          position INTEGER NOT NULL CHECK (position >= 0),
          PRIMARY KEY (parent_block_id, child_block_id),
          UNIQUE (child_block_id)
        );
"#;
