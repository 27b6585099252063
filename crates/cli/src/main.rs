#![forbid(unsafe_code)]

mod args;

use args::{CliArgs, Command, parse_args, usage};
use bf_core::tree::BlockNode;
use bf_storage::{
    BatchOperation, BatchRequest, CreateWorkspaceRequest, FsFileStore, SqliteStore, StoreConfig,
    StoreError,
};
use serde::Serialize;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "BLOCKFOREST_LOG";

/// serde_json encodes nested `content` recursively, so deeper trees are refused before
/// printing instead of overflowing the stack.
const MAX_OUTPUT_DEPTH: usize = 1_024;

#[derive(Debug)]
enum CliError {
    Store(StoreError),
    Input(String),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{} ({})", err, err.kind().as_str()),
            Self::Input(message) => f.write_str(message),
        }
    }
}

impl From<StoreError> for CliError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

fn init_logging() {
    let filter = std::env::var(LOG_ENV)
        .ok()
        .and_then(|raw| EnvFilter::try_new(raw).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let raw = std::env::args().skip(1).collect::<Vec<_>>();
    if raw.iter().any(|a| a == "-h" || a == "--help") {
        print!("{}", usage());
        return ExitCode::SUCCESS;
    }
    init_logging();

    let cli = match StoreConfig::from_env()
        .map_err(|err| err.to_string())
        .and_then(|config| parse_args(&raw, config))
    {
        Ok(cli) => cli,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::from(2);
        }
    };

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: CliArgs) -> Result<(), CliError> {
    let CliArgs {
        config,
        files_dir,
        command,
    } = cli;
    tracing::debug!(?command, storage_dir = %config.storage_dir.display(), "running command");
    let store =
        SqliteStore::open(&config)?.with_file_store(Arc::new(FsFileStore::new(files_dir)));

    match command {
        Command::Init => print_json(&serde_json::json!({
            "db_path": config.db_path().display().to_string(),
            "position_policy": config.position_policy.as_str(),
        })),
        Command::WorkspaceCreate { name, description } => {
            let row = store.workspace_create(CreateWorkspaceRequest { name, description })?;
            print_json(&row)
        }
        Command::Forest(workspace_id) => {
            let forest = store.get_forest(&workspace_id)?;
            check_output_depth(&forest)?;
            print_json(&forest)
        }
        Command::Subtree(block_id) => {
            let subtree = store.get_subtree(&block_id)?;
            check_output_depth(std::slice::from_ref(&subtree))?;
            print_json(&subtree)
        }
        Command::List => print_json(&store.list_all()?),
        Command::Batch(path) => {
            let raw = std::fs::read_to_string(&path)
                .map_err(|err| CliError::Input(format!("{}: {err}", path.display())))?;
            let operations = decode_batch(&raw)?;
            print_json(&store.apply_batch(operations))
        }
        Command::Purge { older_than_ms } => {
            print_json(&store.purge_deleted(older_than_ms.unwrap_or(i64::MAX))?)
        }
    }
}

/// Accepts `{"operations": [...]}` or a bare array of operations.
fn decode_batch(raw: &str) -> Result<Vec<BatchOperation>, CliError> {
    if let Ok(request) = serde_json::from_str::<BatchRequest>(raw) {
        return Ok(request.operations);
    }
    serde_json::from_str::<Vec<BatchOperation>>(raw)
        .map_err(|err| CliError::Input(format!("invalid batch document: {err}")))
}

fn check_output_depth(nodes: &[BlockNode]) -> Result<(), CliError> {
    for node in nodes {
        let depth = node.depth();
        if depth > MAX_OUTPUT_DEPTH {
            return Err(CliError::Input(format!(
                "tree under {} is {depth} levels deep; output is limited to {MAX_OUTPUT_DEPTH}",
                node.id()
            )));
        }
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let encoded = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::Input(format!("encode output: {err}")))?;
    println!("{encoded}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bf_core::ids::{BlockId, WorkspaceId};
    use bf_core::model::{BlockKind, Properties};
    use bf_core::tree::{BlockRecord, assemble_subtree};
    use bf_storage::BatchOperationType;

    fn chain(levels: usize) -> BlockNode {
        let ws = WorkspaceId::new_v4();
        let record = |parent_id: Option<BlockId>| BlockRecord {
            id: BlockId::new_v4(),
            kind: BlockKind::Text,
            properties: Properties::new(),
            workspace_id: ws,
            parent_id,
            position: 0,
            created_at_ms: 1,
            updated_at_ms: 1,
        };
        let root = record(None);
        let mut parent = root.id;
        let mut descendants = Vec::new();
        for _ in 0..levels {
            let next = record(Some(parent));
            parent = next.id;
            descendants.push(next);
        }
        assemble_subtree(root, descendants)
    }

    #[test]
    fn output_depth_is_capped() {
        let shallow = chain(MAX_OUTPUT_DEPTH);
        assert!(check_output_depth(std::slice::from_ref(&shallow)).is_ok());

        let deep = chain(MAX_OUTPUT_DEPTH + 1);
        let err = check_output_depth(&[shallow, deep]).expect_err("too deep");
        assert!(matches!(err, CliError::Input(message) if message.contains("limited to 1024")));
    }

    #[test]
    fn batch_documents_accept_both_shapes() {
        let wrapped = r#"{"operations": [{"type": "delete", "block_id": "67e55044-10b1-426f-9247-bb680e5fe0c8"}]}"#;
        let bare = r#"[{"type": "delete", "block_id": "67e55044-10b1-426f-9247-bb680e5fe0c8"}]"#;

        let from_wrapped = decode_batch(wrapped).expect("wrapped");
        let from_bare = decode_batch(bare).expect("bare");
        assert_eq!(from_wrapped, from_bare);
        assert_eq!(from_bare[0].operation_type, BatchOperationType::Delete);

        assert!(matches!(decode_batch("{}"), Err(CliError::Input(_))));
    }
}
