#![forbid(unsafe_code)]

use bf_core::ids::{BlockId, WorkspaceId};
use bf_storage::{StoreConfig, parse_pool_size, parse_position_policy};
use std::path::PathBuf;

pub(crate) fn usage() -> &'static str {
    "blockforest - ordered block trees on SQLite\n\n\
USAGE:\n\
  blockforest [--storage-dir DIR] [--pool-size N] [--position-policy clamp|reject]\n\
              [--files-dir DIR] COMMAND\n\n\
COMMANDS:\n\
  init                                 create the database and print its path\n\
  workspace-create NAME [--description TEXT]\n\
  forest WORKSPACE_ID                  print every root of a workspace, fully expanded\n\
  subtree BLOCK_ID                     print one block, fully expanded\n\
  list                                 print every live block, newest first\n\
  batch FILE                           apply {\"operations\": [...]} and print per-item outcomes\n\
  purge [--older-than-ms MS]           drop soft-deleted rows (default: all of them)\n\n\
ENV:\n\
  BLOCKFOREST_STORAGE_DIR, BLOCKFOREST_POOL_SIZE, BLOCKFOREST_ACQUIRE_TIMEOUT_MS,\n\
  BLOCKFOREST_BUSY_TIMEOUT_MS, BLOCKFOREST_POSITION_POLICY, BLOCKFOREST_LOG (or RUST_LOG)\n"
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Command {
    Init,
    WorkspaceCreate {
        name: String,
        description: Option<String>,
    },
    Forest(WorkspaceId),
    Subtree(BlockId),
    List,
    Batch(PathBuf),
    Purge {
        older_than_ms: Option<i64>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct CliArgs {
    pub(crate) config: StoreConfig,
    /// Root of the file store; defaults to `<storage_dir>/objects`.
    pub(crate) files_dir: PathBuf,
    pub(crate) command: Command,
}

/// Flags win over `config`, which already carries env overrides.
pub(crate) fn parse_args(args: &[String], mut config: StoreConfig) -> Result<CliArgs, String> {
    let mut files_dir: Option<PathBuf> = None;
    let mut positional: Vec<&str> = Vec::new();
    let mut description: Option<String> = None;
    let mut older_than_ms: Option<i64> = None;

    let mut i = 0usize;
    while i < args.len() {
        let a = args[i].as_str();
        match a {
            "--storage-dir" => {
                i += 1;
                let v = args.get(i).ok_or("--storage-dir requires DIR")?;
                config.storage_dir = PathBuf::from(v);
            }
            "--pool-size" => {
                i += 1;
                let v = args.get(i).ok_or("--pool-size requires N")?;
                config.pool_size = parse_pool_size(v).map_err(|err| err.to_string())?;
            }
            "--position-policy" => {
                i += 1;
                let v = args.get(i).ok_or("--position-policy requires clamp|reject")?;
                config.position_policy =
                    parse_position_policy(v).map_err(|err| err.to_string())?;
            }
            "--files-dir" => {
                i += 1;
                let v = args.get(i).ok_or("--files-dir requires DIR")?;
                files_dir = Some(PathBuf::from(v));
            }
            "--description" => {
                i += 1;
                let v = args.get(i).ok_or("--description requires TEXT")?;
                description = Some(v.to_string());
            }
            "--older-than-ms" => {
                i += 1;
                let v = args.get(i).ok_or("--older-than-ms requires MS")?;
                older_than_ms = Some(
                    v.parse::<i64>()
                        .map_err(|_| "--older-than-ms must be an integer (milliseconds)")?,
                );
            }
            other if other.starts_with("--") => {
                return Err(format!("Unknown arg: {other}\n\n{}", usage()));
            }
            other => positional.push(other),
        }
        i += 1;
    }

    let command = match positional.as_slice() {
        ["init"] => Command::Init,
        ["workspace-create", name] => Command::WorkspaceCreate {
            name: name.to_string(),
            description,
        },
        ["forest", id] => Command::Forest(
            WorkspaceId::parse(id).map_err(|err| format!("workspace id: {err}"))?,
        ),
        ["subtree", id] => {
            Command::Subtree(BlockId::parse(id).map_err(|err| format!("block id: {err}"))?)
        }
        ["list"] => Command::List,
        ["batch", file] => Command::Batch(PathBuf::from(file)),
        ["purge"] => Command::Purge { older_than_ms },
        [] => return Err(format!("missing command\n\n{}", usage())),
        other => return Err(format!("unexpected arguments: {other:?}\n\n{}", usage())),
    };

    let files_dir = files_dir.unwrap_or_else(|| config.storage_dir.join("objects"));
    Ok(CliArgs {
        config,
        files_dir,
        command,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bf_storage::PositionPolicy;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn flags_override_config_and_pick_the_command() {
        let parsed = parse_args(
            &args(&[
                "--storage-dir",
                "/tmp/bf",
                "--pool-size",
                "2",
                "--position-policy",
                "reject",
                "workspace-create",
                "Notes",
                "--description",
                "team notes",
            ]),
            StoreConfig::default(),
        )
        .expect("parse");

        assert_eq!(parsed.config.storage_dir, PathBuf::from("/tmp/bf"));
        assert_eq!(parsed.config.pool_size, 2);
        assert_eq!(parsed.config.position_policy, PositionPolicy::Reject);
        assert_eq!(parsed.files_dir, PathBuf::from("/tmp/bf/objects"));
        assert_eq!(
            parsed.command,
            Command::WorkspaceCreate {
                name: "Notes".to_string(),
                description: Some("team notes".to_string()),
            }
        );
    }

    #[test]
    fn ids_and_numbers_are_validated() {
        let base = StoreConfig::default();
        assert!(parse_args(&args(&["forest", "not-a-uuid"]), base.clone()).is_err());
        assert!(parse_args(&args(&["--pool-size", "0", "list"]), base.clone()).is_err());
        assert!(parse_args(&args(&["purge", "--older-than-ms", "soon"]), base.clone()).is_err());
        assert!(parse_args(&args(&["--bogus", "list"]), base.clone()).is_err());
        assert!(parse_args(&args(&[]), base.clone()).is_err());

        let parsed = parse_args(&args(&["purge", "--older-than-ms", "42"]), base).expect("purge");
        assert_eq!(
            parsed.command,
            Command::Purge {
                older_than_ms: Some(42)
            }
        );
    }
}
