#![forbid(unsafe_code)]

//! Object storage for `image` and `file` blocks.
//!
//! The store only records the resulting path in `properties.file_path`; file moves are
//! never part of a block transaction.

use super::support::now_ms;
use bf_core::ids::BlockId;
use bf_core::model::BlockKind;
use std::path::{Component, Path, PathBuf};

pub const TEMP_PREFIX: &str = "temp";
pub const IMAGES_PREFIX: &str = "images";
pub const FILES_PREFIX: &str = "files";
pub const DELETED_PREFIX: &str = "deleted";

#[derive(Debug, thiserror::Error)]
pub enum FileStoreError {
    #[error("invalid object path: {0}")]
    InvalidPath(String),

    #[error("object not found: {0}")]
    Missing(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub trait FileStore: Send + Sync {
    /// Moves an upload (or the block's most recently archived file) to its permanent,
    /// block-scoped location and returns that path. `Ok(None)` when there is nothing to place.
    fn materialize(
        &self,
        block_id: &BlockId,
        kind: BlockKind,
        temp_path: Option<&str>,
    ) -> Result<Option<String>, FileStoreError>;

    /// Moves a stored file under the archive prefix and returns its archived path.
    fn archive(&self, file_path: &str) -> Result<String, FileStoreError>;

    /// Drops archived files older than the cutoff; returns how many were removed.
    fn purge_archived(&self, _older_than_ms: i64) -> Result<usize, FileStoreError> {
        Ok(0)
    }
}

/// Collaborator for deployments without object storage.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoFileStore;

impl FileStore for NoFileStore {
    fn materialize(
        &self,
        _block_id: &BlockId,
        _kind: BlockKind,
        _temp_path: Option<&str>,
    ) -> Result<Option<String>, FileStoreError> {
        Ok(None)
    }

    fn archive(&self, file_path: &str) -> Result<String, FileStoreError> {
        Ok(file_path.to_string())
    }
}

/// Object storage on the local filesystem. Paths are `/`-separated and relative to `root`:
/// uploads live under `temp/`, placed files under `images/<block_id>/` or
/// `files/<block_id>/`, archived files under `deleted/<archived_at_ms>/<original path>`.
#[derive(Clone, Debug)]
pub struct FsFileStore {
    root: PathBuf,
}

impl FsFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of a store-relative object path.
    pub fn resolve(&self, object_path: &str) -> Result<PathBuf, FileStoreError> {
        let relative = Path::new(object_path);
        let clean = !object_path.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !clean {
            return Err(FileStoreError::InvalidPath(object_path.to_string()));
        }
        Ok(self.root.join(relative))
    }

    fn move_object(&self, from: &str, to: &str) -> Result<(), FileStoreError> {
        let source = self.resolve(from)?;
        if !source.is_file() {
            return Err(FileStoreError::Missing(from.to_string()));
        }
        let target = self.resolve(to)?;
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::rename(&source, &target)?;
        Ok(())
    }

    fn placed_path(block_id: &BlockId, kind: BlockKind, file_name: &str) -> String {
        let prefix = match kind {
            BlockKind::Image => IMAGES_PREFIX,
            _ => FILES_PREFIX,
        };
        format!("{prefix}/{block_id}/{file_name}")
    }

    /// Newest archived object whose path mentions `block_id`.
    fn latest_archived(&self, block_id: &BlockId) -> Result<Option<String>, FileStoreError> {
        let needle = block_id.to_string();
        let mut best: Option<(i64, String)> = None;
        for (archived_at_ms, object_path) in self.archived_objects()? {
            if !object_path.contains(&needle) {
                continue;
            }
            if best.as_ref().is_none_or(|(at, _)| archived_at_ms > *at) {
                best = Some((archived_at_ms, object_path));
            }
        }
        Ok(best.map(|(_, path)| path))
    }

    /// `(archived_at_ms, object_path)` for every file under the archive prefix.
    fn archived_objects(&self) -> Result<Vec<(i64, String)>, FileStoreError> {
        let archive_root = self.root.join(DELETED_PREFIX);
        if !archive_root.is_dir() {
            return Ok(Vec::new());
        }
        let mut out = Vec::new();
        for entry in std::fs::read_dir(&archive_root)? {
            let entry = entry?;
            let Some(archived_at_ms) = entry
                .file_name()
                .to_str()
                .and_then(|name| name.parse::<i64>().ok())
            else {
                continue;
            };
            let mut stack = vec![entry.path()];
            while let Some(dir) = stack.pop() {
                for child in std::fs::read_dir(&dir)? {
                    let child = child?;
                    let path = child.path();
                    if child.file_type()?.is_dir() {
                        stack.push(path);
                    } else if let Some(object_path) = self.object_path_of(&path) {
                        out.push((archived_at_ms, object_path));
                    }
                }
            }
        }
        Ok(out)
    }

    fn object_path_of(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let parts: Option<Vec<&str>> = relative
            .components()
            .map(|component| component.as_os_str().to_str())
            .collect();
        Some(parts?.join("/"))
    }
}

impl FileStore for FsFileStore {
    fn materialize(
        &self,
        block_id: &BlockId,
        kind: BlockKind,
        temp_path: Option<&str>,
    ) -> Result<Option<String>, FileStoreError> {
        if let Some(archived) = self.latest_archived(block_id)? {
            let file_name = file_name_of(&archived)?;
            let placed = Self::placed_path(block_id, kind, file_name);
            self.move_object(&archived, &placed)?;
            tracing::debug!(%block_id, from = %archived, to = %placed, "restored archived file");
            return Ok(Some(placed));
        }

        let Some(temp_path) = temp_path else {
            return Ok(None);
        };
        if !temp_path.starts_with(&format!("{TEMP_PREFIX}/")) {
            return Err(FileStoreError::InvalidPath(temp_path.to_string()));
        }
        let placed = Self::placed_path(block_id, kind, file_name_of(temp_path)?);
        self.move_object(temp_path, &placed)?;
        Ok(Some(placed))
    }

    fn archive(&self, file_path: &str) -> Result<String, FileStoreError> {
        let archived = format!("{DELETED_PREFIX}/{}/{file_path}", now_ms());
        self.move_object(file_path, &archived)?;
        Ok(archived)
    }

    fn purge_archived(&self, older_than_ms: i64) -> Result<usize, FileStoreError> {
        let archive_root = self.root.join(DELETED_PREFIX);
        if !archive_root.is_dir() {
            return Ok(0);
        }
        let mut removed = 0;
        for entry in std::fs::read_dir(&archive_root)? {
            let entry = entry?;
            let expired = entry
                .file_name()
                .to_str()
                .and_then(|name| name.parse::<i64>().ok())
                .is_some_and(|archived_at_ms| archived_at_ms <= older_than_ms);
            if expired && entry.file_type()?.is_dir() {
                std::fs::remove_dir_all(entry.path())?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

fn file_name_of(object_path: &str) -> Result<&str, FileStoreError> {
    match object_path.rsplit('/').next() {
        Some(name) if !name.is_empty() => Ok(name),
        _ => Err(FileStoreError::InvalidPath(object_path.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(store: &FsFileStore, object_path: &str, body: &str) {
        let path = store.resolve(object_path).expect("resolve");
        std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        std::fs::write(path, body).expect("write");
    }

    #[test]
    fn upload_is_moved_under_block_prefix() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = FsFileStore::new(dir.path());
        let block_id = BlockId::new_v4();
        upload(&store, "temp/images/cat.png", "png");

        let placed = store
            .materialize(&block_id, BlockKind::Image, Some("temp/images/cat.png"))
            .expect("materialize")
            .expect("placed");
        assert_eq!(placed, format!("images/{block_id}/cat.png"));
        assert!(store.resolve(&placed).expect("resolve").is_file());
        assert!(!dir.path().join("temp/images/cat.png").exists());
    }

    #[test]
    fn archived_file_is_restored_before_upload() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = FsFileStore::new(dir.path());
        let block_id = BlockId::new_v4();
        upload(&store, &format!("files/{block_id}/report.pdf"), "v1");

        let archived = store
            .archive(&format!("files/{block_id}/report.pdf"))
            .expect("archive");
        assert!(archived.starts_with("deleted/"));
        assert!(store.resolve(&archived).expect("resolve").is_file());

        let restored = store
            .materialize(&block_id, BlockKind::File, None)
            .expect("materialize");
        assert_eq!(restored, Some(format!("files/{block_id}/report.pdf")));
        assert_eq!(
            std::fs::read_to_string(dir.path().join(format!("files/{block_id}/report.pdf")))
                .expect("read"),
            "v1"
        );
    }

    #[test]
    fn paths_outside_the_root_are_rejected() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = FsFileStore::new(dir.path());
        assert!(matches!(
            store.resolve("../etc/passwd"),
            Err(FileStoreError::InvalidPath(_))
        ));
        assert!(matches!(
            store.materialize(&BlockId::new_v4(), BlockKind::File, Some("files/x.txt")),
            Err(FileStoreError::InvalidPath(_))
        ));
        assert!(matches!(
            store.materialize(&BlockId::new_v4(), BlockKind::File, Some("temp/missing.txt")),
            Err(FileStoreError::Missing(_))
        ));
    }

    #[test]
    fn purge_archived_drops_expired_batches_only() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = FsFileStore::new(dir.path());
        upload(&store, "deleted/100/files/a/old.txt", "old");
        upload(&store, "deleted/900/files/b/new.txt", "new");

        assert_eq!(store.purge_archived(500).expect("purge"), 1);
        assert!(!dir.path().join("deleted/100").exists());
        assert!(dir.path().join("deleted/900/files/b/new.txt").is_file());
    }
}
