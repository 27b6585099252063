#![forbid(unsafe_code)]

use bf_core::ids::WorkspaceId;
use bf_core::model::{BlockKind, Properties};
use bf_storage::{
    CreateBlockRequest, CreateWorkspaceRequest, FsFileStore, SqliteStore, StoreConfig,
};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn open_store() -> (TempDir, SqliteStore) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let files = FsFileStore::new(dir.path().join("objects"));
    let store = SqliteStore::open(&StoreConfig::new(dir.path().join("db")))
        .expect("open store")
        .with_file_store(Arc::new(files));
    (dir, store)
}

fn workspace(store: &SqliteStore) -> WorkspaceId {
    store
        .workspace_create(CreateWorkspaceRequest {
            name: "files".to_string(),
            description: None,
        })
        .expect("create workspace")
        .id
}

fn upload(root: &Path, object_path: &str) {
    let path = root.join("objects").join(object_path);
    std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    std::fs::write(path, b"bytes").expect("write upload");
}

fn with_temp_path(temp_path: &str) -> Properties {
    let mut properties = Properties::new();
    properties.insert("temp_path".to_string(), json!(temp_path));
    properties
}

#[test]
fn image_upload_is_placed_and_archived_on_delete() {
    let (dir, store) = open_store();
    let ws = workspace(&store);
    upload(dir.path(), "temp/images/cat.png");

    let image = store
        .create_block(
            CreateBlockRequest::root(ws, BlockKind::Image)
                .with_properties(with_temp_path("temp/images/cat.png")),
        )
        .expect("create image");

    let expected = format!("images/{}/cat.png", image.id);
    assert_eq!(image.properties.get("file_path"), Some(&json!(expected)));
    assert!(image.properties.get("temp_path").is_none());
    assert_eq!(store.get_block(&image.id).expect("reload"), image);
    assert!(dir.path().join("objects").join(&expected).is_file());

    store.delete_block(&image.id).expect("delete image");
    assert!(!dir.path().join("objects").join(&expected).exists());
    assert!(dir.path().join("objects/deleted").is_dir());
}

#[test]
fn file_store_failure_keeps_the_block() {
    let (_dir, store) = open_store();
    let ws = workspace(&store);

    let file = store
        .create_block(
            CreateBlockRequest::root(ws, BlockKind::File)
                .with_properties(with_temp_path("temp/files/missing.pdf")),
        )
        .expect("block survives a failed upload move");

    assert_eq!(
        file.properties.get("temp_path"),
        Some(&json!("temp/files/missing.pdf"))
    );
    assert!(file.properties.get("file_path").is_none());
    assert_eq!(store.get_block(&file.id).expect("reload"), file);
}

#[test]
fn non_file_kinds_never_touch_the_file_store() {
    let (dir, store) = open_store();
    let ws = workspace(&store);
    upload(dir.path(), "temp/files/notes.txt");

    let text = store
        .create_block(
            CreateBlockRequest::root(ws, BlockKind::Text)
                .with_properties(with_temp_path("temp/files/notes.txt")),
        )
        .expect("create text");
    assert!(text.properties.get("file_path").is_none());
    assert!(dir.path().join("objects/temp/files/notes.txt").is_file());
}
