//! Catalog and filesystem-store integration tests.

use std::fs;
use tempfile::TempDir;
use uds_core::directory::{self, NameIndex};
use uds_core::error::UdsError;
use uds_core::store::{ObjectStore, list_all_children};
use uds_core::store_fs::FsStore;
use uds_core::store_mem::MemoryStore;
use uds_core::{PullOptions, PushOptions, RetryPolicy, pull, push};

fn small_opts() -> PushOptions {
    PushOptions {
        chunk_read_bytes: 6,
        max_encoded_object_bytes: 8,
        retry: RetryPolicy::immediate(3),
        ..Default::default()
    }
}

#[test]
fn list_all_reports_pushed_files() {
    let dir = TempDir::new().unwrap();
    let store = MemoryStore::new();

    for name in ["alpha.bin", "beta.bin", "gamma.txt"] {
        let src = dir.path().join(name);
        fs::write(&src, b"hello uds hello").unwrap();
        push(&store, &src, Some(&small_opts())).unwrap();
    }

    let all = directory::list_all(&store, None).unwrap();
    assert_eq!(all.len(), 3);
    for lf in &all {
        assert_eq!(lf.byte_size, Some(15));
        assert!(lf.digest.is_some());
    }

    let filtered = directory::list_all(&store, Some("BETA")).unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].name, "beta.bin");
}

#[test]
fn delete_container_removes_chunks_too() {
    let dir = TempDir::new().unwrap();
    let store = MemoryStore::new();
    let src = dir.path().join("gone.bin");
    fs::write(&src, vec![7u8; 30]).unwrap();

    let summary = push(&store, &src, Some(&small_opts())).unwrap();
    assert_eq!(list_all_children(&store, &summary.container_id).unwrap().len(), 5);

    directory::delete_container(&store, &summary.container_id).unwrap();
    assert!(matches!(
        store.get_object(&summary.container_id),
        Err(UdsError::NotFound(_))
    ));
    assert!(list_all_children(&store, &summary.container_id).unwrap().is_empty());
}

#[test]
fn name_index_refresh_mirrors_catalog() {
    let dir = TempDir::new().unwrap();
    let store = MemoryStore::new();
    let src = dir.path().join("tracked.bin");
    fs::write(&src, b"indexed").unwrap();
    let summary = push(&store, &src, Some(&small_opts())).unwrap();

    let index_path = dir.path().join("index.json");
    let mut index = NameIndex::load(&index_path).unwrap();
    index.refresh(&store).unwrap();
    assert_eq!(index.resolve("tracked.bin").unwrap(), summary.container_id);
}

#[test]
fn fs_store_round_trip_across_instances() {
    let dir = TempDir::new().unwrap();
    let store_dir = dir.path().join("store");
    let data: Vec<u8> = (0..5000u32).map(|i| (i % 233) as u8).collect();
    let src = dir.path().join("persist.bin");
    fs::write(&src, &data).unwrap();

    let container_id = {
        let store = FsStore::open(&store_dir).unwrap();
        push(&store, &src, Some(&small_opts())).unwrap().container_id
    };

    // Fresh instance over the same directory, as a second CLI run would see.
    let store = FsStore::open(&store_dir).unwrap();
    let out = pull(
        &store,
        &container_id,
        &dir.path().join("dl"),
        Some(&PullOptions {
            retry: RetryPolicy::immediate(3),
        }),
    )
    .unwrap();
    assert_eq!(fs::read(out).unwrap(), data);

    let all = directory::list_all(&store, None).unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].name, "persist.bin");
}
