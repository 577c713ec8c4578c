use std::path::Path;

use assert_matches::assert_matches;

use super::CacheStore;
use crate::errors::Error;
use crate::meta::{DirEntry, FileKind};
use crate::range::Range;

fn open_store() -> (tempfile::TempDir, CacheStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = CacheStore::open(dir.path()).unwrap();
    (dir, store)
}

#[test]
fn rejects_path_without_leading_separator() {
    let (_dir, store) = open_store();
    let err = store.ensure_dir(Path::new("no/leading/slash")).unwrap_err();
    assert_matches!(err, Error::BadPath { .. });
}

#[test]
fn ranges_round_trip() {
    let (_dir, store) = open_store();
    let path = Path::new("/a/b/c");

    assert!(store.read_ranges(path).unwrap().is_empty());

    let set = crate::range::RangeSet::new().add(Range::new(10, 30).unwrap());
    store.write_ranges(path, &set).unwrap();

    let loaded = store.read_ranges(path).unwrap();
    assert_eq!(loaded, set);
}

#[test]
fn clear_ranges_is_idempotent() {
    let (_dir, store) = open_store();
    let path = Path::new("/a");
    store.clear_ranges(path).unwrap();

    let set = crate::range::RangeSet::new().add(Range::new(0, 10).unwrap());
    store.write_ranges(path, &set).unwrap();
    store.clear_ranges(path).unwrap();
    assert!(store.read_ranges(path).unwrap().is_empty());
    store.clear_ranges(path).unwrap();
}

#[test]
fn init_data_is_idempotent_and_sparse() {
    let (_dir, store) = open_store();
    let path = Path::new("/file.bin");

    store.init_data(path, 100).unwrap();
    store.init_data(path, 100).unwrap();

    let bytes = store.read_data(path, 0, 100).unwrap();
    assert_eq!(bytes.len(), 100);
    assert!(bytes.iter().all(|&b| b == 0));
}

#[test]
fn init_data_handles_zero_byte_files() {
    let (_dir, store) = open_store();
    let path = Path::new("/empty");
    store.init_data(path, 0).unwrap();
    let bytes = store.read_data(path, 0, 0).unwrap();
    assert!(bytes.is_empty());
}

#[test]
fn splice_then_read_data_round_trip() {
    let (_dir, store) = open_store();
    let path = Path::new("/file.bin");

    store.init_data(path, 50).unwrap();
    store.splice_data(path, 10, b"hello").unwrap();

    let read = store.read_data(path, 10, 5).unwrap();
    assert_eq!(&read, b"hello");
}

#[test]
fn stat_is_absent_until_stored() {
    let (_dir, store) = open_store();
    let path = Path::new("/file.bin");
    assert!(store.load_stat(path).unwrap().is_none());
}

#[test]
fn list_round_trips() {
    let (_dir, store) = open_store();
    let path = Path::new("/dir");

    assert!(store.load_list(path).unwrap().is_none());

    let entries = vec![
        DirEntry { name: ".".into(), kind: FileKind::Directory },
        DirEntry { name: "a".into(), kind: FileKind::RegularFile },
    ];
    store.store_list(path, &entries).unwrap();

    let loaded = store.load_list(path).unwrap().unwrap();
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded[1].name, "a");
}
