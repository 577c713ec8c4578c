use std::path::Path;

use super::Origin;
use crate::meta::FileKind;

fn setup() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("file.txt"), b"hello world").unwrap();
    std::fs::create_dir(dir.path().join("sub")).unwrap();
    std::fs::write(dir.path().join("sub").join("nested.txt"), b"nested").unwrap();
    dir
}

#[test]
fn stat_classifies_file_and_directory() {
    let dir = setup();
    let origin = Origin::new(dir.path());

    let file_stat = origin.stat(Path::new("/file.txt")).unwrap();
    assert_eq!(file_stat.kind, FileKind::RegularFile);
    assert_eq!(file_stat.size, 11);

    let dir_stat = origin.stat(Path::new("/sub")).unwrap();
    assert_eq!(dir_stat.kind, FileKind::Directory);
}

#[test]
fn list_root_includes_dot_entries_and_children() {
    let dir = setup();
    let origin = Origin::new(dir.path());

    let entries = origin.list(Path::new("/")).unwrap();
    let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
    assert!(names.contains(&"."));
    assert!(names.contains(&".."));
    assert!(names.contains(&"file.txt"));
    assert!(names.contains(&"sub"));
}

#[test]
fn read_returns_exact_slice() {
    let dir = setup();
    let origin = Origin::new(dir.path());

    let bytes = origin.read(Path::new("/file.txt"), 6, 5).unwrap();
    assert_eq!(&bytes, b"world");
}

#[test]
fn read_truncates_at_end_of_file() {
    let dir = setup();
    let origin = Origin::new(dir.path());

    let bytes = origin.read(Path::new("/file.txt"), 6, 100).unwrap();
    assert_eq!(&bytes, b"world");
}
