use std::path::Path;

use assert_matches::assert_matches;

use super::SyntheticFs;
use crate::engine::Engine;
use crate::errors::Error;
use crate::meta::FileKind;
use crate::origin::Origin;
use crate::store::CacheStore;

fn setup() -> (tempfile::TempDir, tempfile::TempDir, Engine, SyntheticFs) {
    let origin_dir = tempfile::tempdir().unwrap();
    let cache_dir = tempfile::tempdir().unwrap();
    let engine = Engine::new(
        CacheStore::open(cache_dir.path()).unwrap(),
        Origin::new(origin_dir.path()),
    );
    let synthetic = SyntheticFs::new("/.pcachefs");
    (origin_dir, cache_dir, engine, synthetic)
}

#[test]
fn contains_matches_prefix_and_children_only() {
    let (_o, _c, _engine, synthetic) = setup();
    assert!(synthetic.contains(Path::new("/.pcachefs")));
    assert!(synthetic.contains(Path::new("/.pcachefs/cache_only")));
    assert!(!synthetic.contains(Path::new("/other")));
    assert!(!synthetic.contains(Path::new("/.pcachefsx")));
}

#[test]
fn readdir_lists_control_file() {
    let (_o, _c, _engine, synthetic) = setup();
    let names: Vec<_> = synthetic.readdir().into_iter().map(|e| e.name).collect();
    assert!(names.contains(&"cache_only".to_string()));
}

#[test]
fn getattr_reports_root_as_directory_and_control_file_as_regular() {
    let (_o, _c, _engine, synthetic) = setup();
    let root = synthetic.getattr(Path::new("/.pcachefs")).unwrap();
    assert_eq!(root.kind, FileKind::Directory);

    let control = synthetic.getattr(Path::new("/.pcachefs/cache_only")).unwrap();
    assert_eq!(control.kind, FileKind::RegularFile);
}

#[test]
fn read_reports_current_mode() {
    let (_o, _c, engine, synthetic) = setup();
    let path = Path::new("/.pcachefs/cache_only");

    assert_eq!(synthetic.read(path, &engine).unwrap(), b"0\n");
    engine.set_cache_only(true);
    assert_eq!(synthetic.read(path, &engine).unwrap(), b"1\n");
}

#[test]
fn write_toggles_engine_mode() {
    let (_o, _c, engine, synthetic) = setup();
    let path = Path::new("/.pcachefs/cache_only");

    synthetic.write(path, b"1", &engine).unwrap();
    assert!(engine.is_cache_only());

    synthetic.write(path, b"0\n", &engine).unwrap();
    assert!(!engine.is_cache_only());
}

#[test]
fn write_rejects_unrecognized_content() {
    let (_o, _c, engine, synthetic) = setup();
    let path = Path::new("/.pcachefs/cache_only");

    let err = synthetic.write(path, b"maybe", &engine).unwrap_err();
    assert_matches!(err, Error::Config { .. });
}
