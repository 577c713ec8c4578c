// Copyright 2024 The pcachefs Authors.
// See the "LICENSE.txt" file at the top-level directory of this distribution.
//
// Licensed under the MIT license. This file may not be copied, modified,
// or distributed except according to those terms.

//! The synthetic control namespace: a small in-memory filesystem, rooted at
//! a configurable prefix, that exposes runtime controls as ordinary files.
//!
//! Today this holds a single file, `cache_only`, whose contents toggle the
//! engine's cache-only mode.

use std::path::{Path, PathBuf};

use crate::engine::Engine;
use crate::errors::{Error, Result};
use crate::meta::{DirEntry, FileKind, Listing, Stat};

const CACHE_ONLY_FILE: &str = "cache_only";

/// The control file's contents when cache-only mode is disabled.
const DISABLED: &[u8] = b"0\n";
/// The control file's contents when cache-only mode is enabled.
const ENABLED: &[u8] = b"1\n";

/// Names and serves the virtual control namespace rooted at `prefix`.
#[derive(Debug)]
pub struct SyntheticFs {
    prefix: PathBuf,
}

impl SyntheticFs {
    /// Builds a synthetic namespace rooted at `prefix` (e.g. `/.pcachefs`).
    pub fn new(prefix: impl Into<PathBuf>) -> Self {
        Self { prefix: prefix.into() }
    }

    /// The namespace's root path.
    pub fn prefix(&self) -> &Path {
        &self.prefix
    }

    /// The namespace root's own file name, as it should appear as a single
    /// entry in the mirror root's directory listing.
    pub fn root_name(&self) -> String {
        self.prefix
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Whether `path` falls under this namespace (the root itself included).
    pub fn contains(&self, path: &Path) -> bool {
        path == self.prefix || path.starts_with(&self.prefix)
    }

    fn cache_only_path(&self) -> PathBuf {
        self.prefix.join(CACHE_ONLY_FILE)
    }

    /// Metadata for any path under this namespace.
    pub fn getattr(&self, path: &Path) -> Result<Stat> {
        if path == self.prefix {
            return Ok(synthetic_dir_stat());
        }
        if path == self.cache_only_path() {
            return Ok(synthetic_file_stat(control_len()));
        }
        Err(Error::Io {
            path: path.into(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        })
    }

    /// Lists the namespace root's own entries.
    pub fn readdir(&self) -> Listing {
        vec![
            DirEntry { name: ".".into(), kind: FileKind::Directory },
            DirEntry { name: "..".into(), kind: FileKind::Directory },
            DirEntry { name: CACHE_ONLY_FILE.into(), kind: FileKind::RegularFile },
        ]
    }

    /// Reads the control file at `path`, reporting the engine's current mode.
    pub fn read(&self, path: &Path, engine: &Engine) -> Result<Vec<u8>> {
        if path != self.cache_only_path() {
            return Err(Error::NotImplemented { op: "read", path: path.into() });
        }
        Ok(if engine.is_cache_only() { ENABLED.to_vec() } else { DISABLED.to_vec() })
    }

    /// Writes to the control file at `path`, toggling the engine's mode.
    ///
    /// Accepts `0` or `1` (with or without a trailing newline) and rejects
    /// anything else with [`Error::InvalidRange`]-shaped feedback via
    /// [`Error::Config`].
    pub fn write(&self, path: &Path, data: &[u8], engine: &Engine) -> Result<usize> {
        if path != self.cache_only_path() {
            return Err(Error::NotImplemented { op: "write", path: path.into() });
        }
        let trimmed = std::str::from_utf8(data)
            .unwrap_or_default()
            .trim();
        match trimmed {
            "0" => engine.set_cache_only(false),
            "1" => engine.set_cache_only(true),
            _ => {
                return Err(Error::Config {
                    message: format!("cache_only accepts `0` or `1`, got {trimmed:?}"),
                })
            }
        }
        Ok(data.len())
    }
}

fn control_len() -> u64 {
    ENABLED.len() as u64
}

fn synthetic_dir_stat() -> Stat {
    Stat {
        size: 0,
        blocks: 0,
        atime: crate::meta::SystemTimeSerde::epoch(),
        mtime: crate::meta::SystemTimeSerde::epoch(),
        ctime: crate::meta::SystemTimeSerde::epoch(),
        kind: FileKind::Directory,
        mode: 0o040_755,
        nlink: 2,
        uid: 0,
        gid: 0,
        rdev: 0,
        blksize: 512,
        ino: 0,
        dev: 0,
    }
}

fn synthetic_file_stat(size: u64) -> Stat {
    Stat {
        size,
        blocks: 0,
        atime: crate::meta::SystemTimeSerde::epoch(),
        mtime: crate::meta::SystemTimeSerde::epoch(),
        ctime: crate::meta::SystemTimeSerde::epoch(),
        kind: FileKind::RegularFile,
        mode: 0o100_644,
        nlink: 1,
        uid: 0,
        gid: 0,
        rdev: 0,
        blksize: 512,
        ino: 0,
        dev: 0,
    }
}

#[cfg(test)]
mod tests;
