// Copyright 2024 The pcachefs Authors.
// See the "LICENSE.txt" file at the top-level directory of this distribution.
//
// Licensed under the MIT license. This file may not be copied, modified,
// or distributed except according to those terms.

//! The on-disk layout of the cache: for each logical path, a sparse data
//! file, a serialized range set, a serialized stat record, and (for
//! directories) a serialized listing.

use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use memmap2::Mmap;

use crate::errors::{Error, Result};
use crate::meta::{Listing, Stat};
use crate::range::RangeSet;

const DATA_FILE: &str = "cache.data";
const RANGE_FILE: &str = "cache.data.range";
const STAT_FILE: &str = "cache.stat";
const LIST_FILE: &str = "cache.list";

/// Translates logical paths into concrete local paths under the cache root,
/// and provides typed load/store operations for each artifact kind.
#[derive(Debug)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    /// Opens (creating if absent) a cache store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|source| Error::io(&root, source))?;
        Ok(Self { root })
    }

    /// Maps a logical path (which must start with `/`) to its cache directory.
    fn entry_dir(&self, path: &Path) -> Result<PathBuf> {
        let relative = path
            .strip_prefix("/")
            .map_err(|_| Error::BadPath { path: path.into() })?;
        Ok(self.root.join(relative))
    }

    /// Creates the cache directory for `path`, if it does not already exist.
    pub fn ensure_dir(&self, path: &Path) -> Result<()> {
        let dir = self.entry_dir(path)?;
        std::fs::create_dir_all(&dir).map_err(|source| Error::io(&dir, source))
    }

    /// Directory in which `path`'s own artifacts (or, for a directory path,
    /// its listing) are stored. Callers pass the parent when storing a
    /// directory's listing at the parent, per the on-disk layout.
    fn artifact_path(&self, path: &Path, name: &str) -> Result<PathBuf> {
        Ok(self.entry_dir(path)?.join(name))
    }

    fn read_bytes(path: &Path) -> Result<Option<Vec<u8>>> {
        match std::fs::read(path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::io(path, e)),
        }
    }

    fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| Error::io(parent, source))?;
        }
        std::fs::write(path, bytes).map_err(|source| Error::io(path, source))
    }

    /// Loads the `RangeSet` for `path`; an empty set if none is stored yet.
    pub fn read_ranges(&self, path: &Path) -> Result<RangeSet> {
        let blob_path = self.artifact_path(path, RANGE_FILE)?;
        match Self::read_bytes(&blob_path)? {
            Some(bytes) => {
                bincode::deserialize(&bytes).map_err(|source| Error::serialization(&blob_path, source))
            }
            None => Ok(RangeSet::new()),
        }
    }

    /// Persists `set` as the `RangeSet` for `path`.
    pub fn write_ranges(&self, path: &Path, set: &RangeSet) -> Result<()> {
        let blob_path = self.artifact_path(path, RANGE_FILE)?;
        let bytes = bincode::serialize(set).map_err(|source| Error::serialization(&blob_path, source))?;
        Self::write_bytes(&blob_path, &bytes)
    }

    /// Discards the stored `RangeSet` for `path`, if any. Used by forced reload.
    pub fn clear_ranges(&self, path: &Path) -> Result<()> {
        let blob_path = self.artifact_path(path, RANGE_FILE)?;
        match std::fs::remove_file(&blob_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::io(&blob_path, e)),
        }
    }

    /// Creates the sparse data file for `path` if absent, with logical
    /// length `size`. Idempotent. Zero-byte files are special-cased: an
    /// empty file is created directly, since seeking to `size - 1` would
    /// underflow.
    pub fn init_data(&self, path: &Path, size: u64) -> Result<()> {
        let data_path = self.artifact_path(path, DATA_FILE)?;
        if data_path.exists() {
            return Ok(());
        }
        if let Some(parent) = data_path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| Error::io(parent, source))?;
        }

        let mut file =
            File::create(&data_path).map_err(|source| Error::io(&data_path, source))?;
        if size > 0 {
            file.seek(SeekFrom::Start(size - 1))
                .map_err(|source| Error::io(&data_path, source))?;
            file.write_all(&[0u8])
                .map_err(|source| Error::io(&data_path, source))?;
        }
        Ok(())
    }

    /// Overwrites `bytes` into the sparse data file for `path`, at `offset`.
    pub fn splice_data(&self, path: &Path, offset: u64, bytes: &[u8]) -> Result<()> {
        let data_path = self.artifact_path(path, DATA_FILE)?;
        let mut file = OpenOptions::new()
            .write(true)
            .open(&data_path)
            .map_err(|source| Error::io(&data_path, source))?;
        file.seek(SeekFrom::Start(offset))
            .map_err(|source| Error::io(&data_path, source))?;
        file.write_all(bytes)
            .map_err(|source| Error::io(&data_path, source))
    }

    /// Reads `size` bytes at `offset` from the sparse data file for `path`,
    /// via a read-only mapping rather than a seek-and-read loop.
    pub fn read_data(&self, path: &Path, offset: u64, size: u64) -> Result<Vec<u8>> {
        if size == 0 {
            return Ok(Vec::new());
        }

        let data_path = self.artifact_path(path, DATA_FILE)?;
        let file = File::open(&data_path).map_err(|source| Error::io(&data_path, source))?;

        // SAFETY: `file` is a regular file we own exclusively within this
        // process; other processes never write into the cache root.
        let map = unsafe { Mmap::map(&file) }.map_err(|source| Error::io(&data_path, source))?;

        let start = (offset as usize).min(map.len());
        let end = start.saturating_add(size as usize).min(map.len());
        Ok(map[start..end].to_vec())
    }

    /// Loads the cached `Stat` for `path`, if present.
    pub fn load_stat(&self, path: &Path) -> Result<Option<Stat>> {
        let blob_path = self.artifact_path(path, STAT_FILE)?;
        match Self::read_bytes(&blob_path)? {
            Some(bytes) => {
                let stat = bincode::deserialize(&bytes)
                    .map_err(|source| Error::serialization(&blob_path, source))?;
                Ok(Some(stat))
            }
            None => Ok(None),
        }
    }

    /// Persists `stat` as the cached stat record for `path`. Write-once in
    /// practice: callers only invoke this on a cache miss.
    pub fn store_stat(&self, path: &Path, stat: &Stat) -> Result<()> {
        let blob_path = self.artifact_path(path, STAT_FILE)?;
        let bytes =
            bincode::serialize(stat).map_err(|source| Error::serialization(&blob_path, source))?;
        Self::write_bytes(&blob_path, &bytes)
    }

    /// Loads the cached directory listing for `path`, if present.
    pub fn load_list(&self, path: &Path) -> Result<Option<Listing>> {
        let blob_path = self.artifact_path(path, LIST_FILE)?;
        match Self::read_bytes(&blob_path)? {
            Some(bytes) => {
                let list = bincode::deserialize(&bytes)
                    .map_err(|source| Error::serialization(&blob_path, source))?;
                Ok(Some(list))
            }
            None => Ok(None),
        }
    }

    /// Persists `entries` as the cached directory listing for `path`.
    pub fn store_list(&self, path: &Path, entries: &Listing) -> Result<()> {
        let blob_path = self.artifact_path(path, LIST_FILE)?;
        let bytes = bincode::serialize(entries)
            .map_err(|source| Error::serialization(&blob_path, source))?;
        Self::write_bytes(&blob_path, &bytes)
    }
}

#[cfg(test)]
mod tests;
