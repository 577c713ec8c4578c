// Copyright 2024 The pcachefs Authors.
// See the "LICENSE.txt" file at the top-level directory of this distribution.
//
// Licensed under the MIT license. This file may not be copied, modified,
// or distributed except according to those terms.

//! The caching engine: the orchestrator that ties the range algebra, the
//! cache store and the origin adapter together into `getattr`/`readdir`/`read`.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, trace};

use crate::errors::{Error, Result};
use crate::meta::{Listing, Stat};
use crate::origin::Origin;
use crate::range::{Range, RangeSet};
use crate::store::CacheStore;

/// The core orchestrator described in the design: populate-on-miss caching
/// of stat, directory listings, and byte ranges, plus a cache-only mode.
#[derive(Debug)]
pub struct Engine {
    store: CacheStore,
    origin: Origin,
    cache_only: AtomicBool,
}

impl Engine {
    /// Builds an engine over `store` and `origin`, starting with cache-only
    /// mode disabled.
    pub fn new(store: CacheStore, origin: Origin) -> Self {
        Self {
            store,
            origin,
            cache_only: AtomicBool::new(false),
        }
    }

    /// Whether cache-only mode is currently active.
    pub fn is_cache_only(&self) -> bool {
        self.cache_only.load(Ordering::SeqCst)
    }

    /// Enables or disables cache-only mode. O(1); has no effect on data
    /// already cached.
    pub fn set_cache_only(&self, enabled: bool) {
        debug!(enabled, "toggling cache-only mode");
        self.cache_only.store(enabled, Ordering::SeqCst);
    }

    /// Returns the cached stat for `path`, fetching and persisting it from
    /// the origin on first touch.
    pub fn getattr(&self, path: &Path) -> Result<Stat> {
        trace!(?path, "getattr");
        if let Some(stat) = self.store.load_stat(path)? {
            return Ok(stat);
        }

        if self.is_cache_only() {
            return Err(Error::CacheMiss { path: path.into() });
        }

        let stat = self.origin.stat(path)?;
        self.store.ensure_dir(path)?;
        self.store.store_stat(path, &stat)?;
        Ok(stat)
    }

    /// Returns the cached directory listing for `path`, fetching and
    /// persisting it from the origin on first touch.
    pub fn readdir(&self, path: &Path) -> Result<Listing> {
        trace!(?path, "readdir");
        if let Some(list) = self.store.load_list(path)? {
            return Ok(list);
        }

        if self.is_cache_only() {
            return Err(Error::CacheMiss { path: path.into() });
        }

        let list = self.origin.list(path)?;
        self.store.ensure_dir(path)?;
        self.store.store_list(path, &list)?;
        Ok(list)
    }

    /// Reads `size` bytes at `offset`, fetching and caching any portion of
    /// the request that is not yet covered. See module docs for the
    /// step-by-step algorithm.
    pub fn read(&self, path: &Path, offset: u64, size: u64, force_reload: bool) -> Result<Vec<u8>> {
        trace!(?path, offset, size, force_reload, "read");
        debug_assert!(size > 0, "callers must not issue zero-size reads");

        let stat = self.getattr(path)?;

        let want_end = offset.saturating_add(size).min(stat.size);
        if want_end <= offset {
            return Ok(Vec::new());
        }
        let query = Range::new(offset, want_end)?;

        // Determine what's uncovered without touching local state yet: a
        // forced reload acts as though the stored RangeSet were empty, so
        // the whole query is uncovered, but we must not actually clear it
        // (or create the sparse file) until we know we're allowed to fetch.
        let stored_ranges = self.store.read_ranges(path)?;
        let uncovered = if force_reload {
            vec![query]
        } else {
            stored_ranges.uncovered_within(query)
        };

        if !uncovered.is_empty() && self.is_cache_only() {
            return Err(Error::CacheMiss { path: path.into() });
        }

        self.store.init_data(path, stat.size)?;
        let mut ranges = if force_reload {
            self.store.clear_ranges(path)?;
            RangeSet::new()
        } else {
            stored_ranges
        };

        for gap in uncovered {
            let fetched = self.origin.read(path, gap.start(), gap.size())?;
            // Merge only the bytes actually written: a short origin read
            // must not be recorded as though the whole gap were covered.
            if fetched.is_empty() {
                continue;
            }
            self.store.splice_data(path, gap.start(), &fetched)?;
            let covered = Range::new(gap.start(), gap.start() + fetched.len() as u64)?;
            ranges = ranges.add(covered);
            self.store.write_ranges(path, &ranges)?;
        }

        let read_size = (want_end - offset).min(size);
        self.store.read_data(path, offset, read_size)
    }

    /// Rejects write-family operations targeted at the mirrored namespace.
    pub fn reject_write(op: &'static str, path: &Path) -> Error {
        Error::NotImplemented { op, path: path.into() }
    }
}
