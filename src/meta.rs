// Copyright 2024 The pcachefs Authors.
// See the "LICENSE.txt" file at the top-level directory of this distribution.
//
// Licensed under the MIT license. This file may not be copied, modified,
// or distributed except according to those terms.

//! Metadata types shared by the origin adapter, the cache store, and the
//! FUSE dispatcher: a frozen `stat` snapshot and a directory entry.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Coarse file kind, derived from `st_mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileKind {
    RegularFile,
    Directory,
    Symlink,
    Other,
}

impl FileKind {
    #[must_use]
    pub fn from_mode(mode: u32) -> Self {
        match mode & libc::S_IFMT {
            libc::S_IFREG => Self::RegularFile,
            libc::S_IFDIR => Self::Directory,
            libc::S_IFLNK => Self::Symlink,
            _ => Self::Other,
        }
    }

    #[must_use]
    pub fn is_dir(self) -> bool {
        matches!(self, Self::Directory)
    }
}

/// A frozen snapshot of an origin path's metadata, as of first touch.
///
/// Carries the raw fields a `fuser::FileAttr` needs, plus enough of the raw
/// POSIX `stat` structure to reconstruct it faithfully.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Stat {
    /// Logical file size in bytes.
    pub size: u64,
    /// Number of 512-byte blocks allocated, as reported by the origin.
    pub blocks: u64,
    pub atime: SystemTimeSerde,
    pub mtime: SystemTimeSerde,
    pub ctime: SystemTimeSerde,
    /// Coarse kind derived from `mode`.
    pub kind: FileKind,
    /// Raw `st_mode`, including the file-type bits.
    pub mode: u32,
    pub nlink: u32,
    pub uid: u32,
    pub gid: u32,
    pub rdev: u32,
    pub blksize: u32,
    pub ino: u64,
    pub dev: u64,
}

impl Stat {
    /// Builds a `Stat` from a raw POSIX `libc::stat` structure.
    #[must_use]
    pub fn from_raw(st: &libc::stat) -> Self {
        Self {
            size: st.st_size.max(0) as u64,
            blocks: st.st_blocks.max(0) as u64,
            atime: SystemTimeSerde::from_secs_nsecs(st.st_atime, st.st_atime_nsec),
            mtime: SystemTimeSerde::from_secs_nsecs(st.st_mtime, st.st_mtime_nsec),
            ctime: SystemTimeSerde::from_secs_nsecs(st.st_ctime, st.st_ctime_nsec),
            kind: FileKind::from_mode(st.st_mode),
            mode: st.st_mode,
            nlink: st.st_nlink as u32,
            uid: st.st_uid,
            gid: st.st_gid,
            rdev: st.st_rdev as u32,
            blksize: st.st_blksize.max(0) as u32,
            ino: st.st_ino,
            dev: st.st_dev as u64,
        }
    }
}

/// A `SystemTime` that round-trips through `bincode`/`serde`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SystemTimeSerde {
    secs: i64,
    nanos: u32,
}

impl SystemTimeSerde {
    fn from_secs_nsecs(secs: i64, nsecs: i64) -> Self {
        Self {
            secs,
            nanos: nsecs.clamp(0, 999_999_999) as u32,
        }
    }

    /// The Unix epoch, used for synthetic entries with no real timestamp.
    #[must_use]
    pub fn epoch() -> Self {
        Self::from_secs_nsecs(0, 0)
    }

    #[must_use]
    pub fn to_system_time(self) -> SystemTime {
        if self.secs >= 0 {
            UNIX_EPOCH + Duration::new(self.secs as u64, self.nanos)
        } else {
            UNIX_EPOCH - Duration::new((-self.secs) as u64, self.nanos)
        }
    }
}

/// A single entry in a cached directory listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirEntry {
    pub name: String,
    pub kind: FileKind,
}

/// A cached directory listing, in the order returned by the origin.
pub type Listing = Vec<DirEntry>;
