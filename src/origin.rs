// Copyright 2024 The pcachefs Authors.
// See the "LICENSE.txt" file at the top-level directory of this distribution.
//
// Licensed under the MIT license. This file may not be copied, modified,
// or distributed except according to those terms.

//! A read-only facade over the directory tree being mirrored.

use std::ffi::CString;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::mem::MaybeUninit;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use crate::errors::{Error, Result};
use crate::meta::{DirEntry, FileKind, Listing, Stat};

/// A read-only view of a source tree rooted at a fixed local directory.
#[derive(Debug)]
pub struct Origin {
    root: PathBuf,
}

impl Origin {
    /// Creates an adapter rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Maps a logical path (which must start with `/`) to its real location.
    fn real_path(&self, path: &Path) -> Result<PathBuf> {
        let relative = path
            .strip_prefix("/")
            .map_err(|_| Error::BadPath { path: path.into() })?;
        Ok(self.root.join(relative))
    }

    /// Returns the metadata for `path`.
    pub fn stat(&self, path: &Path) -> Result<Stat> {
        let real = self.real_path(path)?;
        let raw = lstat(&real).map_err(|source| Error::io(&real, source))?;
        Ok(Stat::from_raw(&raw))
    }

    /// Lists `path`'s immediate children. `.` and `..` are prepended when
    /// `path` is a directory, matching this adapter's historical convention.
    pub fn list(&self, path: &Path) -> Result<Listing> {
        let real = self.real_path(path)?;

        let mut entries = Listing::new();
        if real.is_dir() {
            entries.push(DirEntry { name: ".".into(), kind: FileKind::Directory });
            entries.push(DirEntry { name: "..".into(), kind: FileKind::Directory });
        }

        let read_dir = std::fs::read_dir(&real).map_err(|source| Error::io(&real, source))?;
        for dir_entry in read_dir {
            let dir_entry = dir_entry.map_err(|source| Error::io(&real, source))?;
            let file_type = dir_entry
                .file_type()
                .map_err(|source| Error::io(&real, source))?;
            let kind = if file_type.is_dir() {
                FileKind::Directory
            } else if file_type.is_symlink() {
                FileKind::Symlink
            } else if file_type.is_file() {
                FileKind::RegularFile
            } else {
                FileKind::Other
            };
            entries.push(DirEntry {
                name: dir_entry.file_name().to_string_lossy().into_owned(),
                kind,
            });
        }

        Ok(entries)
    }

    /// Reads up to `size` bytes starting at `offset`. Returns fewer bytes
    /// only at end-of-file.
    pub fn read(&self, path: &Path, offset: u64, size: u64) -> Result<Vec<u8>> {
        let real = self.real_path(path)?;
        let mut file = File::open(&real).map_err(|source| Error::io(&real, source))?;
        file.seek(SeekFrom::Start(offset))
            .map_err(|source| Error::io(&real, source))?;

        let mut buf = vec![0u8; size as usize];
        let mut total = 0usize;
        loop {
            let n = file
                .read(&mut buf[total..])
                .map_err(|source| Error::io(&real, source))?;
            if n == 0 {
                break;
            }
            total += n;
            if total == buf.len() {
                break;
            }
        }
        buf.truncate(total);
        Ok(buf)
    }
}

/// Raw `lstat(2)`, so symlinks are reported as themselves rather than followed.
fn lstat(path: &Path) -> std::io::Result<libc::stat> {
    let c_path = CString::new(path.as_os_str().as_bytes())
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

    let mut st = MaybeUninit::<libc::stat>::zeroed();
    // SAFETY: `c_path` is a valid NUL-terminated C string, and `st` is a
    // suitably sized, suitably aligned buffer that `lstat` fully initializes
    // on success.
    let rc = unsafe { libc::lstat(c_path.as_ptr(), st.as_mut_ptr()) };
    if rc == 0 {
        Ok(unsafe { st.assume_init() })
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(test)]
mod tests;
