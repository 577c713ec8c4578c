// Copyright 2024 The pcachefs Authors.
// See the "LICENSE.txt" file at the top-level directory of this distribution.
//
// Licensed under the MIT license. This file may not be copied, modified,
// or distributed except according to those terms.

//! The FUSE dispatcher: translates kernel requests, which are addressed by
//! inode, into calls against the caching engine and the synthetic control
//! namespace, which are both addressed by path.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};
use std::time::Duration;

use fuser::{
    FileAttr, FileType, Filesystem, ReplyAttr, ReplyData, ReplyDirectory, ReplyEmpty, ReplyEntry,
    ReplyOpen, ReplyWrite, Request,
};
use tracing::{error, trace, warn};

use crate::engine::Engine;
use crate::meta::{FileKind, Stat};
use crate::synthetic::SyntheticFs;

const ROOT_INO: u64 = 1;
/// How long the kernel may cache attributes and directory entries before
/// re-asking. Everything here is already cached on disk by the engine, so a
/// short TTL only controls kernel-side staleness, not ours.
const ATTR_TTL: Duration = Duration::from_secs(1);

/// Bidirectional map between FUSE inode numbers and the logical paths the
/// engine and synthetic namespace understand.
#[derive(Debug, Default)]
struct InodeTable {
    paths: HashMap<u64, PathBuf>,
    inodes: HashMap<PathBuf, u64>,
    next: u64,
}

impl InodeTable {
    fn new() -> Self {
        let mut table = Self {
            paths: HashMap::new(),
            inodes: HashMap::new(),
            next: ROOT_INO + 1,
        };
        table.paths.insert(ROOT_INO, PathBuf::from("/"));
        table.inodes.insert(PathBuf::from("/"), ROOT_INO);
        table
    }

    fn path_of(&self, ino: u64) -> Option<&Path> {
        self.paths.get(&ino).map(PathBuf::as_path)
    }

    fn ino_of(&mut self, path: &Path) -> u64 {
        if let Some(&ino) = self.inodes.get(path) {
            return ino;
        }
        let ino = self.next;
        self.next += 1;
        self.paths.insert(ino, path.to_path_buf());
        self.inodes.insert(path.to_path_buf(), ino);
        ino
    }
}

/// Implements `fuser::Filesystem` by routing each request, by path prefix,
/// to either the synthetic control namespace or the caching engine.
#[derive(Debug)]
pub struct Dispatcher {
    engine: Engine,
    synthetic: SyntheticFs,
    inodes: RwLock<InodeTable>,
    write_lock: Mutex<()>,
}

impl Dispatcher {
    /// Builds a dispatcher over `engine`, serving the synthetic control
    /// namespace at `synthetic`'s configured prefix.
    pub fn new(engine: Engine, synthetic: SyntheticFs) -> Self {
        Self {
            engine,
            synthetic,
            inodes: RwLock::new(InodeTable::new()),
            write_lock: Mutex::new(()),
        }
    }

    fn path_for(&self, ino: u64) -> Option<PathBuf> {
        self.inodes.read().unwrap().path_of(ino).map(Path::to_path_buf)
    }

    fn ino_for(&self, path: &Path) -> u64 {
        self.inodes.write().unwrap().ino_of(path)
    }

    fn stat_for(&self, path: &Path) -> crate::errors::Result<Stat> {
        if self.synthetic.contains(path) {
            self.synthetic.getattr(path)
        } else {
            self.engine.getattr(path)
        }
    }

    fn attr_of(&self, ino: u64, stat: &Stat) -> FileAttr {
        FileAttr {
            ino,
            size: stat.size,
            blocks: stat.blocks,
            atime: stat.atime.to_system_time(),
            mtime: stat.mtime.to_system_time(),
            ctime: stat.ctime.to_system_time(),
            crtime: stat.ctime.to_system_time(),
            kind: file_type_of(stat.kind),
            perm: (stat.mode & 0o7777) as u16,
            nlink: stat.nlink,
            uid: stat.uid,
            gid: stat.gid,
            rdev: stat.rdev,
            blksize: stat.blksize,
            flags: 0,
        }
    }
}

fn file_type_of(kind: FileKind) -> FileType {
    match kind {
        FileKind::RegularFile | FileKind::Other => FileType::RegularFile,
        FileKind::Directory => FileType::Directory,
        FileKind::Symlink => FileType::Symlink,
    }
}

impl Filesystem for Dispatcher {
    fn lookup(&mut self, _req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEntry) {
        let Some(parent_path) = self.path_for(parent) else {
            reply.error(libc::ENOENT);
            return;
        };
        let child_path = if parent_path == Path::new("/") {
            PathBuf::from("/").join(name)
        } else {
            parent_path.join(name)
        };

        match self.stat_for(&child_path) {
            Ok(stat) => {
                let ino = self.ino_for(&child_path);
                reply.entry(&ATTR_TTL, &self.attr_of(ino, &stat), 0);
            }
            Err(e) => {
                trace!(?child_path, error = %e, "lookup miss");
                reply.error(e.to_errno());
            }
        }
    }

    fn getattr(&mut self, _req: &Request<'_>, ino: u64, reply: ReplyAttr) {
        let Some(path) = self.path_for(ino) else {
            reply.error(libc::ENOENT);
            return;
        };
        match self.stat_for(&path) {
            Ok(stat) => reply.attr(&ATTR_TTL, &self.attr_of(ino, &stat)),
            Err(e) => reply.error(e.to_errno()),
        }
    }

    fn open(&mut self, _req: &Request<'_>, ino: u64, flags: i32, reply: ReplyOpen) {
        let Some(path) = self.path_for(ino) else {
            reply.error(libc::ENOENT);
            return;
        };
        if !self.synthetic.contains(&path) && (flags & (libc::O_WRONLY | libc::O_RDWR)) != 0 {
            warn!(?path, "rejecting write-mode open on mirrored path");
            reply.error(libc::EACCES);
            return;
        }
        reply.opened(0, 0);
    }

    fn read(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        size: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyData,
    ) {
        let Some(path) = self.path_for(ino) else {
            reply.error(libc::ENOENT);
            return;
        };
        let offset = offset.max(0) as u64;

        if self.synthetic.contains(&path) {
            match self.synthetic.read(&path, &self.engine) {
                Ok(bytes) => {
                    let start = (offset as usize).min(bytes.len());
                    let end = (start + size as usize).min(bytes.len());
                    reply.data(&bytes[start..end]);
                }
                Err(e) => reply.error(e.to_errno()),
            }
            return;
        }

        if size == 0 {
            reply.data(&[]);
            return;
        }

        match self.engine.read(&path, offset, u64::from(size), false) {
            Ok(bytes) => reply.data(&bytes),
            Err(e) => {
                error!(?path, error = %e, "read failed");
                reply.error(e.to_errno());
            }
        }
    }

    fn write(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        _offset: i64,
        data: &[u8],
        _write_flags: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyWrite,
    ) {
        let Some(path) = self.path_for(ino) else {
            reply.error(libc::ENOENT);
            return;
        };

        if self.synthetic.contains(&path) {
            let _guard = self.write_lock.lock().unwrap();
            match self.synthetic.write(&path, data, &self.engine) {
                Ok(n) => reply.written(n as u32),
                Err(e) => reply.error(e.to_errno()),
            }
            return;
        }

        reply.error(Engine::reject_write("write", &path).to_errno());
    }

    fn readdir(&mut self, _req: &Request<'_>, ino: u64, _fh: u64, offset: i64, mut reply: ReplyDirectory) {
        let Some(path) = self.path_for(ino) else {
            reply.error(libc::ENOENT);
            return;
        };

        let entries = if path == self.synthetic.prefix() {
            self.synthetic.readdir()
        } else if path == Path::new("/") {
            // Synthetic entries are yielded first, per the dispatcher's
            // root-listing contract.
            let mut merged = vec![crate::meta::DirEntry {
                name: self.synthetic.root_name(),
                kind: FileKind::Directory,
            }];
            match self.engine.readdir(&path) {
                Ok(list) => merged.extend(list),
                Err(e) => {
                    reply.error(e.to_errno());
                    return;
                }
            };
            merged
        } else {
            match self.engine.readdir(&path) {
                Ok(list) => list,
                Err(e) => {
                    reply.error(e.to_errno());
                    return;
                }
            }
        };

        for (i, entry) in entries.into_iter().enumerate().skip(offset as usize) {
            let child_path = if path == Path::new("/") {
                PathBuf::from("/").join(&entry.name)
            } else {
                path.join(&entry.name)
            };
            let child_ino = match entry.name.as_str() {
                "." => ino,
                ".." => {
                    if path == Path::new("/") {
                        ino
                    } else {
                        ROOT_INO
                    }
                }
                _ => self.ino_for(&child_path),
            };
            let full = reply.add(child_ino, (i + 1) as i64, file_type_of(entry.kind), &entry.name);
            if full {
                break;
            }
        }
        reply.ok();
    }

    fn flush(&mut self, _req: &Request<'_>, _ino: u64, _fh: u64, _lock_owner: u64, reply: ReplyEmpty) {
        reply.ok();
    }

    fn release(
        &mut self,
        _req: &Request<'_>,
        _ino: u64,
        _fh: u64,
        _flags: i32,
        _lock_owner: Option<u64>,
        _flush: bool,
        reply: ReplyEmpty,
    ) {
        reply.ok();
    }

    fn setattr(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _mode: Option<u32>,
        _uid: Option<u32>,
        _gid: Option<u32>,
        _size: Option<u64>,
        _atime: Option<fuser::TimeOrNow>,
        _mtime: Option<fuser::TimeOrNow>,
        _ctime: Option<std::time::SystemTime>,
        _fh: Option<u64>,
        _crtime: Option<std::time::SystemTime>,
        _chgtime: Option<std::time::SystemTime>,
        _bkuptime: Option<std::time::SystemTime>,
        _flags: Option<u32>,
        reply: ReplyAttr,
    ) {
        let path = self.path_for(ino).unwrap_or_else(|| PathBuf::from("/"));
        reply.error(Engine::reject_write("setattr", &path).to_errno());
    }
}
