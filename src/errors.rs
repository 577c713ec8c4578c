// Copyright 2024 The pcachefs Authors.
// See the "LICENSE.txt" file at the top-level directory of this distribution.
//
// Licensed under the MIT license. This file may not be copied, modified,
// or distributed except according to those terms.

use std::path::PathBuf;

/// Information about a failure of an operation.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Cache-only mode is active and satisfying the request would require
    /// contacting the origin.
    #[error("cache miss in cache-only mode. Path: {path}")]
    CacheMiss { path: PathBuf },

    /// A write-family operation was attempted against a mirrored path.
    #[error("operation `{op}` is not implemented. Path: {path}")]
    NotImplemented { op: &'static str, path: PathBuf },

    /// `open` was attempted with non-read-only flags against a mirrored path.
    #[error("permission denied. Path: {path}")]
    PermissionDenied { path: PathBuf },

    /// A logical path did not begin with the expected leading separator.
    #[error("path does not start with a separator. Path: {path}")]
    BadPath { path: PathBuf },

    /// A `Range` was constructed with `end <= start`.
    #[error("invalid range [{start}, {end})")]
    InvalidRange { start: u64, end: u64 },

    /// A local or origin I/O operation failed.
    #[error("I/O failure. Path: {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A cache artifact failed to serialize or deserialize.
    #[error("failed to (de)serialize cache artifact. Path: {path}")]
    Serialization {
        path: PathBuf,
        #[source]
        source: bincode::Error,
    },

    /// The command-line configuration was invalid.
    #[error("invalid configuration: {message}")]
    Config { message: String },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn serialization(path: impl Into<PathBuf>, source: bincode::Error) -> Self {
        Self::Serialization {
            path: path.into(),
            source,
        }
    }

    /// Maps this error onto the closest POSIX errno, for replying to FUSE requests.
    #[must_use]
    pub fn to_errno(&self) -> i32 {
        match self {
            Self::CacheMiss { .. } => libc::ENODATA,
            Self::NotImplemented { .. } => libc::ENOSYS,
            Self::PermissionDenied { .. } => libc::EACCES,
            Self::BadPath { .. } | Self::InvalidRange { .. } | Self::Serialization { .. } => {
                libc::EIO
            }
            Self::Io { source, .. } => source.raw_os_error().unwrap_or(libc::EIO),
            Self::Config { .. } => libc::EINVAL,
        }
    }
}

/// Result of a fallible operation.
pub type Result<T> = core::result::Result<T, Error>;
