// Copyright 2024 The pcachefs Authors.
// See the "LICENSE.txt" file at the top-level directory of this distribution.
//
// Licensed under the MIT license. This file may not be copied, modified,
// or distributed except according to those terms.

//! Command-line configuration.

use std::path::PathBuf;

use clap::Parser;

use crate::errors::{Error, Result};

/// Default prefix of the synthetic control namespace.
pub const DEFAULT_VIRTUAL_DIR: &str = ".pcachefs";

/// A persistently caching pass-through FUSE filesystem.
#[derive(Debug, Parser)]
#[command(name = "pcachefs", version, about)]
pub struct Cli {
    /// Directory holding cached data and metadata. Created if absent.
    #[arg(short = 'c', long = "cache-dir")]
    pub cache_dir: PathBuf,

    /// Source directory tree to mirror and cache, read-only.
    #[arg(short = 't', long = "target-dir")]
    pub target_dir: PathBuf,

    /// Path, relative to the mount point, at which the synthetic control
    /// namespace is exposed.
    #[arg(short = 'v', long = "virtual-dir", default_value = DEFAULT_VIRTUAL_DIR)]
    pub virtual_dir: String,

    /// Where to mount the filesystem.
    pub mount_point: PathBuf,

    /// Run in the foreground instead of daemonizing.
    #[arg(short = 'f', long = "foreground")]
    pub foreground: bool,

    /// Extra FUSE mount options, e.g. `-o allow_other`. May be repeated.
    #[arg(short = 'o', long = "option")]
    pub options: Vec<String>,
}

impl Cli {
    /// Parses `std::env::args`, validating the cross-field constraints clap
    /// cannot express on its own.
    pub fn parse_and_validate() -> Result<Self> {
        let cli = Self::parse();
        cli.validate()?;
        Ok(cli)
    }

    fn validate(&self) -> Result<()> {
        if !self.target_dir.is_dir() {
            return Err(Error::Config {
                message: format!("target directory does not exist: {}", self.target_dir.display()),
            });
        }
        if !self.mount_point.is_dir() {
            return Err(Error::Config {
                message: format!("mount point does not exist: {}", self.mount_point.display()),
            });
        }
        if self.virtual_dir.is_empty() || self.virtual_dir.contains('/') {
            return Err(Error::Config {
                message: format!(
                    "virtual directory must be a single non-empty path component, got {:?}",
                    self.virtual_dir
                ),
            });
        }
        Ok(())
    }

    /// The synthetic namespace's absolute path under the mirrored root.
    pub fn virtual_path(&self) -> PathBuf {
        PathBuf::from("/").join(&self.virtual_dir)
    }
}
