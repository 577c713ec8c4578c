// Copyright 2024 The pcachefs Authors.
// See the "LICENSE.txt" file at the top-level directory of this distribution.
//
// Licensed under the MIT license. This file may not be copied, modified,
// or distributed except according to those terms.

use fuser::MountOption;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pcachefs::config::Cli;
use pcachefs::engine::Engine;
use pcachefs::errors::Result;
use pcachefs::fs::Dispatcher;
use pcachefs::origin::Origin;
use pcachefs::store::CacheStore;
use pcachefs::synthetic::SyntheticFs;

fn mount_options(cli: &Cli) -> Vec<MountOption> {
    let mut options = vec![MountOption::RO, MountOption::FSName("pcachefs".into())];
    for raw in &cli.options {
        options.push(match raw.as_str() {
            "allow_other" => MountOption::AllowOther,
            "allow_root" => MountOption::AllowRoot,
            "auto_unmount" => MountOption::AutoUnmount,
            "default_permissions" => MountOption::DefaultPermissions,
            other => MountOption::CUSTOM(other.to_owned()),
        });
    }
    options
}

fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse_and_validate()?;
    // fuser has no daemonizing primitive; `--foreground` is accepted for CLI
    // compatibility but mount2 always runs on the calling thread.
    let _ = cli.foreground;

    let store = CacheStore::open(&cli.cache_dir)?;
    let origin = Origin::new(&cli.target_dir);
    let engine = Engine::new(store, origin);
    let synthetic = SyntheticFs::new(cli.virtual_path());
    let dispatcher = Dispatcher::new(engine, synthetic);

    info!(
        cache_dir = %cli.cache_dir.display(),
        target_dir = %cli.target_dir.display(),
        mount_point = %cli.mount_point.display(),
        "mounting pcachefs",
    );

    fuser::mount2(dispatcher, &cli.mount_point, &mount_options(&cli))
        .map_err(|source| pcachefs::errors::Error::io(&cli.mount_point, source))
}

fn main() {
    if let Err(e) = run() {
        eprintln!("pcachefs: {e}");
        std::process::exit(1);
    }
}
