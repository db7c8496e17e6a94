//! One full sync pass over every configured group.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;

use groupsync_core::{config, Config};
use groupsync_sync::{
    pacing,
    pipeline::{self, RunOptions, SyncEvent},
    Getent, GwsClient, LocalGroupSource, MembershipApi,
};

/// Arguments for a sync pass.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Config file [default: conf/groups_sync.yml next to the executable].
    #[arg(long, env = "GROUPS_SYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Fetch and diff every group, but do not change remote membership.
    #[arg(long)]
    pub dry_run: bool,
}

impl SyncArgs {
    /// Returns `Ok(false)` when any group failed.
    pub fn run(self) -> Result<bool> {
        let path = match self.config {
            Some(path) => path,
            None => config::default_path().context("could not locate default config")?,
        };
        let cfg = config::load_at(&path)
            .with_context(|| format!("failed to load config from {}", path.display()))?;

        if cfg.group_map.is_empty() {
            println!("No groups configured in {}.", path.display());
            return Ok(true);
        }

        let api = GwsClient::from_config(&cfg)
            .context("could not set up Groups Web Service client")?;
        Ok(sync_pass(&cfg, &api, &Getent::default(), self.dry_run))
    }
}

/// Run every configured group and print status lines.
///
/// Returns `false` when any group failed.
fn sync_pass(
    cfg: &Config,
    api: &dyn MembershipApi,
    local: &dyn LocalGroupSource,
    dry_run: bool,
) -> bool {
    let mut pacer = if dry_run {
        pacing::from_interval(Duration::ZERO)
    } else {
        pacing::from_interval(cfg.pacing_interval())
    };

    let report = pipeline::run(
        cfg,
        api,
        local,
        pacer.as_mut(),
        RunOptions::from_config(cfg, dry_run),
        print_event,
    );
    !report.has_failures()
}

fn print_event(event: SyncEvent<'_>) {
    match event {
        SyncEvent::Batch(batch) => println!("{batch}"),
        SyncEvent::Group(outcome) => println!("{outcome}"),
        SyncEvent::Fatal(outcome) => {
            if let Some(err) = &outcome.error {
                println!("FATAL: {err}");
            }
        }
    }
}
