mod app;
mod cli;
mod command;
mod config;

use clap::Parser;
use mw_model::InstanceId;
use mw_observe::{TZ_SYNC_PERIOD, init_local_offset, init_logger, timezone_sync};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{
    cli::{Cli, Command},
    config::WallConfig,
};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut cfg = WallConfig::load(cli.config.as_deref())?;
    if let Some(instance) = cli.instance.as_deref() {
        cfg.instance = InstanceId::from(instance);
    }

    // Offset detection is only sound while the process is single-threaded.
    init_local_offset();
    init_logger(&cfg.logger)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run(cli.command, cfg))
}

async fn run(command: Command, cfg: WallConfig) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();
    tokio::spawn(timezone_sync(TZ_SYNC_PERIOD, cancel.clone()));

    let signal = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("shutdown requested");
                signal.cancel();
            }
            Err(e) => warn!(error = %e, "ctrl-c handler unavailable"),
        }
    });

    info!(
        instance = %cfg.instance,
        transport = %cfg.transport.kind,
        "wall daemon starting"
    );

    let result = match command {
        Command::Relay { listen } => app::run_relay(&cfg, listen, cancel.clone()).await,
        Command::Screen(args) => app::run_screen(&cfg, args, cancel.clone()).await,
        Command::Controller(args) => app::run_controller(&cfg, args, cancel.clone()).await,
        Command::Demo(args) => app::run_demo(&cfg, args, cancel.clone()).await,
    };

    cancel.cancel();
    result
}
