use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use mw_model::Position;

/// Rotation sync daemon for screen walls.
#[derive(Debug, Parser)]
#[command(name = "mw-walld", version, about)]
pub struct Cli {
    /// JSON configuration file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Tenant instance id, overrides the config file.
    #[arg(long, global = true)]
    pub instance: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the hosted pub/sub relay.
    Relay {
        /// Listen address, overrides the config file.
        #[arg(long)]
        listen: Option<String>,
    },
    /// Run one screen.
    Screen(ScreenArgs),
    /// Run a controller driven by commands on stdin.
    Controller(ControllerArgs),
    /// Run a controller and several screens in-process over the local transport.
    Demo(DemoArgs),
}

#[derive(Debug, Args)]
pub struct ScreenArgs {
    /// Content group; looked up from the snapshot assignments when omitted.
    #[arg(long)]
    pub group: Option<String>,

    /// Phase offset of this screen inside its group.
    #[arg(long = "pos", default_value_t = 0)]
    pub position: Position,
}

#[derive(Debug, Args)]
pub struct ControllerArgs {
    /// Content group the controller drives.
    #[arg(long)]
    pub group: String,
}

#[derive(Debug, Args)]
pub struct DemoArgs {
    /// Number of screens sharing the group.
    #[arg(long, default_value_t = 3)]
    pub screens: u32,

    /// Rotation interval in seconds.
    #[arg(long, default_value_t = 3)]
    pub interval: i64,

    /// Stop after this many seconds; runs until Ctrl-C when omitted.
    #[arg(long)]
    pub duration: Option<u64>,
}
