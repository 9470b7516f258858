//! CLI definition using clap derive.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "twindash", about = "IoT device dashboard core")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Follow a device's event stream and print state snapshots
    Watch(WatchOpts),
    /// Replay recorded hand landmark frames through the gesture classifier
    Gesture(GestureOpts),
}

#[derive(clap::Args)]
pub struct WatchOpts {
    /// Device id to subscribe to
    pub device: String,

    /// Event stream endpoint (host:port)
    #[arg(long, env = "TWINDASH_ADDR", default_value = "127.0.0.1:8080")]
    pub addr: String,

    /// Snapshot poll interval in milliseconds
    #[arg(long, default_value = "500")]
    pub interval_ms: u64,
}

#[derive(clap::Args)]
pub struct GestureOpts {
    /// NDJSON file of landmark frames, one 21-point frame per line
    /// ("null" or a blank line means no hand detected); "-" reads stdin
    pub frames: String,
}
