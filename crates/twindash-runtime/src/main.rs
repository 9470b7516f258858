//! twindash: IoT device dashboard core runtime binary.
//!
//! `watch` follows one device's push-event stream through the
//! reconciler; `gesture` replays recorded hand landmark frames through
//! the classifier.

use clap::Parser;

mod cli;
mod cmd_gesture;
mod cmd_watch;
mod transport;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = std::env::var("TWINDASH_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .init();

    let args = cli::Cli::parse();
    match args.command {
        cli::Command::Watch(opts) => {
            cmd_watch::cmd_watch(&opts.device, &opts.addr, opts.interval_ms).await?;
        }
        cli::Command::Gesture(opts) => {
            cmd_gesture::cmd_gesture(&opts.frames)?;
        }
    }

    Ok(())
}
