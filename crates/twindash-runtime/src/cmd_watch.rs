//! `twindash watch` — follow one device's event stream.
//!
//! Polls the reconciler's change-tracking version and prints a JSON
//! snapshot whenever the canonical state moved; one-shot capture and
//! AI notifications are printed as they arrive.

use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

use twindash_reconciler::reconciler::{Notification, StreamReconciler};
use twindash_reconciler::state::StateVersion;

use crate::transport::TcpTransport;

/// Entry point for `twindash watch`.
pub async fn cmd_watch(device: &str, addr: &str, interval_ms: u64) -> anyhow::Result<()> {
    let reconciler = StreamReconciler::new(TcpTransport::new(addr), device);
    let mut notifications = reconciler.subscribe();
    reconciler.connect().await?;
    tracing::info!(device, addr, "watching device stream");

    let mut seen: StateVersion = 0;
    loop {
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_millis(interval_ms)) => {
                if reconciler.changed_since(seen).await {
                    let state = reconciler.snapshot().await;
                    seen = state.version();
                    println!("{}", serde_json::to_string_pretty(&state)?);
                }
            }
            notification = notifications.recv() => {
                let stamp = chrono::Local::now().format("%H:%M:%S");
                match notification {
                    Ok(Notification::Capture(payload)) => {
                        if payload.success {
                            let url = payload.image_url.as_deref().unwrap_or("(no image url)");
                            println!("[{stamp}] capture ready: {url}");
                        } else {
                            let msg = payload.message.as_deref().unwrap_or("unknown error");
                            println!("[{stamp}] capture failed: {msg}");
                        }
                    }
                    Ok(Notification::Ai(payload)) => {
                        println!("[{stamp}] ai: {}", payload.text);
                        if let Some(audio) = payload.audio_url.as_deref() {
                            println!("[{stamp}] ai audio: {audio}");
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "notification subscriber lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    reconciler.disconnect().await;
    Ok(())
}
