//! Newline-delimited JSON event stream over TCP.
//!
//! Each line from the server is an envelope `{"event": <name>, "data":
//! <payload>}`. The payload may be a JSON value or a pre-encoded JSON
//! string; either way it is handed to the reconciler as raw text.
//! Malformed lines are skipped, end-of-stream and read errors surface
//! as transport failures so the reconnect schedule takes over.

use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::OwnedReadHalf;
use tokio::sync::mpsc;
use tracing::warn;

use twindash_reconciler::reconciler::{StreamTransport, TransportError, TransportEvent};

const STREAM_BUFFER: usize = 64;

pub struct TcpTransport {
    addr: String,
}

impl TcpTransport {
    pub fn new(addr: &str) -> Self {
        Self { addr: addr.to_string() }
    }
}

#[derive(Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    data: serde_json::Value,
}

impl StreamTransport for TcpTransport {
    async fn open(
        &self,
        device_id: &str,
    ) -> Result<mpsc::Receiver<TransportEvent>, TransportError> {
        let open_err = |reason: String| TransportError {
            device_id: device_id.to_string(),
            reason,
        };

        let stream = TcpStream::connect(&self.addr)
            .await
            .map_err(|e| open_err(e.to_string()))?;
        let (read_half, mut write_half) = stream.into_split();

        // One subscribe line, then the server pushes events.
        let subscribe = serde_json::json!({ "subscribe": device_id }).to_string() + "\n";
        write_half
            .write_all(subscribe.as_bytes())
            .await
            .map_err(|e| open_err(e.to_string()))?;

        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        tokio::spawn(read_lines(read_half, tx));
        Ok(rx)
    }
}

async fn read_lines(read_half: OwnedReadHalf, tx: mpsc::Sender<TransportEvent>) {
    let mut lines = BufReader::new(read_half).lines();

    if tx.send(TransportEvent::Opened).await.is_err() {
        return;
    }

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let envelope = match serde_json::from_str::<Envelope>(line) {
                    Ok(envelope) => envelope,
                    Err(err) => {
                        warn!(error = %err, "skipping malformed stream line");
                        continue;
                    }
                };
                // A string payload is already the raw text; anything
                // else gets re-encoded for the decoder.
                let data = match envelope.data {
                    serde_json::Value::String(raw) => raw,
                    other => other.to_string(),
                };
                let message = TransportEvent::Message { event: envelope.event, data };
                if tx.send(message).await.is_err() {
                    return;
                }
            }
            Ok(None) => {
                let _ = tx.send(TransportEvent::Failed("stream closed by peer".to_string())).await;
                return;
            }
            Err(err) => {
                let _ = tx.send(TransportEvent::Failed(err.to_string())).await;
                return;
            }
        }
    }
}
