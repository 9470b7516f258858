//! Per-event-kind decoding: one pure decode function per [`StreamEvent`]
//! variant, selected by tag. Malformed payloads come back as errors the
//! caller logs and drops; they never abort the session.

use thiserror::Error;

use twindash_core::types::{EventKind, StreamEvent};

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("unknown event kind: {0}")]
    UnknownKind(String),

    #[error("malformed {kind} payload: {source}")]
    Payload {
        kind: EventKind,
        #[source]
        source: serde_json::Error,
    },
}

/// Decode one named wire event into its typed variant.
///
/// `connected` carries an informational greeting the reconciler does not
/// parse; every other kind is deserialized against its payload shape.
pub fn decode_event(name: &str, data: &str) -> Result<StreamEvent, DecodeError> {
    let kind: EventKind = name
        .parse()
        .map_err(|_| DecodeError::UnknownKind(name.to_string()))?;

    let payload = |source| DecodeError::Payload { kind, source };

    match kind {
        EventKind::Connected => Ok(StreamEvent::Connected),
        EventKind::Telemetry => serde_json::from_str(data)
            .map(StreamEvent::Telemetry)
            .map_err(payload),
        EventKind::Status => serde_json::from_str(data)
            .map(StreamEvent::Status)
            .map_err(payload),
        EventKind::Config => serde_json::from_str(data)
            .map(StreamEvent::Config)
            .map_err(payload),
        EventKind::Log => serde_json::from_str(data)
            .map(StreamEvent::Log)
            .map_err(payload),
        EventKind::Capture => serde_json::from_str(data)
            .map(StreamEvent::CaptureResult)
            .map_err(payload),
        EventKind::AiResponse => serde_json::from_str(data)
            .map(StreamEvent::AiResponse)
            .map_err(payload),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
