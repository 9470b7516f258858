use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ─── Event Kind ───────────────────────────────────────────────────

/// Named event kinds delivered over a push session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    Connected,
    Telemetry,
    Status,
    Config,
    Log,
    Capture,
    AiResponse,
}

impl EventKind {
    pub const ALL: [Self; 7] = [
        Self::Connected,
        Self::Telemetry,
        Self::Status,
        Self::Config,
        Self::Log,
        Self::Capture,
        Self::AiResponse,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Telemetry => "telemetry",
            Self::Status => "status",
            Self::Config => "config",
            Self::Log => "log",
            Self::Capture => "capture",
            Self::AiResponse => "ai-response",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = TwindashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "connected" => Ok(Self::Connected),
            "telemetry" => Ok(Self::Telemetry),
            "status" => Ok(Self::Status),
            "config" => Ok(Self::Config),
            "log" => Ok(Self::Log),
            "capture" => Ok(Self::Capture),
            "ai-response" => Ok(Self::AiResponse),
            _ => Err(TwindashError::UnknownEventKind(s.to_string())),
        }
    }
}

// ─── Payloads ─────────────────────────────────────────────────────

/// Sensor readings pushed by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryPayload {
    pub temperature: f64,
    pub humidity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub light_dark: Option<bool>,
    /// Backend-formatted time label; keyed into the telemetry series as-is.
    pub time: String,
}

/// Device health snapshot plus an optional control mirror.
///
/// Every field is optional: the device publishes partial updates and
/// absent fields must be left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rssi: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub free_heap: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uptime: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub led_status: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub led_brightness: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub red_led_status: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servo_angle: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relay_status: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framesize: Option<u8>,
}

/// Full device configuration echo. All fields optional; the reconciler
/// overwrites only what is present (partial-merge rule).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigPayload {
    // Control mirror
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub led_status: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub led_brightness: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub red_led_status: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servo_angle: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relay_status: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framesize: Option<u8>,
    // Network
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wifi_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wifi_ssid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wifi_password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mqtt_broker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mqtt_port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dht_interval: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_interval: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_url: Option<String>,
    // Device health echoed alongside config
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rssi: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub free_heap: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uptime: Option<u64>,
    // Camera tuning
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brightness: Option<i8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contrast: Option<i8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saturation: Option<i8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_effect: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub white_balance: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aec: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gain_ctrl: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hmirror: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vflip: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bpc: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wpc: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lenc: Option<u8>,
}

/// Result of an asynchronous capture request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturePayload {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Response text from the device-side assistant pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiResponsePayload {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
}

// ─── Operation Log ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationResult {
    Pending,
    Success,
    Failed,
}

impl OperationResult {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for OperationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One record in the device operation log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationLogEntry {
    pub operation: String,
    pub result: OperationResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_msg: Option<String>,
    pub time: String,
    pub device_id: String,
}

// ─── Stream Event ─────────────────────────────────────────────────

/// Decoded push-session event: one variant per event kind.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Connected,
    Telemetry(TelemetryPayload),
    Status(StatusPayload),
    Config(ConfigPayload),
    Log(OperationLogEntry),
    CaptureResult(CapturePayload),
    AiResponse(AiResponsePayload),
}

impl StreamEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Connected => EventKind::Connected,
            Self::Telemetry(_) => EventKind::Telemetry,
            Self::Status(_) => EventKind::Status,
            Self::Config(_) => EventKind::Config,
            Self::Log(_) => EventKind::Log,
            Self::CaptureResult(_) => EventKind::Capture,
            Self::AiResponse(_) => EventKind::AiResponse,
        }
    }
}

// ─── Connection ───────────────────────────────────────────────────

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Error ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TwindashError {
    UnknownEventKind(String),
    MalformedFrame { expected: usize, got: usize },
}

impl fmt::Display for TwindashError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownEventKind(name) => write!(f, "unknown event kind: {name}"),
            Self::MalformedFrame { expected, got } => {
                write!(f, "malformed landmark frame: expected {expected} points, got {got}")
            }
        }
    }
}

impl std::error::Error for TwindashError {}

// ─── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_kind_display_and_parse() {
        for kind in EventKind::ALL {
            let s = kind.to_string();
            let parsed = s.parse::<EventKind>().expect("parse");
            assert_eq!(kind, parsed);
        }
    }

    #[test]
    fn event_kind_wire_names() {
        assert_eq!(EventKind::AiResponse.as_str(), "ai-response");
        assert_eq!(EventKind::Capture.as_str(), "capture");
        assert_eq!("telemetry".parse::<EventKind>(), Ok(EventKind::Telemetry));
    }

    #[test]
    fn unknown_event_kind_errors() {
        let err = "dht2".parse::<EventKind>().expect_err("must fail");
        assert_eq!(err, TwindashError::UnknownEventKind("dht2".to_string()));
        assert!(err.to_string().contains("dht2"));
    }

    #[test]
    fn telemetry_payload_parses_backend_json() {
        let json = r#"{"temperature":23.5,"humidity":61.0,"lightDark":true,"time":"12:00:05"}"#;
        let p: TelemetryPayload = serde_json::from_str(json).expect("parse");
        assert!((p.temperature - 23.5).abs() < f64::EPSILON);
        assert_eq!(p.light_dark, Some(true));
        assert_eq!(p.time, "12:00:05");
    }

    #[test]
    fn status_payload_partial_fields() {
        let json = r#"{"rssi":-55,"freeHeap":114688}"#;
        let p: StatusPayload = serde_json::from_str(json).expect("parse");
        assert_eq!(p.rssi, Some(-55));
        assert_eq!(p.free_heap, Some(114_688));
        assert!(p.uptime.is_none());
        assert!(p.led_status.is_none());
    }

    #[test]
    fn config_payload_camel_case_mapping() {
        let json = r#"{"ledBrightness":5,"mqttPort":1883,"specialEffect":2}"#;
        let p: ConfigPayload = serde_json::from_str(json).expect("parse");
        assert_eq!(p.led_brightness, Some(5));
        assert_eq!(p.mqtt_port, Some(1883));
        assert_eq!(p.special_effect, Some(2));
        assert!(p.wifi_ssid.is_none());
    }

    #[test]
    fn log_entry_serde_roundtrip() {
        let entry = OperationLogEntry {
            operation: "led".to_string(),
            result: OperationResult::Pending,
            result_msg: None,
            time: "12:00:00".to_string(),
            device_id: "cam-01".to_string(),
        };
        let json = serde_json::to_string(&entry).expect("serialize");
        assert!(json.contains(r#""result":"pending""#));
        assert!(json.contains(r#""deviceId":"cam-01""#));
        let back: OperationLogEntry = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(entry, back);
    }

    #[test]
    fn connection_state_default_is_disconnected() {
        assert_eq!(ConnectionState::default(), ConnectionState::Disconnected);
    }

    #[test]
    fn stream_event_kind_mapping() {
        assert_eq!(StreamEvent::Connected.kind(), EventKind::Connected);
        let ev = StreamEvent::Status(StatusPayload::default());
        assert_eq!(ev.kind(), EventKind::Status);
    }
}
