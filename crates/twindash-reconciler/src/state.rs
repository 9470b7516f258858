//! Canonical device state: the single store every stream event is
//! reconciled into.
//!
//! Reconciliation rules:
//!
//! - `telemetry` overwrites current readings and appends to the
//!   telemetry series, keyed by the payload's own time label.
//! - `status` and `config` are partial merges: absent fields are left
//!   untouched, never zeroed. The status series point is stamped with a
//!   locally generated timestamp, not a payload-supplied one.
//! - `log` goes through the pending → resolved merge.
//!
//! Observers poll the monotonic version counter instead of registering
//! callbacks; every applied change bumps it exactly once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use twindash_core::oplog::OperationLog;
use twindash_core::series::BoundedSeries;
use twindash_core::types::{
    ConfigPayload, ConnectionState, OperationLogEntry, StatusPayload, StreamEvent,
    TelemetryPayload,
};

/// Monotonic version counter for change tracking.
pub type StateVersion = u64;

// ─── Chart Points ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryPoint {
    /// Backend-formatted time label, taken from the payload.
    pub time: String,
    pub temperature: f64,
    pub humidity: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusPoint {
    /// Locally generated timestamp (status payloads carry none).
    pub time: DateTime<Utc>,
    pub rssi: i32,
    pub free_heap: u32,
}

// ─── Current Values ──────────────────────────────────────────────────

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentTelemetry {
    pub temperature: f64,
    pub humidity: f64,
    pub light_dark: bool,
    pub time: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceHealth {
    pub rssi: i32,
    pub free_heap: u32,
    pub uptime: u64,
}

/// Mirror of the device's controllable outputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlMirror {
    pub led_status: bool,
    pub led_brightness: u8,
    pub red_led_status: bool,
    pub servo_angle: u16,
    pub relay_status: bool,
    pub framesize: u8,
}

impl Default for ControlMirror {
    fn default() -> Self {
        Self {
            led_status: false,
            led_brightness: 0,
            red_led_status: false,
            servo_angle: 0,
            relay_status: false,
            // Device boots streaming at framesize 11 (HD).
            framesize: 11,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub wifi_ip: String,
    pub wifi_ssid: String,
    pub wifi_password: String,
    pub mqtt_broker: String,
    pub mqtt_port: u16,
    pub dht_interval: u64,
    pub status_interval: u64,
    pub upload_url: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            wifi_ip: String::new(),
            wifi_ssid: String::new(),
            wifi_password: String::new(),
            mqtt_broker: String::new(),
            mqtt_port: 1883,
            dht_interval: 5_000,
            status_interval: 30_000,
            upload_url: String::new(),
        }
    }
}

/// Camera sensor tuning mirror. Defaults match the sensor's power-on
/// register values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraConfig {
    pub brightness: i8,
    pub contrast: i8,
    pub saturation: i8,
    pub quality: u8,
    pub special_effect: u8,
    pub white_balance: u8,
    pub aec: u8,
    pub gain_ctrl: u8,
    pub hmirror: u8,
    pub vflip: u8,
    pub bpc: u8,
    pub wpc: u8,
    pub lenc: u8,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            brightness: 0,
            contrast: 0,
            saturation: 0,
            quality: 10,
            special_effect: 0,
            white_balance: 1,
            aec: 1,
            gain_ctrl: 1,
            hmirror: 0,
            vflip: 0,
            bpc: 0,
            wpc: 1,
            lenc: 1,
        }
    }
}

// ─── Device State ────────────────────────────────────────────────────

/// The canonical state object for one device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceState {
    pub device_id: String,
    pub connection: ConnectionState,
    pub telemetry: CurrentTelemetry,
    pub telemetry_history: BoundedSeries<TelemetryPoint>,
    pub health: DeviceHealth,
    pub status_history: BoundedSeries<StatusPoint>,
    pub control: ControlMirror,
    pub network: NetworkConfig,
    pub camera: CameraConfig,
    pub logs: OperationLog,
    version: StateVersion,
}

impl DeviceState {
    pub fn new(device_id: &str) -> Self {
        Self {
            device_id: device_id.to_string(),
            connection: ConnectionState::default(),
            telemetry: CurrentTelemetry::default(),
            telemetry_history: BoundedSeries::default(),
            health: DeviceHealth::default(),
            status_history: BoundedSeries::default(),
            control: ControlMirror::default(),
            network: NetworkConfig::default(),
            camera: CameraConfig::default(),
            logs: OperationLog::default(),
            version: 0,
        }
    }

    /// Current change-tracking version. Bumped once per applied change.
    pub fn version(&self) -> StateVersion {
        self.version
    }

    pub fn changed_since(&self, version: StateVersion) -> bool {
        self.version > version
    }

    fn bump(&mut self) {
        self.version += 1;
    }

    // ── Update Operations ─────────────────────────────────────────────

    pub fn set_connection(&mut self, connection: ConnectionState) {
        if self.connection != connection {
            self.connection = connection;
            self.bump();
        }
    }

    /// Overwrite current readings and append a chart point keyed by the
    /// payload's own time label.
    pub fn apply_telemetry(&mut self, payload: &TelemetryPayload) {
        self.telemetry.temperature = payload.temperature;
        self.telemetry.humidity = payload.humidity;
        if let Some(light_dark) = payload.light_dark {
            self.telemetry.light_dark = light_dark;
        }
        self.telemetry.time = payload.time.clone();

        self.telemetry_history.push(TelemetryPoint {
            time: payload.time.clone(),
            temperature: payload.temperature,
            humidity: payload.humidity,
        });
        self.bump();
    }

    /// Partial merge of a status payload. Absent fields stay untouched.
    /// The chart point uses `now`, generated locally.
    pub fn apply_status(&mut self, payload: &StatusPayload, now: DateTime<Utc>) {
        if let Some(rssi) = payload.rssi {
            self.health.rssi = rssi;
        }
        if let Some(free_heap) = payload.free_heap {
            self.health.free_heap = free_heap;
        }
        if let Some(uptime) = payload.uptime {
            self.health.uptime = uptime;
        }
        merge_control(&mut self.control, payload);

        self.status_history.push(StatusPoint {
            time: now,
            rssi: self.health.rssi,
            free_heap: self.health.free_heap,
        });
        self.bump();
    }

    /// Partial merge of a config echo across control, network, camera
    /// and health fields.
    pub fn apply_config(&mut self, payload: &ConfigPayload) {
        macro_rules! merge {
            ($dst:expr, $src:expr) => {
                if let Some(value) = $src.clone() {
                    $dst = value;
                }
            };
        }

        merge!(self.control.led_status, payload.led_status);
        merge!(self.control.led_brightness, payload.led_brightness);
        merge!(self.control.red_led_status, payload.red_led_status);
        merge!(self.control.servo_angle, payload.servo_angle);
        merge!(self.control.relay_status, payload.relay_status);
        merge!(self.control.framesize, payload.framesize);

        merge!(self.network.wifi_ip, payload.wifi_ip);
        merge!(self.network.wifi_ssid, payload.wifi_ssid);
        merge!(self.network.wifi_password, payload.wifi_password);
        merge!(self.network.mqtt_broker, payload.mqtt_broker);
        merge!(self.network.mqtt_port, payload.mqtt_port);
        merge!(self.network.dht_interval, payload.dht_interval);
        merge!(self.network.status_interval, payload.status_interval);
        merge!(self.network.upload_url, payload.upload_url);

        merge!(self.health.rssi, payload.rssi);
        merge!(self.health.free_heap, payload.free_heap);
        merge!(self.health.uptime, payload.uptime);

        merge!(self.camera.brightness, payload.brightness);
        merge!(self.camera.contrast, payload.contrast);
        merge!(self.camera.saturation, payload.saturation);
        merge!(self.camera.quality, payload.quality);
        merge!(self.camera.special_effect, payload.special_effect);
        merge!(self.camera.white_balance, payload.white_balance);
        merge!(self.camera.aec, payload.aec);
        merge!(self.camera.gain_ctrl, payload.gain_ctrl);
        merge!(self.camera.hmirror, payload.hmirror);
        merge!(self.camera.vflip, payload.vflip);
        merge!(self.camera.bpc, payload.bpc);
        merge!(self.camera.wpc, payload.wpc);
        merge!(self.camera.lenc, payload.lenc);

        self.bump();
    }

    /// Apply one incoming operation log record (pending → resolved merge).
    pub fn push_log(&mut self, entry: OperationLogEntry) {
        self.logs.push(entry);
        self.bump();
    }

    /// Dispatch one decoded event into the store.
    ///
    /// `CaptureResult` and `AiResponse` do not touch the canonical state;
    /// the session driver re-emits them as notifications instead.
    pub fn apply(&mut self, event: &StreamEvent, now: DateTime<Utc>) {
        match event {
            StreamEvent::Connected => self.set_connection(ConnectionState::Connected),
            StreamEvent::Telemetry(p) => self.apply_telemetry(p),
            StreamEvent::Status(p) => self.apply_status(p, now),
            StreamEvent::Config(p) => self.apply_config(p),
            StreamEvent::Log(entry) => self.push_log(entry.clone()),
            StreamEvent::CaptureResult(_) | StreamEvent::AiResponse(_) => {}
        }
    }
}

fn merge_control(control: &mut ControlMirror, payload: &StatusPayload) {
    if let Some(led_status) = payload.led_status {
        control.led_status = led_status;
    }
    if let Some(led_brightness) = payload.led_brightness {
        control.led_brightness = led_brightness;
    }
    if let Some(red_led_status) = payload.red_led_status {
        control.red_led_status = red_led_status;
    }
    if let Some(servo_angle) = payload.servo_angle {
        control.servo_angle = servo_angle;
    }
    if let Some(relay_status) = payload.relay_status {
        control.relay_status = relay_status;
    }
    if let Some(framesize) = payload.framesize {
        control.framesize = framesize;
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
