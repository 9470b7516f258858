//! Async driver binding a push-event transport to the canonical
//! [`DeviceState`] store.
//!
//! The reconciler owns one device's session: it opens the transport,
//! decodes each named event, folds it into the store, and re-emits the
//! one-shot notification events ([`Notification`]) that never touch
//! canonical state. Transport failures go through the pure
//! [`SessionState`] machine, which hands back at most one scheduled
//! reconnect at a time and fences out superseded sessions.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::{Mutex, broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time;
use tracing::warn;

use twindash_core::types::{AiResponsePayload, CapturePayload, ConnectionState, StreamEvent};

use crate::decode::decode_event;
use crate::session::{Generation, ReconnectDecision, SessionState};
use crate::state::{DeviceState, StateVersion};

// ─── Transport Seam ──────────────────────────────────────────────────

/// Failure to open a stream. Transport-level failures *after* a
/// successful open arrive in-band as [`TransportEvent::Failed`].
#[derive(Debug, Clone, Error)]
#[error("failed to open event stream for {device_id}: {reason}")]
pub struct TransportError {
    pub device_id: String,
    pub reason: String,
}

/// What a transport feeds the session driver.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// The stream handshake completed.
    Opened,
    /// One named event with its raw payload text, not yet decoded.
    Message { event: String, data: String },
    /// The stream broke. The driver schedules a reconnect.
    Failed(String),
}

/// A source of push events for one device.
///
/// Closing the returned channel (dropping the sender) counts as a
/// transport failure, same as an explicit [`TransportEvent::Failed`].
pub trait StreamTransport: Send + Sync + 'static {
    fn open(
        &self,
        device_id: &str,
    ) -> impl Future<Output = Result<mpsc::Receiver<TransportEvent>, TransportError>> + Send;
}

// ─── Notifications ───────────────────────────────────────────────────

/// One-shot events re-emitted to subscribers instead of being folded
/// into [`DeviceState`].
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Capture(CapturePayload),
    Ai(AiResponsePayload),
}

// ─── Reconciler ──────────────────────────────────────────────────────

const NOTIFY_BUFFER: usize = 16;

/// Handle to one device's stream session. Cheap to clone; all clones
/// share the same state store and session.
///
/// The device id is fixed at construction: a handle reconciles exactly
/// one device for its whole life, so [`connect`](Self::connect) takes
/// no arguments and repeated calls re-subscribe the same device.
/// Watching another device means building another reconciler — the
/// canonical state, histories, and logs are all per-device.
pub struct StreamReconciler<T: StreamTransport> {
    inner: Arc<Inner<T>>,
}

struct Inner<T> {
    transport: T,
    state: Mutex<DeviceState>,
    session: Mutex<SessionState>,
    notify: broadcast::Sender<Notification>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl<T: StreamTransport> Clone for StreamReconciler<T> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<T: StreamTransport> StreamReconciler<T> {
    pub fn new(transport: T, device_id: &str) -> Self {
        let (notify, _) = broadcast::channel(NOTIFY_BUFFER);
        Self {
            inner: Arc::new(Inner {
                transport,
                state: Mutex::new(DeviceState::new(device_id)),
                session: Mutex::new(SessionState::new()),
                notify,
                task: Mutex::new(None),
            }),
        }
    }

    /// Clone of the current canonical state.
    pub async fn snapshot(&self) -> DeviceState {
        self.inner.state.lock().await.clone()
    }

    pub async fn version(&self) -> StateVersion {
        self.inner.state.lock().await.version()
    }

    pub async fn changed_since(&self, version: StateVersion) -> bool {
        self.inner.state.lock().await.changed_since(version)
    }

    /// Subscribe to re-emitted one-shot notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.inner.notify.subscribe()
    }

    /// Open the stream and start the session driver. Supersedes any
    /// session already running on this handle.
    ///
    /// An open failure here is returned to the caller; failures after
    /// a successful open are handled by the reconnect schedule instead.
    pub async fn connect(&self) -> Result<(), TransportError> {
        let device_id = self.inner.state.lock().await.device_id.clone();
        // Connection-state writes happen under the session guard that
        // validated (or bumped) the generation, so a superseded session
        // can never interleave its own write. Lock order is always
        // session, then state.
        let generation = {
            let mut session = self.inner.session.lock().await;
            let generation = session.begin_connect(&device_id);
            self.inner.state.lock().await.set_connection(ConnectionState::Connecting);
            generation
        };

        let events = match self.inner.transport.open(&device_id).await {
            Ok(events) => events,
            Err(err) => {
                let mut session = self.inner.session.lock().await;
                if session.generation() == generation {
                    session.disconnect();
                    self.inner.state.lock().await.set_connection(ConnectionState::Disconnected);
                }
                return Err(err);
            }
        };

        let handle = tokio::spawn(run_session(Arc::clone(&self.inner), generation, events));
        if let Some(old) = self.inner.task.lock().await.replace(handle) {
            old.abort();
        }
        Ok(())
    }

    /// Tear the session down. Any in-flight events or timers from it
    /// become inert.
    pub async fn disconnect(&self) {
        {
            let mut session = self.inner.session.lock().await;
            session.disconnect();
            self.inner.state.lock().await.set_connection(ConnectionState::Disconnected);
        }
        if let Some(task) = self.inner.task.lock().await.take() {
            task.abort();
        }
    }
}

// ─── Session Driver ──────────────────────────────────────────────────

async fn run_session<T: StreamTransport>(
    inner: Arc<Inner<T>>,
    mut generation: Generation,
    mut events: mpsc::Receiver<TransportEvent>,
) {
    loop {
        match events.recv().await {
            Some(TransportEvent::Opened) => {
                // The session guard stays held across the state write:
                // once the generation check passed, no teardown can
                // slip in between check and write.
                let mut session = inner.session.lock().await;
                if !session.on_connected(generation) {
                    return;
                }
                inner.state.lock().await.set_connection(ConnectionState::Connected);
            }
            Some(TransportEvent::Message { event, data }) => {
                let decoded = match decode_event(&event, &data) {
                    Ok(decoded) => decoded,
                    Err(err) => {
                        // A bad payload never tears the session down.
                        warn!(event, error = %err, "dropping malformed stream event");
                        continue;
                    }
                };
                {
                    let mut session = inner.session.lock().await;
                    if session.generation() != generation {
                        return;
                    }
                    if matches!(decoded, StreamEvent::Connected)
                        && !session.on_connected(generation)
                    {
                        return;
                    }
                    inner.state.lock().await.apply(&decoded, Utc::now());
                }
                match decoded {
                    StreamEvent::CaptureResult(payload) => {
                        let _ = inner.notify.send(Notification::Capture(payload));
                    }
                    StreamEvent::AiResponse(payload) => {
                        let _ = inner.notify.send(Notification::Ai(payload));
                    }
                    _ => {}
                }
            }
            failure => {
                match &failure {
                    Some(TransportEvent::Failed(reason)) => {
                        warn!(reason = %reason, "stream transport failed")
                    }
                    _ => warn!("stream closed without an error frame"),
                }
                let Some((next_generation, next_events)) = reconnect(&inner, generation).await
                else {
                    return;
                };
                generation = next_generation;
                events = next_events;
            }
        }
    }
}

/// Run the reconnect schedule until a stream opens or the session is
/// superseded. At most one timer is ever pending; repeated open
/// failures reschedule one at a time.
async fn reconnect<T: StreamTransport>(
    inner: &Arc<Inner<T>>,
    mut generation: Generation,
) -> Option<(Generation, mpsc::Receiver<TransportEvent>)> {
    loop {
        let delay = {
            let mut session = inner.session.lock().await;
            match session.on_error(generation) {
                ReconnectDecision::Schedule(delay) => {
                    // Written under the guard that validated the
                    // generation; a new session's Connecting state can
                    // never be clobbered by this stale write.
                    inner.state.lock().await.set_connection(ConnectionState::Disconnected);
                    delay
                }
                ReconnectDecision::AlreadyPending | ReconnectDecision::Stale => return None,
            }
        };
        time::sleep(delay).await;

        let (device_id, next_generation) = {
            let mut session = inner.session.lock().await;
            let device_id = session.on_reconnect_fire(generation)?;
            let next_generation = session.begin_connect(&device_id);
            inner.state.lock().await.set_connection(ConnectionState::Connecting);
            (device_id, next_generation)
        };
        generation = next_generation;

        match inner.transport.open(&device_id).await {
            Ok(events) => return Some((generation, events)),
            Err(err) => warn!(device_id = %device_id, error = %err, "reconnect attempt failed"),
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
