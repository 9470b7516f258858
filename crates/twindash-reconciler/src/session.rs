//! Connection lifecycle state machine for one push-event session.
//!
//! Pure and deterministic: the async driver feeds it transitions and
//! acts on its decisions. Two properties it enforces:
//!
//! - **Single-slot reconnect**: a transport error schedules exactly one
//!   reconnect attempt after [`RECONNECT_DELAY`]; further errors while
//!   the timer is pending are no-ops besides the connection flag.
//! - **Generation fencing**: every `begin_connect`/`disconnect` bumps a
//!   session generation. Callbacks holding a stale generation are inert,
//!   so events from a superseded session are never applied.

use std::time::Duration;

use twindash_core::types::ConnectionState;

/// Delay before the single reconnect attempt fires.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Monotonic session generation. Stale generations are fenced out.
pub type Generation = u64;

/// Decision returned by [`SessionState::on_error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectDecision {
    /// Schedule one reconnect attempt after the given delay.
    Schedule(Duration),
    /// A reconnect timer is already pending; do nothing more.
    AlreadyPending,
    /// The error came from a superseded session; ignore it.
    Stale,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    device_id: Option<String>,
    connection: ConnectionState,
    generation: Generation,
    reconnect_pending: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn device_id(&self) -> Option<&str> {
        self.device_id.as_deref()
    }

    pub fn reconnect_pending(&self) -> bool {
        self.reconnect_pending
    }

    /// Start a session for `device_id`, superseding any previous one.
    /// Returns the new generation to fence callbacks with.
    pub fn begin_connect(&mut self, device_id: &str) -> Generation {
        self.generation += 1;
        self.device_id = Some(device_id.to_string());
        self.connection = ConnectionState::Connecting;
        // Any timer from the previous generation is fenced out below,
        // so the slot is free for this session.
        self.reconnect_pending = false;
        self.generation
    }

    /// The stream confirmed the session. Cancels a pending reconnect.
    /// Returns false when the confirmation is stale.
    pub fn on_connected(&mut self, generation: Generation) -> bool {
        if generation != self.generation {
            return false;
        }
        self.connection = ConnectionState::Connected;
        self.reconnect_pending = false;
        true
    }

    /// A transport-level failure (not a parse failure).
    pub fn on_error(&mut self, generation: Generation) -> ReconnectDecision {
        if generation != self.generation {
            return ReconnectDecision::Stale;
        }
        self.connection = ConnectionState::Disconnected;
        if self.reconnect_pending {
            return ReconnectDecision::AlreadyPending;
        }
        self.reconnect_pending = true;
        ReconnectDecision::Schedule(RECONNECT_DELAY)
    }

    /// The reconnect timer fired. Returns the device id to reconnect to,
    /// or `None` when the timer belongs to a superseded or already
    /// cancelled schedule.
    pub fn on_reconnect_fire(&mut self, generation: Generation) -> Option<String> {
        if generation != self.generation || !self.reconnect_pending {
            return None;
        }
        self.reconnect_pending = false;
        self.device_id.clone()
    }

    /// Tear the session down: supersedes the generation so in-flight
    /// callbacks and timers become inert.
    pub fn disconnect(&mut self) {
        self.generation += 1;
        self.connection = ConnectionState::Disconnected;
        self.reconnect_pending = false;
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── 1. Connect lifecycle ─────────────────────────────────────────

    #[test]
    fn connect_then_confirm() {
        let mut session = SessionState::new();
        assert_eq!(session.connection(), ConnectionState::Disconnected);

        let generation = session.begin_connect("cam-01");
        assert_eq!(session.connection(), ConnectionState::Connecting);
        assert_eq!(session.device_id(), Some("cam-01"));

        assert!(session.on_connected(generation));
        assert_eq!(session.connection(), ConnectionState::Connected);
    }

    // ── 2. Single-slot reconnect scheduling ──────────────────────────

    #[test]
    fn two_errors_schedule_exactly_one_reconnect() {
        let mut session = SessionState::new();
        let generation = session.begin_connect("cam-01");
        session.on_connected(generation);

        let first = session.on_error(generation);
        assert_eq!(first, ReconnectDecision::Schedule(RECONNECT_DELAY));
        assert_eq!(session.connection(), ConnectionState::Disconnected);

        // Second error with the timer pending: no second schedule
        let second = session.on_error(generation);
        assert_eq!(second, ReconnectDecision::AlreadyPending);
        assert!(session.reconnect_pending());
    }

    #[test]
    fn reconnect_fire_returns_device_and_clears_slot() {
        let mut session = SessionState::new();
        let generation = session.begin_connect("cam-01");
        session.on_error(generation);

        assert_eq!(session.on_reconnect_fire(generation).as_deref(), Some("cam-01"));
        assert!(!session.reconnect_pending());

        // Firing again is a no-op: the slot is empty
        assert!(session.on_reconnect_fire(generation).is_none());
    }

    #[test]
    fn error_after_fire_schedules_again() {
        let mut session = SessionState::new();
        let g1 = session.begin_connect("cam-01");
        session.on_error(g1);
        session.on_reconnect_fire(g1);

        // Reconnect attempt starts a new generation and fails again
        let g2 = session.begin_connect("cam-01");
        assert_eq!(
            session.on_error(g2),
            ReconnectDecision::Schedule(RECONNECT_DELAY),
            "the loop may reschedule after each fired attempt"
        );
    }

    // ── 3. Generation fencing ────────────────────────────────────────

    #[test]
    fn stale_callbacks_are_inert() {
        let mut session = SessionState::new();
        let old = session.begin_connect("cam-01");
        let new = session.begin_connect("cam-02");

        assert_eq!(session.on_error(old), ReconnectDecision::Stale);
        assert!(!session.on_connected(old));
        assert!(session.on_reconnect_fire(old).is_none());

        // The live generation still works
        assert!(session.on_connected(new));
    }

    #[test]
    fn disconnect_cancels_pending_reconnect() {
        let mut session = SessionState::new();
        let generation = session.begin_connect("cam-01");
        session.on_error(generation);
        assert!(session.reconnect_pending());

        session.disconnect();
        assert!(!session.reconnect_pending());
        assert_eq!(session.connection(), ConnectionState::Disconnected);

        // The timer fires after teardown: inert
        assert!(session.on_reconnect_fire(generation).is_none());
    }

    #[test]
    fn connected_event_cancels_pending_reconnect() {
        let mut session = SessionState::new();
        let generation = session.begin_connect("cam-01");
        session.on_error(generation);

        // Stream recovers on its own before the timer fires
        assert!(session.on_connected(generation));
        assert!(!session.reconnect_pending());
        assert!(session.on_reconnect_fire(generation).is_none());
    }

    // ── 4. Reconnect superseded by a new connect ─────────────────────

    #[test]
    fn new_connect_supersedes_scheduled_reconnect() {
        let mut session = SessionState::new();
        let g1 = session.begin_connect("cam-01");
        session.on_error(g1);

        // Caller connects to a different device before the timer fires
        let _g2 = session.begin_connect("cam-02");
        assert!(
            session.on_reconnect_fire(g1).is_none(),
            "stale timer must not reconnect the old device"
        );
    }
}
