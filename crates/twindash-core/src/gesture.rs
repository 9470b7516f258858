//! Gesture classifier: turns a continuous stream of hand-landmark frames
//! into discrete, stable interaction intents.
//!
//! Classification runs in strict priority order (first match wins):
//!
//! - **Pointing**: index + middle extended, ring + pinky curled, not
//!   pinching. Cursor is the mirrored midpoint of the two tips.
//! - **Zooming**: pinching, regardless of other fingers. Delta against
//!   the previous pinch distance of the same continuous pinch.
//! - **Rotating**: all four non-thumb fingers extended, not pinching.
//!   Drag delta against the previous mirrored palm center.
//! - **Idle**: anything else, including no hand.
//!
//! Per-mode history persists only across consecutive frames in the same
//! mode; any frame landing in a different branch clears it, so the first
//! frame of a new continuous gesture never emits a nonzero delta
//! (cold-start rule).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::landmark::{LandmarkFrame, Point2};

/// Pinch threshold in normalized image units: thumb tip and index tip
/// closer than this count as pinching.
pub const PINCH_THRESHOLD: f64 = 0.10;

// ─── State ───────────────────────────────────────────────────────────

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GestureMode {
    #[default]
    Idle,
    Pointing,
    Rotating,
    Zooming,
}

impl GestureMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Pointing => "pointing",
            Self::Rotating => "rotating",
            Self::Zooming => "zooming",
        }
    }
}

impl fmt::Display for GestureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classified interaction intent for one frame.
///
/// `cursor` is meaningful only in `Pointing`; `drag_delta` only in
/// `Rotating`; `zoom_delta` only in `Zooming`. Exactly one mode is
/// active at any time.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GestureState {
    pub mode: GestureMode,
    pub cursor: Point2,
    pub drag_delta: Point2,
    pub zoom_delta: f64,
    pub hand_present: bool,
}

/// One frame of per-mode history carried between consecutive frames.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct GestureHistory {
    /// Mirrored palm center of the previous rotating frame.
    pub last_palm_center: Option<Point2>,
    /// Pinch distance of the previous zooming frame.
    pub last_pinch_dist: Option<f64>,
}

impl GestureHistory {
    pub fn clear(&mut self) {
        self.last_palm_center = None;
        self.last_pinch_dist = None;
    }
}

// ─── Classification ──────────────────────────────────────────────────

/// Classify one tick: `None` means no hand was detected this tick.
///
/// Pure function in the hysteresis-update shape: takes the previous
/// history, returns the next history alongside the classified state.
pub fn observe(
    history: &GestureHistory,
    frame: Option<&LandmarkFrame>,
) -> (GestureHistory, GestureState) {
    let Some(frame) = frame else {
        // No hand is a normal input, not an error.
        return (GestureHistory::default(), GestureState::default());
    };

    let pinch_dist = frame.pinch_distance();
    let pinching = pinch_dist < PINCH_THRESHOLD;

    let index = frame.index_extended();
    let middle = frame.middle_extended();
    let ring = frame.ring_extended();
    let pinky = frame.pinky_extended();

    let pointing = index && middle && !ring && !pinky && !pinching;
    let palm_open = index && middle && ring && pinky && !pinching;

    let mut state = GestureState {
        hand_present: true,
        ..GestureState::default()
    };

    // Priority order is a deliberate tie-break: pointing wins over
    // pinching, pinching wins over open palm.
    if pointing {
        state.mode = GestureMode::Pointing;
        let index_tip = frame.index_tip();
        let middle_tip = frame.middle_tip();
        // Horizontal axis mirrored to match a front-facing camera view.
        state.cursor = Point2::new(
            1.0 - (index_tip.x + middle_tip.x) / 2.0,
            (index_tip.y + middle_tip.y) / 2.0,
        );
        (GestureHistory::default(), state)
    } else if pinching {
        state.mode = GestureMode::Zooming;
        state.zoom_delta = match history.last_pinch_dist {
            Some(last) => pinch_dist - last,
            None => 0.0,
        };
        let next = GestureHistory {
            last_palm_center: None,
            last_pinch_dist: Some(pinch_dist),
        };
        (next, state)
    } else if palm_open {
        state.mode = GestureMode::Rotating;
        let palm = frame.palm_center();
        let current = Point2::new(1.0 - palm.x, palm.y);
        state.drag_delta = match history.last_palm_center {
            Some(last) => Point2::new(current.x - last.x, current.y - last.y),
            None => Point2::ZERO,
        };
        let next = GestureHistory {
            last_palm_center: Some(current),
            last_pinch_dist: None,
        };
        (next, state)
    } else {
        state.mode = GestureMode::Idle;
        (GestureHistory::default(), state)
    }
}

// ─── Tracker ─────────────────────────────────────────────────────────

/// Callback invoked with each classified state and the raw frame.
pub type InteractionSink = Box<dyn FnMut(&GestureState, &LandmarkFrame) + Send>;

/// Owns the classifier history and the registered interaction sink.
///
/// The sink is invoked synchronously once per processed frame with a
/// hand present. Disabling the tracker stops sink invocation and clears
/// history so re-enabling never replays a stale delta.
pub struct Tracker {
    history: GestureHistory,
    state: GestureState,
    sink: Option<InteractionSink>,
    enabled: bool,
}

impl Default for Tracker {
    fn default() -> Self {
        Self::new()
    }
}

impl Tracker {
    pub fn new() -> Self {
        Self {
            history: GestureHistory::default(),
            state: GestureState::default(),
            sink: None,
            enabled: true,
        }
    }

    /// Register the interaction sink, replacing any previous one.
    pub fn set_sink(&mut self, sink: InteractionSink) {
        self.sink = Some(sink);
    }

    pub fn clear_sink(&mut self) {
        self.sink = None;
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    /// Stop classification: clears history and resets the state to idle.
    pub fn disable(&mut self) {
        self.enabled = false;
        self.history.clear();
        self.state = GestureState::default();
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn state(&self) -> &GestureState {
        &self.state
    }

    /// Process one tick. Returns the classified state for this frame.
    pub fn observe(&mut self, frame: Option<&LandmarkFrame>) -> GestureState {
        if !self.enabled {
            return self.state;
        }

        let (next_history, state) = observe(&self.history, frame);
        self.history = next_history;
        self.state = state;

        if state.hand_present
            && let (Some(sink), Some(frame)) = (self.sink.as_mut(), frame)
        {
            sink(&state, frame);
        }

        state
    }
}

impl fmt::Debug for Tracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracker")
            .field("history", &self.history)
            .field("state", &self.state)
            .field("enabled", &self.enabled)
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::{
        FRAME_POINTS, INDEX_KNUCKLE, INDEX_TIP, MIDDLE_KNUCKLE, MIDDLE_TIP, PALM_CENTER,
        PINKY_KNUCKLE, PINKY_TIP, Point3, RING_KNUCKLE, RING_TIP, THUMB_TIP,
    };

    // ── Test Helpers ─────────────────────────────────────────────────

    const EXTENDED_Y: f64 = 0.3;
    const CURLED_Y: f64 = 0.7;
    const KNUCKLE_Y: f64 = 0.5;

    struct FrameSpec {
        index: bool,
        middle: bool,
        ring: bool,
        pinky: bool,
        /// Thumb-tip x; index tip sits at x = 0.5, so 0.45 pinches and
        /// 0.2 does not.
        thumb_x: f64,
        palm: (f64, f64),
    }

    impl Default for FrameSpec {
        fn default() -> Self {
            Self {
                index: false,
                middle: false,
                ring: false,
                pinky: false,
                thumb_x: 0.2,
                palm: (0.5, 0.5),
            }
        }
    }

    fn build(spec: FrameSpec) -> LandmarkFrame {
        let mut points = [Point3 { x: 0.5, y: KNUCKLE_Y, z: 0.0 }; FRAME_POINTS];
        let finger = |extended: bool| if extended { EXTENDED_Y } else { CURLED_Y };

        points[INDEX_TIP].y = finger(spec.index);
        points[MIDDLE_TIP].y = finger(spec.middle);
        points[RING_TIP].y = finger(spec.ring);
        points[PINKY_TIP].y = finger(spec.pinky);
        for knuckle in [INDEX_KNUCKLE, MIDDLE_KNUCKLE, RING_KNUCKLE, PINKY_KNUCKLE] {
            points[knuckle].y = KNUCKLE_Y;
        }

        // Thumb tip at the index tip's height, so pinch distance is the
        // horizontal gap alone.
        points[THUMB_TIP] = Point3 { x: spec.thumb_x, y: points[INDEX_TIP].y, z: 0.0 };
        points[INDEX_TIP].x = 0.5;
        points[PALM_CENTER] = Point3 { x: spec.palm.0, y: spec.palm.1, z: 0.0 };
        LandmarkFrame::new(points)
    }

    fn pointing_frame() -> LandmarkFrame {
        build(FrameSpec { index: true, middle: true, ..FrameSpec::default() })
    }

    fn pinch_frame(thumb_x: f64) -> LandmarkFrame {
        build(FrameSpec { thumb_x, ..FrameSpec::default() })
    }

    fn open_palm_frame(palm: (f64, f64)) -> LandmarkFrame {
        build(FrameSpec {
            index: true,
            middle: true,
            ring: true,
            pinky: true,
            palm,
            ..FrameSpec::default()
        })
    }

    // ── 1. No hand resets to idle ────────────────────────────────────

    #[test]
    fn no_hand_is_idle_and_clears_history() {
        let history = GestureHistory {
            last_palm_center: Some(Point2::new(0.5, 0.5)),
            last_pinch_dist: Some(0.05),
        };

        let (next, state) = observe(&history, None);

        assert_eq!(state.mode, GestureMode::Idle);
        assert!(!state.hand_present);
        assert_eq!(next, GestureHistory::default());
    }

    // ── 2. Pointing recognized and mirrored ──────────────────────────

    #[test]
    fn pointing_mirrors_cursor_x() {
        // Both tips at x = 0.2 → cursor.x must be 0.8
        let mut points = [Point3 { x: 0.5, y: KNUCKLE_Y, z: 0.0 }; FRAME_POINTS];
        points[INDEX_TIP] = Point3 { x: 0.2, y: EXTENDED_Y, z: 0.0 };
        points[MIDDLE_TIP] = Point3 { x: 0.2, y: EXTENDED_Y, z: 0.0 };
        points[RING_TIP].y = CURLED_Y;
        points[PINKY_TIP].y = CURLED_Y;
        points[THUMB_TIP] = Point3 { x: 0.8, y: EXTENDED_Y, z: 0.0 };
        let frame = LandmarkFrame::new(points);

        let (_, state) = observe(&GestureHistory::default(), Some(&frame));

        assert_eq!(state.mode, GestureMode::Pointing);
        assert!(state.hand_present);
        assert!((state.cursor.x - 0.8).abs() < 1e-12);
        assert!((state.cursor.y - EXTENDED_Y).abs() < 1e-12);
    }

    // ── 3. Zooming cold start then delta ─────────────────────────────

    #[test]
    fn zoom_cold_start_yields_zero_delta() {
        let (next, state) = observe(&GestureHistory::default(), Some(&pinch_frame(0.45)));

        assert_eq!(state.mode, GestureMode::Zooming);
        assert_eq!(state.zoom_delta, 0.0);
        assert_eq!(state.drag_delta, Point2::ZERO);
        assert!((next.last_pinch_dist.expect("stored pinch") - 0.05).abs() < 1e-9);
        assert!(next.last_palm_center.is_none());
    }

    #[test]
    fn zoom_delta_tracks_pinch_spread() {
        let (h1, _) = observe(&GestureHistory::default(), Some(&pinch_frame(0.45)));
        let (h2, state) = observe(&h1, Some(&pinch_frame(0.42)));

        // Pinch widened from 0.05 to 0.08
        assert_eq!(state.mode, GestureMode::Zooming);
        assert!((state.zoom_delta - 0.03).abs() < 1e-9);
        assert!((h2.last_pinch_dist.expect("stored pinch") - 0.08).abs() < 1e-9);
    }

    // ── 4. Rotating cold start then delta ────────────────────────────

    #[test]
    fn rotate_cold_start_yields_zero_delta() {
        let (next, state) =
            observe(&GestureHistory::default(), Some(&open_palm_frame((0.5, 0.5))));

        assert_eq!(state.mode, GestureMode::Rotating);
        assert_eq!(state.drag_delta, Point2::ZERO);
        assert_eq!(state.zoom_delta, 0.0);
        // Stored palm center is mirrored on x
        assert_eq!(next.last_palm_center, Some(Point2::new(0.5, 0.5)));
    }

    #[test]
    fn rotate_delta_uses_mirrored_palm_center() {
        let (h1, _) = observe(&GestureHistory::default(), Some(&open_palm_frame((0.5, 0.5))));
        let (h2, state) = observe(&h1, Some(&open_palm_frame((0.4, 0.6))));

        // Palm moved left in camera space → mirrored delta is positive x
        assert_eq!(state.mode, GestureMode::Rotating);
        assert!((state.drag_delta.x - 0.1).abs() < 1e-9);
        assert!((state.drag_delta.y - 0.1).abs() < 1e-9);
        let stored = h2.last_palm_center.expect("stored palm");
        assert!((stored.x - 0.6).abs() < 1e-9);
        assert!((stored.y - 0.6).abs() < 1e-9);
    }

    // ── 5. Priority: pointing beats pinching ─────────────────────────

    #[test]
    fn pointing_wins_over_pinch() {
        // Index+middle extended with the thumb right next to the index
        // tip: satisfies both pointing-shape and pinch-distance, except
        // that pointing requires not-pinching. Thumb at 0.45 pinches, so
        // the pointing arm is skipped and zoom must win; thumb at 0.2
        // breaks the pinch and pointing must win.
        let pinched = build(FrameSpec {
            index: true,
            middle: true,
            thumb_x: 0.45,
            ..FrameSpec::default()
        });
        let (_, state) = observe(&GestureHistory::default(), Some(&pinched));
        assert_eq!(state.mode, GestureMode::Zooming);

        let apart = build(FrameSpec {
            index: true,
            middle: true,
            thumb_x: 0.2,
            ..FrameSpec::default()
        });
        let (_, state) = observe(&GestureHistory::default(), Some(&apart));
        assert_eq!(state.mode, GestureMode::Pointing);
    }

    // ── 6. Priority: pinching beats open palm ────────────────────────

    #[test]
    fn pinch_wins_over_open_palm() {
        let frame = build(FrameSpec {
            index: true,
            middle: true,
            ring: true,
            pinky: true,
            thumb_x: 0.45,
            ..FrameSpec::default()
        });

        let (_, state) = observe(&GestureHistory::default(), Some(&frame));

        assert_eq!(state.mode, GestureMode::Zooming);
    }

    // ── 7. Partial hand shapes fall through to idle ──────────────────

    #[test]
    fn three_fingers_is_idle() {
        let frame = build(FrameSpec {
            index: true,
            middle: true,
            ring: true,
            ..FrameSpec::default()
        });

        let (next, state) = observe(&GestureHistory::default(), Some(&frame));

        assert_eq!(state.mode, GestureMode::Idle);
        assert!(state.hand_present);
        assert_eq!(next, GestureHistory::default());
    }

    // ── 8. Mode switch clears the other mode's history ───────────────

    #[test]
    fn mode_switch_clears_stale_history() {
        // Zoom, then open palm: pinch history must be gone, and the
        // rotate frame is a cold start.
        let (h1, _) = observe(&GestureHistory::default(), Some(&pinch_frame(0.45)));
        let (h2, rotate) = observe(&h1, Some(&open_palm_frame((0.5, 0.5))));
        assert_eq!(rotate.mode, GestureMode::Rotating);
        assert_eq!(rotate.drag_delta, Point2::ZERO);
        assert!(h2.last_pinch_dist.is_none());

        // Back to zoom: palm history gone, zoom cold start again.
        let (h3, zoom) = observe(&h2, Some(&pinch_frame(0.42)));
        assert_eq!(zoom.mode, GestureMode::Zooming);
        assert_eq!(zoom.zoom_delta, 0.0);
        assert!(h3.last_palm_center.is_none());
    }

    #[test]
    fn idle_gap_breaks_a_continuous_pinch() {
        let (h1, _) = observe(&GestureHistory::default(), Some(&pinch_frame(0.45)));
        let (h2, _) = observe(&h1, None);
        let (_, state) = observe(&h2, Some(&pinch_frame(0.42)));

        assert_eq!(state.mode, GestureMode::Zooming);
        assert_eq!(state.zoom_delta, 0.0, "gap must reset the pinch baseline");
    }

    // ── 9. Pinch threshold boundary ──────────────────────────────────

    #[test]
    fn pinch_threshold_boundary() {
        // Comfortably outside the 0.10 threshold: no pinch
        let (_, outside) = observe(&GestureHistory::default(), Some(&pinch_frame(0.35)));
        assert_ne!(outside.mode, GestureMode::Zooming);

        // Comfortably inside: pinch
        let (_, inside) = observe(&GestureHistory::default(), Some(&pinch_frame(0.42)));
        assert_eq!(inside.mode, GestureMode::Zooming);
    }

    // ── 10. Tracker: sink invocation and disable ─────────────────────

    #[test]
    fn tracker_invokes_sink_only_with_hand_present() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let mut tracker = Tracker::new();
        tracker.set_sink(Box::new(move |state, _| {
            assert!(state.hand_present);
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        tracker.observe(Some(&pointing_frame()));
        tracker.observe(None);
        tracker.observe(Some(&pinch_frame(0.45)));

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn disabled_tracker_is_inert() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let mut tracker = Tracker::new();
        tracker.set_sink(Box::new(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        tracker.observe(Some(&pinch_frame(0.45)));
        tracker.disable();
        assert_eq!(tracker.state().mode, GestureMode::Idle);

        tracker.observe(Some(&pinch_frame(0.42)));
        assert_eq!(calls.load(Ordering::SeqCst), 1, "no sink calls while disabled");

        // Re-enable: pinch history was cleared, so this is a cold start.
        tracker.enable();
        let state = tracker.observe(Some(&pinch_frame(0.42)));
        assert_eq!(state.zoom_delta, 0.0);
    }
}
