//! Hand-landmark frame geometry: fixed index contract, finger-extension
//! predicates, and pinch distance.
//!
//! A frame carries 21 tracked points in normalized image coordinates
//! (x, y in [0,1], y grows downward; z is relative depth). The index
//! contract is fixed by the upstream landmark detector.

use serde::{Deserialize, Serialize};

use crate::types::TwindashError;

// ─── Landmark Indices ────────────────────────────────────────────────

pub const THUMB_TIP: usize = 4;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_TIP: usize = 12;
pub const RING_TIP: usize = 16;
pub const PINKY_TIP: usize = 20;
pub const PALM_CENTER: usize = 9;
pub const INDEX_KNUCKLE: usize = 6;
pub const MIDDLE_KNUCKLE: usize = 10;
pub const RING_KNUCKLE: usize = 14;
pub const PINKY_KNUCKLE: usize = 18;

/// Number of tracked points per frame.
pub const FRAME_POINTS: usize = 21;

// ─── Points ──────────────────────────────────────────────────────────

/// One tracked point in normalized image space.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

/// A 2D position or vector in normalized image space.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// 2D Euclidean distance between two tracked points (z ignored).
pub fn planar_distance(a: Point3, b: Point3) -> f64 {
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
}

// ─── Frame ───────────────────────────────────────────────────────────

/// One detection result: 21 tracked points of a hand.
///
/// Transient. Not retained beyond the current and previous tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LandmarkFrame {
    points: [Point3; FRAME_POINTS],
}

impl LandmarkFrame {
    pub fn new(points: [Point3; FRAME_POINTS]) -> Self {
        Self { points }
    }

    /// Build a frame from a detector-supplied point list, enforcing the
    /// 21-point contract.
    pub fn from_points(points: Vec<Point3>) -> Result<Self, TwindashError> {
        let got = points.len();
        let points: [Point3; FRAME_POINTS] =
            points
                .try_into()
                .map_err(|_| TwindashError::MalformedFrame {
                    expected: FRAME_POINTS,
                    got,
                })?;
        Ok(Self { points })
    }

    /// Point at a raw landmark index, `None` when out of range.
    pub fn point(&self, index: usize) -> Option<Point3> {
        self.points.get(index).copied()
    }

    pub fn thumb_tip(&self) -> Point3 {
        self.points[THUMB_TIP]
    }

    pub fn index_tip(&self) -> Point3 {
        self.points[INDEX_TIP]
    }

    pub fn middle_tip(&self) -> Point3 {
        self.points[MIDDLE_TIP]
    }

    pub fn ring_tip(&self) -> Point3 {
        self.points[RING_TIP]
    }

    pub fn pinky_tip(&self) -> Point3 {
        self.points[PINKY_TIP]
    }

    pub fn palm_center(&self) -> Point3 {
        self.points[PALM_CENTER]
    }

    // ── Finger Predicates ────────────────────────────────────────────

    /// A finger is extended iff its tip sits above its knuckle in image
    /// space. Y grows downward, so "above" means numerically less.
    fn extended(&self, tip: usize, knuckle: usize) -> bool {
        self.points[tip].y < self.points[knuckle].y
    }

    pub fn index_extended(&self) -> bool {
        self.extended(INDEX_TIP, INDEX_KNUCKLE)
    }

    pub fn middle_extended(&self) -> bool {
        self.extended(MIDDLE_TIP, MIDDLE_KNUCKLE)
    }

    pub fn ring_extended(&self) -> bool {
        self.extended(RING_TIP, RING_KNUCKLE)
    }

    pub fn pinky_extended(&self) -> bool {
        self.extended(PINKY_TIP, PINKY_KNUCKLE)
    }

    /// Euclidean distance between thumb tip and index tip in the (x, y)
    /// plane.
    pub fn pinch_distance(&self) -> f64 {
        planar_distance(self.thumb_tip(), self.index_tip())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_frame() -> LandmarkFrame {
        LandmarkFrame::new([Point3 { x: 0.5, y: 0.5, z: 0.0 }; FRAME_POINTS])
    }

    fn set(frame: &mut LandmarkFrame, index: usize, x: f64, y: f64) {
        frame.points[index] = Point3 { x, y, z: 0.0 };
    }

    #[test]
    fn from_points_enforces_arity() {
        let err = LandmarkFrame::from_points(vec![Point3::default(); 20]).expect_err("short");
        assert_eq!(
            err,
            TwindashError::MalformedFrame {
                expected: FRAME_POINTS,
                got: 20
            }
        );

        let ok = LandmarkFrame::from_points(vec![Point3::default(); 21]);
        assert!(ok.is_ok());
    }

    #[test]
    fn extension_uses_tip_above_knuckle() {
        let mut frame = flat_frame();
        // Tip above knuckle (smaller y) → extended
        set(&mut frame, INDEX_TIP, 0.5, 0.3);
        set(&mut frame, INDEX_KNUCKLE, 0.5, 0.5);
        assert!(frame.index_extended());

        // Tip below knuckle → curled
        set(&mut frame, MIDDLE_TIP, 0.5, 0.7);
        set(&mut frame, MIDDLE_KNUCKLE, 0.5, 0.5);
        assert!(!frame.middle_extended());

        // Equal heights count as not extended
        assert!(!frame.ring_extended());
    }

    #[test]
    fn pinch_distance_is_planar() {
        let mut frame = flat_frame();
        set(&mut frame, THUMB_TIP, 0.1, 0.5);
        set(&mut frame, INDEX_TIP, 0.4, 0.5);
        // Depth must not contribute
        frame.points[THUMB_TIP].z = 5.0;
        assert!((frame.pinch_distance() - 0.3).abs() < 1e-12);
    }

    #[test]
    fn raw_point_access_is_bounds_checked() {
        let mut frame = flat_frame();
        set(&mut frame, PALM_CENTER, 0.3, 0.4);

        let palm = frame.point(PALM_CENTER).expect("in range");
        assert!((palm.x - 0.3).abs() < 1e-12);
        assert!(frame.point(FRAME_POINTS).is_none());
        assert!(frame.point(usize::MAX).is_none());
    }

    #[test]
    fn frame_serializes_as_bare_point_list() {
        let json = serde_json::to_string(&flat_frame()).expect("serialize");
        assert!(json.starts_with('['), "transparent frame is a point array");
        let back: LandmarkFrame = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, flat_frame());
    }
}
