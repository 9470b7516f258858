//! Bounded history series: fixed-capacity, oldest-first eviction.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Capacity of the telemetry and status time-series buffers.
pub const SERIES_CAP: usize = 30;

/// A fixed-capacity series of chart points, oldest first.
///
/// Pushing at capacity evicts the oldest point before appending, so the
/// buffer always holds the most recent `cap` points in arrival order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundedSeries<T> {
    cap: usize,
    points: VecDeque<T>,
}

impl<T> BoundedSeries<T> {
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            points: VecDeque::with_capacity(cap),
        }
    }

    pub fn push(&mut self, point: T) {
        if self.points.len() >= self.cap {
            self.points.pop_front();
        }
        self.points.push_back(point);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.cap
    }

    pub fn latest(&self) -> Option<&T> {
        self.points.back()
    }

    pub fn oldest(&self) -> Option<&T> {
        self.points.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.points.iter()
    }
}

impl<T> Default for BoundedSeries<T> {
    fn default() -> Self {
        Self::new(SERIES_CAP)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
