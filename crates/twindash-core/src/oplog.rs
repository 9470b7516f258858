//! Operation log: bounded, newest-first, with idempotent
//! pending → success/failed merging.
//!
//! The backend delivers operation results at least once and in two
//! phases: a `pending` record when a command is accepted, then a
//! `success`/`failed` record when it completes. The resolved record
//! overwrites the matching pending record in place instead of
//! appending, so a command occupies one line in the log.

use serde::{Deserialize, Serialize};

use crate::types::{OperationLogEntry, OperationResult};

/// Retained log window.
pub const LOG_CAP: usize = 50;

/// Bounded operation log, newest entry first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationLog {
    cap: usize,
    entries: Vec<OperationLogEntry>,
}

impl OperationLog {
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            entries: Vec::new(),
        }
    }

    /// Apply one incoming log record.
    ///
    /// A resolved record (`success`/`failed`) first looks for a pending
    /// entry with the same operation name and resolves it in place,
    /// keeping the pending entry's timestamp. Anything else is prepended
    /// as new, evicting the oldest entry past capacity.
    ///
    /// Returns true when an existing pending entry was resolved.
    pub fn push(&mut self, entry: OperationLogEntry) -> bool {
        if entry.result != OperationResult::Pending
            && let Some(pending) = self
                .entries
                .iter_mut()
                .find(|e| e.operation == entry.operation && e.result == OperationResult::Pending)
        {
            pending.result = entry.result;
            pending.result_msg = entry.result_msg;
            return true;
        }

        self.entries.insert(0, entry);
        self.entries.truncate(self.cap);
        false
    }

    pub fn entries(&self) -> &[OperationLogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.cap
    }
}

impl Default for OperationLog {
    fn default() -> Self {
        Self::new(LOG_CAP)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
