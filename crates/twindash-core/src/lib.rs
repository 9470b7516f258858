//! twindash-core: deterministic core logic for the device dashboard.
//! Shared types, hand-landmark geometry, the gesture classifier state
//! machine, bounded history series, and the operation-log merge.
//! No IO, no async.

pub mod gesture;
pub mod landmark;
pub mod oplog;
pub mod series;
pub mod types;
