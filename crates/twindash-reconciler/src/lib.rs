//! twindash-reconciler: folds the device push-event stream into one
//! canonical state object. Decodes named events, applies them through
//! partial-merge update operations, and keeps the connection alive with
//! a single-slot reconnect policy.

pub mod decode;
pub mod reconciler;
pub mod session;
pub mod state;

pub use twindash_core::types;
