//! Shared types for the fieldops workspace
//!
//! Wire models consumed from the field-operations backend, cache
//! invalidation signals, notification payloads and the serde helpers
//! that normalise the backend's loosely typed JSON.

pub mod message;
pub mod models;
pub mod response;
pub mod serde_helpers;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use message::{InvalidationSignal, NotificationLevel, NotificationPayload, SignalKind};
pub use response::{CountResponse, ErrorBody, MessageResponse};
