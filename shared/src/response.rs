//! Response envelopes returned by the backend
//!
//! Most endpoints return the resource itself. The shapes here cover the
//! few that wrap it, and the error body sent with non-2xx statuses.

use serde::{Deserialize, Serialize};

/// `{ "message": ..., "already_exists": ... }`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
    /// Set by `assign-project` when the pair was already linked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub already_exists: Option<bool>,
}

impl MessageResponse {
    pub fn already_exists(&self) -> bool {
        self.already_exists.unwrap_or(false)
    }
}

/// Error body format: `{ "message": "...", "errors": {...} }`
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(default)]
    pub errors: Option<serde_json::Value>,
}

/// Count endpoint; the backend answers either `7` or `{ "count": 7 }`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum CountResponse {
    Bare(u64),
    Wrapped { count: u64 },
}

impl CountResponse {
    pub fn value(self) -> u64 {
        match self {
            Self::Bare(n) | Self::Wrapped { count: n } => n,
        }
    }
}

/// Either the resource itself or `{ "<key>": resource }`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Wrapped<T> {
    Issue { issue: T },
    Data { data: T },
    Bare(T),
}

impl<T> Wrapped<T> {
    pub fn into_inner(self) -> T {
        match self {
            Self::Issue { issue } => issue,
            Self::Data { data } => data,
            Self::Bare(inner) => inner,
        }
    }
}
