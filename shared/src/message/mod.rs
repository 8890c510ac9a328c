//! Cache invalidation signals
//!
//! Any collaborator may announce that a collection changed on the server.
//! Unlike a bare browser event, a signal names what changed, why, and
//! carries a monotonically increasing version stamped by the bus.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub mod payload;
pub use payload::*;

/// What collection a signal invalidates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignalKind {
    /// Project status or membership changed; refresh projects
    ProjectStatusUpdated,
    /// Attendance marked; refresh employees
    AttendanceUpdated,
    /// Issues created or changed elsewhere; refresh issues
    IssuesChanged,
}

impl SignalKind {
    pub const ALL: [SignalKind; 3] = [
        SignalKind::ProjectStatusUpdated,
        SignalKind::AttendanceUpdated,
        SignalKind::IssuesChanged,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProjectStatusUpdated => "project-status-updated",
            Self::AttendanceUpdated => "attendance-updated",
            Self::IssuesChanged => "issues-changed",
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SignalKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown signal: {s}"))
    }
}

/// Invalidation signal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidationSignal {
    pub id: Uuid,
    pub kind: SignalKind,
    /// Free-form reason, for logs
    pub reason: String,
    /// Bus-wide sequence number, strictly increasing per bus
    pub version: u64,
    /// Unix millis
    pub emitted_at: i64,
}

impl InvalidationSignal {
    pub fn new(kind: SignalKind, reason: impl Into<String>, version: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            reason: reason.into(),
            version,
            emitted_at: crate::util::now_millis(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_kind_wire_names() {
        assert_eq!(
            serde_json::to_string(&SignalKind::ProjectStatusUpdated).unwrap(),
            "\"project-status-updated\""
        );
        assert_eq!(
            "attendance-updated".parse::<SignalKind>().unwrap(),
            SignalKind::AttendanceUpdated
        );
        assert!("nope".parse::<SignalKind>().is_err());
    }

    #[test]
    fn test_signal_carries_reason_and_version() {
        let signal = InvalidationSignal::new(SignalKind::IssuesChanged, "issue-assigned", 9);
        assert_eq!(signal.version, 9);
        assert_eq!(signal.reason, "issue-assigned");
        assert!(!signal.id.is_nil());
    }
}
