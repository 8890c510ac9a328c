//! Checkpoint Model
//!
//! A timestamped scan / quality event on a tracked part. Raw input for
//! project reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::serde_helpers;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    #[serde(with = "serde_helpers::id")]
    pub id: i64,
    #[serde(with = "serde_helpers::id")]
    pub project_id: i64,
    #[serde(default)]
    pub part_code: String,
    /// Comma-separated, may list several categories
    #[serde(default)]
    pub category: Option<String>,
    /// Technician display name
    #[serde(default)]
    pub technician: Option<String>,
    #[serde(with = "serde_helpers::datetime")]
    pub scanned_at: DateTime<Utc>,
    #[serde(default = "default_true", deserialize_with = "serde_helpers::bool_true")]
    pub passed: bool,
}

fn default_true() -> bool {
    true
}
