//! Project Model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::serde_helpers;

/// Project lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ProjectStatus {
    #[default]
    #[serde(rename = "activo")]
    Activo,
    #[serde(rename = "en-progreso")]
    EnProgreso,
    #[serde(rename = "completado")]
    Completado,
    #[serde(other, rename = "desconocido")]
    Unknown,
}

/// Site location and on-site contact
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectLocation {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub contact_name: Option<String>,
    #[serde(default)]
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
}

/// Project record as returned by `GET /projects`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(with = "serde_helpers::id")]
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub status: ProjectStatus,
    /// 0..=100
    #[serde(default, deserialize_with = "serde_helpers::percent")]
    pub progress: u8,
    #[serde(default, deserialize_with = "serde_helpers::count")]
    pub total_parts: u32,
    #[serde(default, deserialize_with = "serde_helpers::count")]
    pub completed_parts: u32,
    #[serde(default, with = "serde_helpers::date_opt")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, with = "serde_helpers::date_opt")]
    pub end_date: Option<NaiveDate>,
    /// Assigned technician names
    #[serde(default, deserialize_with = "serde_helpers::string_list")]
    pub technicians: Vec<String>,
    #[serde(default)]
    pub location: Option<ProjectLocation>,
}

impl Project {
    /// Active or in progress
    pub fn is_open(&self) -> bool {
        matches!(self.status, ProjectStatus::Activo | ProjectStatus::EnProgreso)
    }

    pub fn remaining_parts(&self) -> u32 {
        self.total_parts.saturating_sub(self.completed_parts)
    }
}
