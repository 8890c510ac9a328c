//! Issue Model (reported problems)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::serde_helpers;

/// Problem category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum IssueType {
    #[serde(rename = "equipo")]
    Equipo,
    #[serde(rename = "software")]
    Software,
    #[serde(rename = "material")]
    Material,
    #[serde(rename = "seguridad")]
    Seguridad,
    #[serde(rename = "calidad")]
    Calidad,
    #[default]
    #[serde(other, rename = "otro")]
    Otro,
}

impl IssueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equipo => "equipo",
            Self::Software => "software",
            Self::Material => "material",
            Self::Seguridad => "seguridad",
            Self::Calidad => "calidad",
            Self::Otro => "otro",
        }
    }
}

impl std::str::FromStr for IssueType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "equipo" => Ok(Self::Equipo),
            "software" => Ok(Self::Software),
            "material" => Ok(Self::Material),
            "seguridad" => Ok(Self::Seguridad),
            "calidad" => Ok(Self::Calidad),
            "otro" => Ok(Self::Otro),
            other => Err(format!("unknown issue type: {other}")),
        }
    }
}

/// Issue workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum IssueStatus {
    #[default]
    #[serde(rename = "pendiente")]
    Pendiente,
    #[serde(rename = "en-revision")]
    EnRevision,
    #[serde(rename = "resuelto")]
    Resuelto,
    #[serde(other, rename = "desconocido")]
    Unknown,
}

impl std::str::FromStr for IssueStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pendiente" => Ok(Self::Pendiente),
            "en-revision" => Ok(Self::EnRevision),
            "resuelto" => Ok(Self::Resuelto),
            other => Err(format!("unknown issue status: {other}")),
        }
    }
}

/// Technician snapshot embedded in an assigned issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignedUser {
    #[serde(with = "serde_helpers::id")]
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// Reported problem as returned by `GET /issues`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(with = "serde_helpers::id")]
    pub id: i64,
    #[serde(rename = "type", default)]
    pub issue_type: IssueType,
    /// Project name
    #[serde(default)]
    pub project: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: IssueStatus,
    #[serde(default, with = "serde_helpers::datetime_opt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "serde_helpers::datetime_opt")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, with = "serde_helpers::id_opt")]
    pub assigned_user_id: Option<i64>,
    #[serde(default)]
    pub assigned_user: Option<AssignedUser>,
}

impl Issue {
    pub fn is_assigned(&self) -> bool {
        self.assigned_user_id.is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.status == IssueStatus::Pendiente
    }
}

/// `POST /issues/assign` body. `assigned_user_id: null` unassigns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignTechnicianRequest {
    pub issue_id: i64,
    pub assigned_user_id: Option<i64>,
}
