//! Employee Model

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::project::Project;
use crate::serde_helpers;
use crate::util::split_list;

/// Employee role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EmployeeRole {
    /// Field technician, the only role eligible for issue assignment
    #[serde(rename = "tecnico")]
    Tecnico,
    #[serde(rename = "client")]
    Client,
    #[serde(rename = "admin")]
    Admin,
    #[serde(rename = "developer")]
    Developer,
    #[default]
    #[serde(other, rename = "other")]
    Other,
}

/// Attendance status for the current day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AttendanceStatus {
    #[serde(rename = "presente")]
    Presente,
    #[serde(rename = "ausente")]
    Ausente,
    #[serde(rename = "tarde")]
    Tarde,
    #[default]
    #[serde(other, rename = "desconocido")]
    Unknown,
}

/// Ordered, duplicate-free set of project ids assigned to an employee.
///
/// Replaces the comma-joined project-name string as the source of truth;
/// names are resolved only when rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssignedProjects(Vec<i64>);

impl AssignedProjects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the id was already present.
    pub fn insert(&mut self, project_id: i64) -> bool {
        if self.contains(project_id) {
            return false;
        }
        self.0.push(project_id);
        true
    }

    /// Returns `false` when the id was not present.
    pub fn remove(&mut self, project_id: i64) -> bool {
        let before = self.0.len();
        self.0.retain(|id| *id != project_id);
        self.0.len() != before
    }

    pub fn contains(&self, project_id: i64) -> bool {
        self.0.contains(&project_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<i64> for AssignedProjects {
    fn from_iter<I: IntoIterator<Item = i64>>(iter: I) -> Self {
        let mut set = Self::new();
        for id in iter {
            set.insert(id);
        }
        set
    }
}

/// Employee record as returned by `GET /employees`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    #[serde(with = "serde_helpers::id")]
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: EmployeeRole,
    #[serde(default)]
    pub status: AttendanceStatus,
    #[serde(default)]
    pub avatar: Option<String>,
    /// Assigned project ids
    #[serde(default)]
    pub project_ids: AssignedProjects,
    /// Legacy comma-joined project names (wire field `project`)
    #[serde(default, rename = "project", skip_serializing_if = "Option::is_none")]
    pub project_label: Option<String>,
}

impl Employee {
    pub fn is_technician(&self) -> bool {
        self.role == EmployeeRole::Tecnico
    }

    pub fn is_present(&self) -> bool {
        self.status == AttendanceStatus::Presente
    }

    /// Fill `project_ids` from the legacy name list when the backend did
    /// not send ids. Names with no matching project are skipped.
    pub fn resolve_legacy_projects(&mut self, projects: &[Project]) {
        if !self.project_ids.is_empty() {
            return;
        }
        let Some(label) = self.project_label.as_deref() else {
            return;
        };
        self.project_ids = split_list(label)
            .filter_map(|name| projects.iter().find(|p| p.name == name).map(|p| p.id))
            .collect();
    }

    /// Project names joined for display, in assignment order.
    pub fn project_names(&self, projects: &[Project]) -> String {
        self.project_ids
            .iter()
            .filter_map(|id| projects.iter().find(|p| p.id == id).map(|p| p.name.as_str()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Create employee payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EmployeeCreate {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "email is required"))]
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub role: EmployeeRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Update employee payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmployeeUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<EmployeeRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AttendanceStatus>,
}

impl EmployeeUpdate {
    /// Apply the present fields to a local copy.
    pub fn apply_to(&self, employee: &mut Employee) {
        if let Some(name) = &self.name {
            employee.name = name.clone();
        }
        if let Some(email) = &self.email {
            employee.email = Some(email.clone());
        }
        if let Some(phone) = &self.phone {
            employee.phone = Some(phone.clone());
        }
        if let Some(role) = self.role {
            employee.role = role;
        }
        if let Some(status) = self.status {
            employee.status = status;
        }
    }
}
