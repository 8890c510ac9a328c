//! Employee ↔ project assignment payloads

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectAssignmentAction {
    Assign,
    Unassign,
}

/// `POST /employees/{id}/assign-project` body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignProjectRequest {
    pub project_id: i64,
    pub action: ProjectAssignmentAction,
}

impl AssignProjectRequest {
    pub fn assign(project_id: i64) -> Self {
        Self {
            project_id,
            action: ProjectAssignmentAction::Assign,
        }
    }

    pub fn unassign(project_id: i64) -> Self {
        Self {
            project_id,
            action: ProjectAssignmentAction::Unassign,
        }
    }
}
