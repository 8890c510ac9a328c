//! Drag-and-drop technician → issue assignment
//!
//! One drag session at a time:
//!
//! ```text
//!  Idle ──drag_start──▶ Dragging ──drop_on(issue)──▶ Committing ──▶ Idle
//!                         │  │
//!                         │  └─drop_on(None)──▶ Idle   (no call)
//!                         └────cancel()───────▶ Idle   (no call)
//! ```
//!
//! Committing issues exactly one `assign_technician` call. On success the
//! server's issue replaces the local entry by id; on failure nothing
//! local changes. Both outcomes are reported through the [`Notifier`].

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use shared::message::NotificationPayload;
use shared::models::{AssignTechnicianRequest, Employee, Issue, IssueStatus};
use thiserror::Error;

use crate::issues::IssueDirectory;
use crate::notify::Notifier;
use crate::providers::EmployeeStore;
use crate::{ClientError, FieldApi};

const TECH_PREFIX: &str = "tech-";
const PROBLEM_PREFIX: &str = "problem-";

/// Draggable key, `tech-<id>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DragKey(pub i64);

/// Drop target key, `problem-<id>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DropKey(pub i64);

fn parse_prefixed(raw: &str, prefix: &str) -> Option<i64> {
    raw.strip_prefix(prefix)?.parse().ok()
}

impl FromStr for DragKey {
    type Err = AssignmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_prefixed(s, TECH_PREFIX)
            .map(Self)
            .ok_or_else(|| AssignmentError::InvalidKey(s.to_string()))
    }
}

impl FromStr for DropKey {
    type Err = AssignmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_prefixed(s, PROBLEM_PREFIX)
            .map(Self)
            .ok_or_else(|| AssignmentError::InvalidKey(s.to_string()))
    }
}

impl fmt::Display for DragKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{TECH_PREFIX}{}", self.0)
    }
}

impl fmt::Display for DropKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{PROBLEM_PREFIX}{}", self.0)
    }
}

#[derive(Debug, Error)]
pub enum AssignmentError {
    #[error("Invalid drag key: {0}")]
    InvalidKey(String),

    #[error("Technician not found: {0}")]
    TechnicianNotFound(i64),

    #[error("Issue not found: {0}")]
    IssueNotFound(i64),

    #[error("No drag in progress")]
    NotDragging,

    #[error("An assignment is already being committed")]
    Busy,

    #[error(transparent)]
    Api(#[from] ClientError),
}

/// Drag session state
#[derive(Debug, Clone, PartialEq)]
pub enum DragState {
    Idle,
    Dragging { technician: Employee },
    /// `technician_id` is `None` when clearing an assignment
    Committing {
        technician_id: Option<i64>,
        issue_id: i64,
    },
}

/// Result of a drop
#[derive(Debug, Clone, PartialEq)]
pub enum DropOutcome {
    /// Released outside any issue; nothing happened
    NoTarget,
    /// The server accepted the assignment
    Assigned {
        issue: Issue,
        /// Technician the issue had before, if any
        previous_user_id: Option<i64>,
    },
}

pub struct AssignmentMatcher {
    api: Arc<dyn FieldApi>,
    employees: EmployeeStore,
    issues: IssueDirectory,
    notifier: Arc<dyn Notifier>,
    state: Mutex<DragState>,
}

impl AssignmentMatcher {
    pub fn new(
        api: Arc<dyn FieldApi>,
        employees: EmployeeStore,
        issues: IssueDirectory,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            api,
            employees,
            issues,
            notifier,
            state: Mutex::new(DragState::Idle),
        }
    }

    pub fn state(&self) -> DragState {
        self.lock().clone()
    }

    /// Technician currently being dragged
    pub fn active_technician(&self) -> Option<Employee> {
        match &*self.lock() {
            DragState::Dragging { technician } => Some(technician.clone()),
            _ => None,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DragState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_state(&self, next: DragState) {
        *self.lock() = next;
    }

    /// Pick up a technician card.
    pub async fn drag_start(&self, key: &str) -> Result<Employee, AssignmentError> {
        if matches!(*self.lock(), DragState::Committing { .. }) {
            return Err(AssignmentError::Busy);
        }
        let DragKey(id) = key.parse()?;

        let technician = self
            .employees
            .technicians()
            .await
            .into_iter()
            .find(|e| e.id == id)
            .ok_or(AssignmentError::TechnicianNotFound(id))?;

        let mut state = self.lock();
        if matches!(*state, DragState::Committing { .. }) {
            return Err(AssignmentError::Busy);
        }
        *state = DragState::Dragging {
            technician: technician.clone(),
        };
        tracing::debug!(technician_id = id, "Drag started");
        Ok(technician)
    }

    /// Abort the drag (escape key, pointer lost).
    pub fn cancel(&self) {
        let mut state = self.lock();
        if matches!(*state, DragState::Dragging { .. }) {
            *state = DragState::Idle;
            tracing::debug!("Drag cancelled");
        }
    }

    /// Release the dragged technician over `target` (`problem-<id>`), or
    /// outside any target when `None`.
    pub async fn drop_on(&self, target: Option<&str>) -> Result<DropOutcome, AssignmentError> {
        let (technician, issue_id) = {
            let mut state = self.lock();
            let technician = match &*state {
                DragState::Dragging { technician } => technician.clone(),
                DragState::Committing { .. } => return Err(AssignmentError::Busy),
                DragState::Idle => return Err(AssignmentError::NotDragging),
            };

            let Some(DropKey(issue_id)) = target.and_then(|t| t.parse().ok()) else {
                *state = DragState::Idle;
                tracing::debug!("Dropped outside any issue");
                return Ok(DropOutcome::NoTarget);
            };

            *state = DragState::Committing {
                technician_id: Some(technician.id),
                issue_id,
            };
            (technician, issue_id)
        };

        let result = self.commit(issue_id, Some(&technician)).await;
        self.set_state(DragState::Idle);
        result
    }

    /// Clear the technician from an issue. Same merge and notification
    /// policy as a drop, but outside any drag session.
    pub async fn unassign(&self, issue_id: i64) -> Result<DropOutcome, AssignmentError> {
        {
            let mut state = self.lock();
            if !matches!(*state, DragState::Idle) {
                return Err(AssignmentError::Busy);
            }
            *state = DragState::Committing {
                technician_id: None,
                issue_id,
            };
        }
        let result = self.commit(issue_id, None).await;
        self.set_state(DragState::Idle);
        result
    }

    async fn commit(
        &self,
        issue_id: i64,
        technician: Option<&Employee>,
    ) -> Result<DropOutcome, AssignmentError> {
        let Some(current) = self.issues.get(issue_id).await else {
            self.notifier.notify(NotificationPayload::error(
                "Error al asignar técnico",
                format!("La incidencia #{issue_id} ya no existe"),
            ));
            return Err(AssignmentError::IssueNotFound(issue_id));
        };

        let previous_user_id = current.assigned_user_id;
        let new_user_id = technician.map(|t| t.id);
        if previous_user_id.is_some() && previous_user_id != new_user_id {
            // reassignment is allowed, only logged
            tracing::warn!(
                issue_id,
                previous = ?previous_user_id,
                next = ?new_user_id,
                resolved = current.status == IssueStatus::Resuelto,
                "Overwriting existing issue assignment"
            );
        }

        let request = AssignTechnicianRequest {
            issue_id,
            assigned_user_id: new_user_id,
        };
        match self.api.assign_technician(&request).await {
            Ok(updated) => {
                self.issues.replace(updated.clone()).await;
                let message = match technician {
                    Some(t) => format!("{} asignado a la incidencia #{issue_id}", t.name),
                    None => format!("Incidencia #{issue_id} sin técnico asignado"),
                };
                self.notifier
                    .notify(NotificationPayload::success("Técnico asignado", message));
                tracing::info!(issue_id, technician_id = ?new_user_id, "Issue assignment saved");
                Ok(DropOutcome::Assigned {
                    issue: updated,
                    previous_user_id,
                })
            }
            Err(e) => {
                tracing::error!(issue_id, error = %e, "Issue assignment failed");
                self.notifier.notify(NotificationPayload::error(
                    "Error al asignar técnico",
                    e.to_string(),
                ));
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::ChannelNotifier;
    use crate::testing::{FakeApi, employee, issue};
    use shared::message::NotificationLevel;
    use shared::models::{EmployeeRole, IssueType};
    use std::time::Duration;
    use tokio::sync::mpsc::UnboundedReceiver;

    struct Fixture {
        api: Arc<FakeApi>,
        issues: IssueDirectory,
        matcher: Arc<AssignmentMatcher>,
        rx: UnboundedReceiver<NotificationPayload>,
    }

    async fn fixture() -> Fixture {
        let api = Arc::new(FakeApi::default());
        api.set_employees(vec![
            employee(1, "Ana", EmployeeRole::Tecnico),
            employee(2, "Cliente SA", EmployeeRole::Client),
        ]);
        api.set_issues(vec![
            issue(10, "Alpha", IssueType::Software, IssueStatus::Pendiente),
            issue(11, "Beta", IssueType::Equipo, IssueStatus::Resuelto),
        ]);

        let employees = EmployeeStore::new(api.clone());
        employees.refresh().await.unwrap();
        let issues = IssueDirectory::new(api.clone());
        issues.refresh().await.unwrap();

        let (notifier, rx) = ChannelNotifier::new();
        let matcher = Arc::new(AssignmentMatcher::new(
            api.clone(),
            employees,
            issues.clone(),
            Arc::new(notifier),
        ));
        Fixture {
            api,
            issues,
            matcher,
            rx,
        }
    }

    #[test]
    fn test_key_parsing() {
        assert_eq!("tech-42".parse::<DragKey>().unwrap(), DragKey(42));
        assert_eq!("problem-7".parse::<DropKey>().unwrap(), DropKey(7));
        assert!("problem-7".parse::<DragKey>().is_err());
        assert!("tech-".parse::<DragKey>().is_err());
        assert!("tech-abc".parse::<DragKey>().is_err());
        assert_eq!(DragKey(3).to_string(), "tech-3");
        assert_eq!(DropKey(9).to_string(), "problem-9");
    }

    #[tokio::test]
    async fn test_drop_assigns_and_replaces_with_server_record() {
        let mut fx = fixture().await;

        let tech = fx.matcher.drag_start("tech-1").await.unwrap();
        assert_eq!(tech.name, "Ana");
        assert_eq!(fx.matcher.active_technician().map(|t| t.id), Some(1));

        let outcome = fx.matcher.drop_on(Some("problem-10")).await.unwrap();
        let DropOutcome::Assigned {
            issue,
            previous_user_id,
        } = outcome
        else {
            panic!("expected assignment");
        };
        assert_eq!(issue.assigned_user_id, Some(1));
        assert_eq!(previous_user_id, None);

        let local = fx.issues.get(10).await.unwrap();
        assert_eq!(local, issue);
        assert_eq!(local.assigned_user.map(|u| u.name).as_deref(), Some("Ana"));

        assert_eq!(fx.api.assign_requests().len(), 1);
        assert_eq!(fx.matcher.state(), DragState::Idle);
        assert_eq!(fx.rx.recv().await.unwrap().level, NotificationLevel::Success);
    }

    #[tokio::test]
    async fn test_drop_on_empty_space_is_a_no_op() {
        let fx = fixture().await;
        let before = fx.issues.issues().await;

        fx.matcher.drag_start("tech-1").await.unwrap();
        let outcome = fx.matcher.drop_on(None).await.unwrap();

        assert_eq!(outcome, DropOutcome::NoTarget);
        assert_eq!(fx.issues.issues().await, before);
        assert!(fx.matcher.active_technician().is_none());
        assert!(fx.api.assign_requests().is_empty());
    }

    #[tokio::test]
    async fn test_drop_on_unparsable_target_is_a_no_op() {
        let fx = fixture().await;
        fx.matcher.drag_start("tech-1").await.unwrap();
        let outcome = fx.matcher.drop_on(Some("sidebar")).await.unwrap();
        assert_eq!(outcome, DropOutcome::NoTarget);
        assert!(fx.api.assign_requests().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_returns_to_idle_without_call() {
        let fx = fixture().await;
        fx.matcher.drag_start("tech-1").await.unwrap();
        fx.matcher.cancel();

        assert_eq!(fx.matcher.state(), DragState::Idle);
        assert!(matches!(
            fx.matcher.drop_on(Some("problem-10")).await,
            Err(AssignmentError::NotDragging)
        ));
        assert!(fx.api.assign_requests().is_empty());
    }

    #[tokio::test]
    async fn test_only_technicians_can_be_dragged() {
        let fx = fixture().await;
        assert!(matches!(
            fx.matcher.drag_start("tech-2").await,
            Err(AssignmentError::TechnicianNotFound(2))
        ));
        assert!(matches!(
            fx.matcher.drag_start("problem-1").await,
            Err(AssignmentError::InvalidKey(_))
        ));
        assert_eq!(fx.matcher.state(), DragState::Idle);
    }

    #[tokio::test]
    async fn test_failed_commit_leaves_list_untouched() {
        let mut fx = fixture().await;
        let before = fx.issues.issues().await;

        fx.matcher.drag_start("tech-1").await.unwrap();
        fx.api.fail_next_calls(1);
        let err = fx.matcher.drop_on(Some("problem-10")).await.unwrap_err();

        assert!(matches!(err, AssignmentError::Api(_)));
        assert_eq!(fx.issues.issues().await, before);
        assert_eq!(fx.matcher.state(), DragState::Idle);
        assert_eq!(fx.rx.recv().await.unwrap().level, NotificationLevel::Error);
    }

    #[tokio::test]
    async fn test_missing_issue_is_reported_without_call() {
        let mut fx = fixture().await;
        fx.matcher.drag_start("tech-1").await.unwrap();
        let err = fx.matcher.drop_on(Some("problem-404")).await.unwrap_err();

        assert!(matches!(err, AssignmentError::IssueNotFound(404)));
        assert!(fx.api.assign_requests().is_empty());
        assert_eq!(fx.rx.recv().await.unwrap().level, NotificationLevel::Error);
    }

    #[tokio::test]
    async fn test_reassignment_is_allowed_and_reports_previous() {
        let fx = fixture().await;
        fx.matcher.drag_start("tech-1").await.unwrap();
        fx.matcher.drop_on(Some("problem-11")).await.unwrap();

        fx.api.set_employees(vec![
            employee(1, "Ana", EmployeeRole::Tecnico),
            employee(3, "Luis", EmployeeRole::Tecnico),
        ]);
        let employees = EmployeeStore::new(fx.api.clone());
        employees.refresh().await.unwrap();
        let (notifier, _rx) = ChannelNotifier::new();
        let matcher = AssignmentMatcher::new(
            fx.api.clone(),
            employees,
            fx.issues.clone(),
            Arc::new(notifier),
        );

        matcher.drag_start("tech-3").await.unwrap();
        let outcome = matcher.drop_on(Some("problem-11")).await.unwrap();
        assert!(matches!(
            outcome,
            DropOutcome::Assigned { previous_user_id: Some(1), ref issue } if issue.assigned_user_id == Some(3)
        ));
    }

    #[tokio::test]
    async fn test_unassign_clears_technician() {
        let fx = fixture().await;
        fx.matcher.drag_start("tech-1").await.unwrap();
        fx.matcher.drop_on(Some("problem-10")).await.unwrap();

        fx.matcher.unassign(10).await.unwrap();
        let local = fx.issues.get(10).await.unwrap();
        assert!(local.assigned_user_id.is_none());
        assert!(local.assigned_user.is_none());
        assert_eq!(fx.api.assign_requests().last().unwrap().assigned_user_id, None);
    }

    #[tokio::test]
    async fn test_drag_rejected_while_committing() {
        let fx = fixture().await;
        fx.api.set_delay(Duration::from_millis(100));

        fx.matcher.drag_start("tech-1").await.unwrap();
        let pending = {
            let matcher = Arc::clone(&fx.matcher);
            tokio::spawn(async move { matcher.drop_on(Some("problem-10")).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(matches!(
            fx.matcher.state(),
            DragState::Committing {
                technician_id: Some(1),
                issue_id: 10
            }
        ));
        assert!(matches!(
            fx.matcher.drag_start("tech-1").await,
            Err(AssignmentError::Busy)
        ));

        pending.await.unwrap().unwrap();
        assert_eq!(fx.matcher.state(), DragState::Idle);
    }
}
