//! Employee ↔ project assignment from the admin edit form
//!
//! The backend takes one project per call, so a form save becomes a
//! sequence of calls. The sequence is not atomic: it stops at the first
//! failure and whatever was applied before stays applied.

use std::sync::Arc;

use shared::message::{NotificationPayload, SignalKind};
use shared::models::{AssignProjectRequest, ProjectAssignmentAction};

use crate::notify::Notifier;
use crate::providers::EmployeeStore;
use crate::signals::SignalBus;
use crate::{ClientError, FieldApi};

pub type ProjectChange = AssignProjectRequest;

/// Signal reason emitted after a batch changed something
pub const PROJECTS_CHANGED_REASON: &str = "employee-projects-changed";

#[derive(Debug)]
pub struct BatchOutcome {
    /// Changes the backend confirmed, in order
    pub applied: Vec<ProjectChange>,
    /// First failing project and its error; later changes were not sent
    pub failed: Option<(i64, ClientError)>,
}

impl BatchOutcome {
    pub fn is_complete(&self) -> bool {
        self.failed.is_none()
    }
}

pub struct ProjectAssigner {
    api: Arc<dyn FieldApi>,
    employees: EmployeeStore,
    bus: SignalBus,
    notifier: Arc<dyn Notifier>,
}

impl ProjectAssigner {
    pub fn new(
        api: Arc<dyn FieldApi>,
        employees: EmployeeStore,
        bus: SignalBus,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            api,
            employees,
            bus,
            notifier,
        }
    }

    /// Send `changes` one by one for `employee_id`.
    pub async fn apply(&self, employee_id: i64, changes: &[ProjectChange]) -> BatchOutcome {
        let mut outcome = BatchOutcome {
            applied: Vec::with_capacity(changes.len()),
            failed: None,
        };

        for change in changes {
            match self.api.assign_project(employee_id, change).await {
                Ok(response) => {
                    if response.already_exists() {
                        tracing::debug!(employee_id, project_id = change.project_id, "Project already assigned");
                    }
                    self.apply_locally(employee_id, *change).await;
                    outcome.applied.push(*change);
                }
                Err(e) => {
                    tracing::error!(
                        employee_id,
                        project_id = change.project_id,
                        applied = outcome.applied.len(),
                        "Project assignment failed: {e}"
                    );
                    self.notifier.notify(NotificationPayload::error(
                        "Error al actualizar proyectos",
                        format!(
                            "No se pudo actualizar el proyecto {} ({} de {} cambios aplicados): {e}",
                            change.project_id,
                            outcome.applied.len(),
                            changes.len()
                        ),
                    ));
                    outcome.failed = Some((change.project_id, e));
                    break;
                }
            }
        }

        if !outcome.applied.is_empty() {
            self.bus
                .emit(SignalKind::ProjectStatusUpdated, PROJECTS_CHANGED_REASON);
        }
        if outcome.is_complete() && !changes.is_empty() {
            self.notifier.notify(NotificationPayload::success(
                "Proyectos actualizados",
                format!("{} cambios aplicados", outcome.applied.len()),
            ));
        }
        outcome
    }

    async fn apply_locally(&self, employee_id: i64, change: ProjectChange) {
        self.employees
            .store()
            .update_where(
                |e| e.id == employee_id,
                |e| {
                    match change.action {
                        ProjectAssignmentAction::Assign => e.project_ids.insert(change.project_id),
                        ProjectAssignmentAction::Unassign => e.project_ids.remove(change.project_id),
                    };
                },
            )
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::ChannelNotifier;
    use crate::testing::{FakeApi, employee, project};
    use shared::message::NotificationLevel;
    use shared::models::EmployeeRole;

    struct Fixture {
        api: Arc<FakeApi>,
        employees: EmployeeStore,
        bus: SignalBus,
        assigner: ProjectAssigner,
        rx: tokio::sync::mpsc::UnboundedReceiver<NotificationPayload>,
    }

    async fn fixture() -> Fixture {
        let api = Arc::new(FakeApi::default());
        let mut ana = employee(1, "Ana", EmployeeRole::Tecnico);
        ana.project_ids.insert(1);
        api.set_employees(vec![ana]);
        api.set_projects(vec![project(1, "Alpha"), project(2, "Beta"), project(3, "Gamma")]);

        let employees = EmployeeStore::new(api.clone());
        employees.refresh().await.unwrap();
        let bus = SignalBus::new();
        let (notifier, rx) = ChannelNotifier::new();
        let assigner =
            ProjectAssigner::new(api.clone(), employees.clone(), bus.clone(), Arc::new(notifier));
        Fixture {
            api,
            employees,
            bus,
            assigner,
            rx,
        }
    }

    #[tokio::test]
    async fn test_assign_then_unassign_restores_project_names() {
        let fx = fixture().await;
        let projects = vec![project(1, "Alpha"), project(2, "Beta"), project(3, "Gamma")];
        let before = fx.employees.get(1).await.unwrap().project_names(&projects);
        assert_eq!(before, "Alpha");

        let outcome = fx.assigner.apply(1, &[AssignProjectRequest::assign(2)]).await;
        assert!(outcome.is_complete());
        let assigned = fx.employees.get(1).await.unwrap().project_names(&projects);
        assert_eq!(assigned, "Alpha, Beta");

        fx.assigner.apply(1, &[AssignProjectRequest::unassign(2)]).await;
        let after = fx.employees.get(1).await.unwrap().project_names(&projects);
        assert_eq!(after, before);
    }

    #[tokio::test]
    async fn test_already_assigned_is_success_without_duplicates() {
        let fx = fixture().await;
        let outcome = fx.assigner.apply(1, &[AssignProjectRequest::assign(1)]).await;
        assert!(outcome.is_complete());
        assert_eq!(outcome.applied.len(), 1);
        assert_eq!(fx.employees.get(1).await.unwrap().project_ids.len(), 1);
    }

    #[tokio::test]
    async fn test_batch_stops_at_first_failure() {
        let mut fx = fixture().await;
        fx.api.fail_project(3);
        let mut signals = fx.bus.subscribe();

        let outcome = fx
            .assigner
            .apply(
                1,
                &[
                    AssignProjectRequest::assign(2),
                    AssignProjectRequest::assign(3),
                    AssignProjectRequest::unassign(1),
                ],
            )
            .await;

        assert_eq!(outcome.applied, vec![AssignProjectRequest::assign(2)]);
        let (failed_id, _) = outcome.failed.as_ref().unwrap();
        assert_eq!(*failed_id, 3);
        // refresh + two assign_project calls; the third change was never sent
        assert_eq!(fx.api.calls(), 3);

        let local = fx.employees.get(1).await.unwrap();
        assert!(local.project_ids.contains(1));
        assert!(local.project_ids.contains(2));
        assert!(!local.project_ids.contains(3));

        let note = fx.rx.recv().await.unwrap();
        assert_eq!(note.level, NotificationLevel::Error);
        assert!(fx.rx.try_recv().is_err());

        let signal = signals.recv().await.unwrap();
        assert_eq!(signal.kind, SignalKind::ProjectStatusUpdated);
        assert_eq!(signal.reason, PROJECTS_CHANGED_REASON);
    }

    #[tokio::test]
    async fn test_no_signal_when_nothing_applied() {
        let fx = fixture().await;
        fx.api.fail_project(2);
        let outcome = fx.assigner.apply(1, &[AssignProjectRequest::assign(2)]).await;
        assert!(outcome.applied.is_empty());
        assert_eq!(fx.bus.current_version(), 0);
    }
}
