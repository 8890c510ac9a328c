//! In-memory `FieldApi` used by the unit tests

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use shared::models::{
    AssignProjectRequest, AssignTechnicianRequest, AssignedProjects, AssignedUser,
    AttendanceStatus, Checkpoint, Employee, EmployeeCreate, EmployeeRole, EmployeeUpdate, Issue,
    IssueStatus, IssueType, Project, ProjectAssignmentAction, ProjectStatus,
};
use shared::response::MessageResponse;

use crate::{ClientError, ClientResult, FieldApi};

#[derive(Default)]
pub struct FakeApi {
    employees: Mutex<Vec<Employee>>,
    projects: Mutex<Vec<Project>>,
    issues: Mutex<Vec<Issue>>,
    checkpoints: Mutex<Vec<Checkpoint>>,
    assign_requests: Mutex<Vec<AssignTechnicianRequest>>,
    calls: AtomicUsize,
    fail_next: AtomicUsize,
    fail_project: Mutex<Option<i64>>,
    delay_ms: AtomicU64,
}

impl FakeApi {
    pub fn set_employees(&self, items: Vec<Employee>) {
        *self.employees.lock().unwrap() = items;
    }

    pub fn set_projects(&self, items: Vec<Project>) {
        *self.projects.lock().unwrap() = items;
    }

    pub fn set_issues(&self, items: Vec<Issue>) {
        *self.issues.lock().unwrap() = items;
    }

    pub fn set_checkpoints(&self, items: Vec<Checkpoint>) {
        *self.checkpoints.lock().unwrap() = items;
    }

    pub fn employees(&self) -> Vec<Employee> {
        self.employees.lock().unwrap().clone()
    }

    /// Make the next `n` calls fail with an internal error
    pub fn fail_next_calls(&self, n: usize) {
        self.fail_next.store(n, Ordering::SeqCst);
    }

    /// Make `assign_project` fail for this project id
    pub fn fail_project(&self, project_id: i64) {
        *self.fail_project.lock().unwrap() = Some(project_id);
    }

    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Total calls made, failed ones included
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn assign_requests(&self) -> Vec<AssignTechnicianRequest> {
        self.assign_requests.lock().unwrap().clone()
    }

    async fn enter(&self) -> ClientResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        let injected = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(ClientError::Internal("injected failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl FieldApi for FakeApi {
    async fn list_employees(&self) -> ClientResult<Vec<Employee>> {
        self.enter().await?;
        Ok(self.employees())
    }

    async fn create_employee(&self, payload: &EmployeeCreate) -> ClientResult<Employee> {
        self.enter().await?;
        let mut employees = self.employees.lock().unwrap();
        let id = employees.iter().map(|e| e.id).max().unwrap_or(0) + 1;
        let mut created = employee(id, &payload.name, payload.role);
        created.email = Some(payload.email.clone());
        employees.push(created.clone());
        Ok(created)
    }

    async fn update_employee(&self, id: i64, payload: &EmployeeUpdate) -> ClientResult<Employee> {
        self.enter().await?;
        let mut employees = self.employees.lock().unwrap();
        let employee = employees
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| ClientError::NotFound(format!("employee {id}")))?;
        payload.apply_to(employee);
        Ok(employee.clone())
    }

    async fn delete_employee(&self, id: i64) -> ClientResult<()> {
        self.enter().await?;
        self.employees.lock().unwrap().retain(|e| e.id != id);
        Ok(())
    }

    async fn list_projects(&self) -> ClientResult<Vec<Project>> {
        self.enter().await?;
        Ok(self.projects.lock().unwrap().clone())
    }

    async fn list_issues(&self) -> ClientResult<Vec<Issue>> {
        self.enter().await?;
        Ok(self.issues.lock().unwrap().clone())
    }

    async fn pending_issue_count(&self) -> ClientResult<u64> {
        self.enter().await?;
        Ok(self
            .issues
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.is_pending())
            .count() as u64)
    }

    async fn assign_technician(&self, request: &AssignTechnicianRequest) -> ClientResult<Issue> {
        self.enter().await?;
        self.assign_requests.lock().unwrap().push(*request);

        let snapshot = match request.assigned_user_id {
            Some(user_id) => {
                let employees = self.employees.lock().unwrap();
                let tech = employees
                    .iter()
                    .find(|e| e.id == user_id)
                    .ok_or_else(|| ClientError::NotFound(format!("user {user_id}")))?;
                Some(AssignedUser {
                    id: tech.id,
                    name: tech.name.clone(),
                    email: tech.email.clone(),
                    avatar: tech.avatar.clone(),
                })
            }
            None => None,
        };

        let mut issues = self.issues.lock().unwrap();
        let issue = issues
            .iter_mut()
            .find(|i| i.id == request.issue_id)
            .ok_or_else(|| ClientError::NotFound(format!("issue {}", request.issue_id)))?;
        issue.assigned_user_id = request.assigned_user_id;
        issue.assigned_user = snapshot;
        Ok(issue.clone())
    }

    async fn assign_project(
        &self,
        employee_id: i64,
        request: &AssignProjectRequest,
    ) -> ClientResult<MessageResponse> {
        self.enter().await?;
        if *self.fail_project.lock().unwrap() == Some(request.project_id) {
            return Err(ClientError::Api {
                status: 500,
                message: "assignment failed".into(),
            });
        }
        let mut employees = self.employees.lock().unwrap();
        let employee = employees
            .iter_mut()
            .find(|e| e.id == employee_id)
            .ok_or_else(|| ClientError::NotFound(format!("employee {employee_id}")))?;
        let changed = match request.action {
            ProjectAssignmentAction::Assign => employee.project_ids.insert(request.project_id),
            ProjectAssignmentAction::Unassign => employee.project_ids.remove(request.project_id),
        };
        Ok(MessageResponse {
            message: "ok".into(),
            already_exists: Some(!changed && request.action == ProjectAssignmentAction::Assign),
        })
    }

    async fn list_checkpoints(&self, project_id: i64) -> ClientResult<Vec<Checkpoint>> {
        self.enter().await?;
        Ok(self
            .checkpoints
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.project_id == project_id)
            .cloned()
            .collect())
    }
}

pub fn employee(id: i64, name: &str, role: EmployeeRole) -> Employee {
    Employee {
        id,
        name: name.to_string(),
        email: None,
        phone: None,
        role,
        status: AttendanceStatus::Presente,
        avatar: None,
        project_ids: AssignedProjects::new(),
        project_label: None,
    }
}

pub fn project(id: i64, name: &str) -> Project {
    Project {
        id,
        name: name.to_string(),
        status: ProjectStatus::Activo,
        progress: 0,
        total_parts: 0,
        completed_parts: 0,
        start_date: None,
        end_date: None,
        technicians: Vec::new(),
        location: None,
    }
}

pub fn issue(id: i64, project: &str, issue_type: IssueType, status: IssueStatus) -> Issue {
    Issue {
        id,
        issue_type,
        project: project.to_string(),
        location: String::new(),
        description: None,
        status,
        created_at: None,
        updated_at: None,
        assigned_user_id: None,
        assigned_user: None,
    }
}
