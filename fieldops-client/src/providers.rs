//! Employee and project providers
//!
//! Both expose the same contract: `items`, `set_items`, `loading`,
//! `error` and `refresh()`. A failed refresh keeps the previous list.

use std::sync::Arc;

use shared::models::{Employee, EmployeeCreate, EmployeeUpdate, Project};
use validator::Validate;

use crate::store::{CollectionStore, StoreSnapshot};
use crate::{ClientResult, FieldApi};

/// Project provider
#[derive(Clone)]
pub struct ProjectStore {
    api: Arc<dyn FieldApi>,
    store: CollectionStore<Project>,
}

impl ProjectStore {
    pub fn new(api: Arc<dyn FieldApi>) -> Self {
        Self {
            api,
            store: CollectionStore::new("projects"),
        }
    }

    pub async fn refresh(&self) -> ClientResult<usize> {
        let api = Arc::clone(&self.api);
        self.store
            .refresh_with(async move { api.list_projects().await })
            .await
    }

    pub async fn snapshot(&self) -> StoreSnapshot<Project> {
        self.store.snapshot().await
    }

    pub async fn items(&self) -> Vec<Project> {
        self.store.items().await
    }

    pub async fn set_items(&self, items: Vec<Project>) {
        self.store.set_items(items).await
    }

    pub async fn get(&self, id: i64) -> Option<Project> {
        self.store.find(|p| p.id == id).await
    }

    pub fn store(&self) -> &CollectionStore<Project> {
        &self.store
    }
}

/// Employee provider with the admin edit operations
#[derive(Clone)]
pub struct EmployeeStore {
    api: Arc<dyn FieldApi>,
    store: CollectionStore<Employee>,
    projects: Option<ProjectStore>,
}

impl EmployeeStore {
    pub fn new(api: Arc<dyn FieldApi>) -> Self {
        Self {
            api,
            store: CollectionStore::new("employees"),
            projects: None,
        }
    }

    /// Resolve legacy project-name labels against this project store on
    /// every refresh.
    pub fn with_projects(mut self, projects: ProjectStore) -> Self {
        self.projects = Some(projects);
        self
    }

    pub async fn refresh(&self) -> ClientResult<usize> {
        let api = Arc::clone(&self.api);
        let projects = match &self.projects {
            Some(store) => store.items().await,
            None => Vec::new(),
        };
        self.store
            .refresh_with(async move {
                let mut employees = api.list_employees().await?;
                if !projects.is_empty() {
                    for employee in &mut employees {
                        employee.resolve_legacy_projects(&projects);
                    }
                }
                Ok(employees)
            })
            .await
    }

    pub async fn snapshot(&self) -> StoreSnapshot<Employee> {
        self.store.snapshot().await
    }

    pub async fn items(&self) -> Vec<Employee> {
        self.store.items().await
    }

    pub async fn set_items(&self, items: Vec<Employee>) {
        self.store.set_items(items).await
    }

    pub async fn get(&self, id: i64) -> Option<Employee> {
        self.store.find(|e| e.id == id).await
    }

    /// Employees eligible for issue assignment
    pub async fn technicians(&self) -> Vec<Employee> {
        self.store.filter(Employee::is_technician).await
    }

    /// Create an employee; appended locally once the backend confirms.
    pub async fn create(&self, payload: &EmployeeCreate) -> ClientResult<Employee> {
        payload.validate()?;
        let created = self.api.create_employee(payload).await?;
        let id = created.id;
        self.store.upsert_where(|e| e.id == id, created.clone()).await;
        tracing::info!(employee_id = id, "Employee created");
        Ok(created)
    }

    /// Update an employee; the server's record replaces the local one.
    pub async fn update(&self, id: i64, payload: &EmployeeUpdate) -> ClientResult<Employee> {
        let mut updated = self.api.update_employee(id, payload).await?;
        if let Some(projects) = &self.projects {
            updated.resolve_legacy_projects(&projects.items().await);
        }
        self.store.upsert_where(|e| e.id == id, updated.clone()).await;
        tracing::info!(employee_id = id, "Employee updated");
        Ok(updated)
    }

    pub async fn delete(&self, id: i64) -> ClientResult<()> {
        self.api.delete_employee(id).await?;
        self.store.remove_where(|e| e.id == id).await;
        tracing::info!(employee_id = id, "Employee deleted");
        Ok(())
    }

    pub fn store(&self) -> &CollectionStore<Employee> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeApi, employee, project};
    use shared::models::EmployeeRole;

    #[tokio::test]
    async fn test_initial_refresh_and_technician_filter() {
        let api = Arc::new(FakeApi::default());
        api.set_employees(vec![
            employee(1, "Ana", EmployeeRole::Tecnico),
            employee(2, "Cliente SA", EmployeeRole::Client),
            employee(3, "Luis", EmployeeRole::Tecnico),
        ]);
        let store = EmployeeStore::new(api.clone());

        assert_eq!(store.refresh().await.unwrap(), 3);
        let techs: Vec<i64> = store.technicians().await.iter().map(|e| e.id).collect();
        assert_eq!(techs, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_both_providers_keep_data_on_error() {
        let api = Arc::new(FakeApi::default());
        api.set_employees(vec![employee(1, "Ana", EmployeeRole::Tecnico)]);
        api.set_projects(vec![project(1, "Alpha")]);

        let employees = EmployeeStore::new(api.clone());
        let projects = ProjectStore::new(api.clone());
        employees.refresh().await.unwrap();
        projects.refresh().await.unwrap();

        api.fail_next_calls(2);
        assert!(employees.refresh().await.is_err());
        assert!(projects.refresh().await.is_err());

        let e = employees.snapshot().await;
        let p = projects.snapshot().await;
        assert_eq!(e.items.len(), 1);
        assert_eq!(p.items.len(), 1);
        assert!(e.error.is_some());
        assert!(p.error.is_some());
    }

    #[tokio::test]
    async fn test_refresh_resolves_legacy_project_labels() {
        let api = Arc::new(FakeApi::default());
        api.set_projects(vec![project(10, "Alpha"), project(11, "Beta")]);
        let mut legacy = employee(1, "Ana", EmployeeRole::Tecnico);
        legacy.project_label = Some("Beta, Alpha".into());
        api.set_employees(vec![legacy]);

        let projects = ProjectStore::new(api.clone());
        projects.refresh().await.unwrap();
        let employees = EmployeeStore::new(api.clone()).with_projects(projects.clone());
        employees.refresh().await.unwrap();

        let ana = employees.get(1).await.unwrap();
        assert_eq!(ana.project_ids.iter().collect::<Vec<_>>(), vec![11, 10]);
    }

    #[tokio::test]
    async fn test_admin_operations_mutate_local_list() {
        let api = Arc::new(FakeApi::default());
        let store = EmployeeStore::new(api.clone());

        let created = store
            .create(&EmployeeCreate {
                name: "Marta".into(),
                email: "marta@example.com".into(),
                phone: None,
                role: EmployeeRole::Tecnico,
                password: None,
            })
            .await
            .unwrap();
        assert_eq!(store.items().await.len(), 1);

        let updated = store
            .update(
                created.id,
                &EmployeeUpdate {
                    name: Some("Marta G.".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Marta G.");
        assert_eq!(store.get(created.id).await.unwrap().name, "Marta G.");

        store.delete(created.id).await.unwrap();
        assert!(store.items().await.is_empty());
    }

    #[tokio::test]
    async fn test_create_rejects_blank_name_without_network_call() {
        let api = Arc::new(FakeApi::default());
        let store = EmployeeStore::new(api.clone());

        let err = store
            .create(&EmployeeCreate {
                name: String::new(),
                email: "x@example.com".into(),
                phone: None,
                role: EmployeeRole::Tecnico,
                password: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Validation);
        assert_eq!(api.calls(), 0);
    }
}
