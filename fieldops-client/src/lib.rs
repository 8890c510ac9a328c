//! FieldOps Client - headless core of the field-operations dashboard
//!
//! REST access, cached collections, the issue directory, drag-and-drop
//! assignment, dashboard metrics and report aggregation.

pub mod assignment;
pub mod config;
pub mod error;
pub mod http;
pub mod issues;
pub mod metrics;
pub mod notify;
pub mod projects;
pub mod providers;
pub mod report;
pub mod session;
pub mod signals;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub use assignment::{AssignmentError, AssignmentMatcher, DragKey, DragState, DropKey, DropOutcome};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult, ErrorKind};
pub use http::{FieldApi, NetworkHttpClient};
pub use issues::{IssueDirectory, IssueFilter};
pub use metrics::DashboardMetrics;
pub use notify::{ChannelNotifier, Notifier, TracingNotifier};
pub use projects::{BatchOutcome, ProjectAssigner, ProjectChange};
pub use providers::{EmployeeStore, ProjectStore};
pub use report::ProjectReport;
pub use session::{Session, SessionError, SessionStore};
pub use signals::{RefreshTargets, RefreshWorker, SignalBus};
pub use store::{CollectionStore, StoreSnapshot};

/// Everything a dashboard shell needs, wired once.
pub struct FieldOps {
    config: ClientConfig,
    api: Arc<dyn FieldApi>,
    projects: ProjectStore,
    employees: EmployeeStore,
    issues: IssueDirectory,
    matcher: Arc<AssignmentMatcher>,
    assigner: Arc<ProjectAssigner>,
    bus: SignalBus,
}

impl FieldOps {
    /// Connect to the configured backend over HTTP.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let api = Arc::new(config.build_http_client()?);
        Ok(Self::with_api(api, config))
    }

    pub fn with_api(api: Arc<dyn FieldApi>, config: ClientConfig) -> Self {
        Self::with_notifier(api, config, Arc::new(TracingNotifier))
    }

    pub fn with_notifier(
        api: Arc<dyn FieldApi>,
        config: ClientConfig,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let projects = ProjectStore::new(Arc::clone(&api));
        let employees = EmployeeStore::new(Arc::clone(&api)).with_projects(projects.clone());
        let issues = IssueDirectory::new(Arc::clone(&api));
        let bus = SignalBus::new();

        let matcher = Arc::new(AssignmentMatcher::new(
            Arc::clone(&api),
            employees.clone(),
            issues.clone(),
            Arc::clone(&notifier),
        ));
        let assigner = Arc::new(ProjectAssigner::new(
            Arc::clone(&api),
            employees.clone(),
            bus.clone(),
            notifier,
        ));

        Self {
            config,
            api,
            projects,
            employees,
            issues,
            matcher,
            assigner,
            bus,
        }
    }

    /// Initial load of every collection.
    ///
    /// Projects load first so employee project labels resolve. Failures are
    /// logged and left on each store's error flag.
    pub async fn bootstrap(&self) {
        if let Err(e) = self.projects.refresh().await {
            tracing::error!("Initial project load failed: {e}");
        }
        let (employees, issues) = tokio::join!(self.employees.refresh(), self.issues.refresh());
        if let Err(e) = employees {
            tracing::error!("Initial employee load failed: {e}");
        }
        if let Err(e) = issues {
            tracing::error!("Initial issue load failed: {e}");
        }
    }

    /// Start the debounced refresh loop; it stops when `cancel` fires.
    pub fn spawn_refresh_worker(&self, cancel: CancellationToken) -> JoinHandle<()> {
        let targets = RefreshTargets {
            projects: self.projects.clone(),
            employees: self.employees.clone(),
            issues: self.issues.clone(),
        };
        let worker = RefreshWorker::new(
            self.bus.clone(),
            targets,
            Duration::from_millis(self.config.refresh_debounce_ms),
            cancel,
        );
        tokio::spawn(worker.run())
    }

    /// Dashboard numbers from the current snapshots
    pub async fn metrics(&self, now: DateTime<Utc>) -> DashboardMetrics {
        let (employees, projects, issues) = tokio::join!(
            self.employees.items(),
            self.projects.items(),
            self.issues.issues()
        );
        DashboardMetrics::compute(&employees, &projects, &issues, now)
    }

    /// Build the report for a loaded project from its checkpoint log.
    pub async fn report(&self, project_id: i64, now: DateTime<Utc>) -> ClientResult<ProjectReport> {
        let project = self
            .projects
            .get(project_id)
            .await
            .ok_or_else(|| ClientError::NotFound(format!("project {project_id}")))?;
        let checkpoints = self.api.list_checkpoints(project_id).await?;
        Ok(ProjectReport::build(&project, &checkpoints, now))
    }

    /// Session file under the configured directory, if one is set
    pub fn session(&self) -> Option<SessionStore> {
        self.config.session_dir.as_deref().map(SessionStore::new)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn api(&self) -> &Arc<dyn FieldApi> {
        &self.api
    }

    pub fn projects(&self) -> &ProjectStore {
        &self.projects
    }

    pub fn employees(&self) -> &EmployeeStore {
        &self.employees
    }

    pub fn issues(&self) -> &IssueDirectory {
        &self.issues
    }

    pub fn matcher(&self) -> &Arc<AssignmentMatcher> {
        &self.matcher
    }

    pub fn assigner(&self) -> &Arc<ProjectAssigner> {
        &self.assigner
    }

    pub fn bus(&self) -> &SignalBus {
        &self.bus
    }
}
