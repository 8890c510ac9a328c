//! Issue directory: fetch, count and filter reported problems
//!
//! The full list is always materialised client-side; there is no
//! pagination.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use shared::models::{Issue, IssueStatus, IssueType};

use crate::store::{CollectionStore, StoreSnapshot};
use crate::{ClientResult, FieldApi};

/// Four independent filters combined with AND. `None` (and a blank
/// project string) matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueFilter {
    /// Case-insensitive substring of the project name
    pub project: Option<String>,
    pub issue_type: Option<IssueType>,
    pub status: Option<IssueStatus>,
    /// Calendar date (UTC) of `created_at`
    pub date: Option<NaiveDate>,
}

impl IssueFilter {
    pub fn project(mut self, needle: impl Into<String>) -> Self {
        self.project = Some(needle.into());
        self
    }

    pub fn issue_type(mut self, issue_type: IssueType) -> Self {
        self.issue_type = Some(issue_type);
        self
    }

    pub fn status(mut self, status: IssueStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn matches(&self, issue: &Issue) -> bool {
        let project_ok = match self.project.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(needle) => issue
                .project
                .to_lowercase()
                .contains(&needle.to_lowercase()),
        };
        let type_ok = self.issue_type.is_none_or(|t| issue.issue_type == t);
        let status_ok = self.status.is_none_or(|s| issue.status == s);
        let date_ok = match self.date {
            None => true,
            Some(day) => issue.created_at.is_some_and(|ts| ts.date_naive() == day),
        };
        project_ok && type_ok && status_ok && date_ok
    }

    pub fn apply<'a>(&self, issues: &'a [Issue]) -> Vec<&'a Issue> {
        issues.iter().filter(|i| self.matches(i)).collect()
    }
}

/// Issue directory backed by a collection store
#[derive(Clone)]
pub struct IssueDirectory {
    api: Arc<dyn FieldApi>,
    store: CollectionStore<Issue>,
}

impl IssueDirectory {
    pub fn new(api: Arc<dyn FieldApi>) -> Self {
        Self {
            api,
            store: CollectionStore::new("issues"),
        }
    }

    pub async fn refresh(&self) -> ClientResult<usize> {
        let api = Arc::clone(&self.api);
        self.store
            .refresh_with(async move { api.list_issues().await })
            .await
    }

    /// Full current issue list
    pub async fn issues(&self) -> Vec<Issue> {
        self.store.items().await
    }

    pub async fn snapshot(&self) -> StoreSnapshot<Issue> {
        self.store.snapshot().await
    }

    pub async fn set_items(&self, items: Vec<Issue>) {
        self.store.set_items(items).await
    }

    pub async fn get(&self, id: i64) -> Option<Issue> {
        self.store.find(|i| i.id == id).await
    }

    /// Count of `pendiente` issues in the loaded list
    pub async fn pending_count(&self) -> usize {
        self.store.filter(Issue::is_pending).await.len()
    }

    /// Pending count as computed by the backend
    pub async fn remote_pending_count(&self) -> ClientResult<u64> {
        self.api.pending_issue_count().await
    }

    /// Replace the issue with the same id by `issue`, wholesale.
    ///
    /// Fields missing from `issue` are not carried over from the old
    /// entry. Returns `false` when no local issue has that id.
    pub async fn replace(&self, issue: Issue) -> bool {
        let id = issue.id;
        self.store.replace_where(|i| i.id == id, issue).await
    }

    pub async fn filtered(&self, filter: &IssueFilter) -> Vec<Issue> {
        self.store.filter(|i| filter.matches(i)).await
    }
}
