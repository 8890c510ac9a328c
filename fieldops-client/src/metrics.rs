//! Dashboard metrics
//!
//! Pure functions over already-loaded lists. Nothing here is cached or
//! shared: every call derives a fresh value from its inputs, with `now`
//! passed in explicitly.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use shared::models::{Employee, Issue, IssueStatus, Project, ProjectStatus};
use shared::util::split_list;

const DAY_MS: f64 = 86_400_000.0;
/// Below this many days left a project is checked against expected progress
const DELAY_WINDOW_DAYS: i64 = 14;
/// Expected progress consumed per remaining day, in percentage points
const PROGRESS_PER_DAY: i64 = 2;
/// Label for entities with no category
pub const UNCATEGORIZED: &str = "Sin categoría";

/// Percentage of employees marked `presente`, rounded; 0 for no employees.
pub fn attendance_rate(employees: &[Employee]) -> u32 {
    if employees.is_empty() {
        return 0;
    }
    let present = employees.iter().filter(|e| e.is_present()).count();
    (100.0 * present as f64 / employees.len() as f64).round() as u32
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProjectStatusCounts {
    pub active: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub other: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StatusPercentages {
    pub active: f64,
    pub in_progress: f64,
    pub completed: f64,
}

impl ProjectStatusCounts {
    pub fn from_projects(projects: &[Project]) -> Self {
        let mut counts = Self {
            total: projects.len(),
            ..Self::default()
        };
        for project in projects {
            match project.status {
                ProjectStatus::Activo => counts.active += 1,
                ProjectStatus::EnProgreso => counts.in_progress += 1,
                ProjectStatus::Completado => counts.completed += 1,
                ProjectStatus::Unknown => counts.other += 1,
            }
        }
        counts
    }

    /// Share of each status; all zero when there are no projects.
    pub fn percentages(&self) -> StatusPercentages {
        let pct = |n: usize| {
            if self.total == 0 {
                0.0
            } else {
                100.0 * n as f64 / self.total as f64
            }
        };
        StatusPercentages {
            active: pct(self.active),
            in_progress: pct(self.in_progress),
            completed: pct(self.completed),
        }
    }
}

fn end_of(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0).map(|n| n.and_utc())
}

/// Whole days until the project's end date, rounded up; negative once the
/// end date has passed. `None` without an end date.
pub fn days_remaining(project: &Project, now: DateTime<Utc>) -> Option<i64> {
    let end = end_of(project.end_date?)?;
    let diff_ms = (end - now).num_milliseconds() as f64;
    Some((diff_ms / DAY_MS).ceil() as i64)
}

/// Mean days remaining over open projects whose end date is still ahead,
/// rounded; 0 when none qualify.
pub fn average_days_remaining(projects: &[Project], now: DateTime<Utc>) -> i64 {
    let remaining: Vec<i64> = projects
        .iter()
        .filter(|p| p.is_open())
        .filter_map(|p| days_remaining(p, now))
        .filter(|days| *days > 0)
        .collect();
    if remaining.is_empty() {
        return 0;
    }
    (remaining.iter().sum::<i64>() as f64 / remaining.len() as f64).round() as i64
}

/// An open project is delayed when its end date has passed, or when fewer
/// than 14 days remain and progress is under `100 - 2 * days_left`.
pub fn is_delayed(project: &Project, now: DateTime<Utc>) -> bool {
    if !project.is_open() {
        return false;
    }
    let Some(end) = project.end_date.and_then(end_of) else {
        return false;
    };
    if end < now {
        return true;
    }
    let Some(days_left) = days_remaining(project, now) else {
        return false;
    };
    if days_left >= DELAY_WINDOW_DAYS {
        return false;
    }
    let expected = (100 - PROGRESS_PER_DAY * days_left).max(0);
    i64::from(project.progress) < expected
}

pub fn delayed_projects(projects: &[Project], now: DateTime<Utc>) -> Vec<&Project> {
    projects.iter().filter(|p| is_delayed(p, now)).collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct IssueCounts {
    pub total: usize,
    pub pending: usize,
    pub in_review: usize,
    pub resolved: usize,
    /// Statuses the backend sent that this client does not know
    pub other: usize,
    pub assigned: usize,
    /// Resolved share in percent; 0 for no issues
    pub resolution_rate: f64,
}

impl IssueCounts {
    pub fn from_issues(issues: &[Issue]) -> Self {
        let mut counts = Self {
            total: issues.len(),
            ..Self::default()
        };
        for issue in issues {
            match issue.status {
                IssueStatus::Pendiente => counts.pending += 1,
                IssueStatus::EnRevision => counts.in_review += 1,
                IssueStatus::Resuelto => counts.resolved += 1,
                IssueStatus::Unknown => counts.other += 1,
            }
            if issue.is_assigned() {
                counts.assigned += 1;
            }
        }
        if counts.total > 0 {
            counts.resolution_rate = 100.0 * counts.resolved as f64 / counts.total as f64;
        }
        counts
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub name: String,
    /// Entities listing this category
    pub count: usize,
    /// `count` over all entities; overlapping categories make these sum
    /// past 100
    pub percentage: f64,
    /// `count` over all category mentions; always sums to 100
    pub share: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategoryDistribution {
    pub entities: usize,
    pub mentions: usize,
    pub categories: Vec<CategoryShare>,
}

impl CategoryDistribution {
    pub fn get(&self, name: &str) -> Option<&CategoryShare> {
        self.categories.iter().find(|c| c.name == name)
    }
}

/// Group entities by a comma-separated, possibly multi-valued category.
///
/// An entity counts once toward every distinct category it lists; one
/// with no category counts toward [`UNCATEGORIZED`]. Ordered by count,
/// then name.
pub fn category_distribution<'a, I>(raw_categories: I) -> CategoryDistribution
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut entities = 0;
    let mut mentions = 0;

    for raw in raw_categories {
        entities += 1;
        let mut names: Vec<&str> = raw.map(|r| split_list(r).collect()).unwrap_or_default();
        names.sort_unstable();
        names.dedup();
        if names.is_empty() {
            names.push(UNCATEGORIZED);
        }
        for name in names {
            *counts.entry(name.to_string()).or_default() += 1;
            mentions += 1;
        }
    }

    let mut categories: Vec<CategoryShare> = counts
        .into_iter()
        .map(|(name, count)| CategoryShare {
            name,
            count,
            percentage: 100.0 * count as f64 / entities as f64,
            share: 100.0 * count as f64 / mentions as f64,
        })
        .collect();
    categories.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));

    CategoryDistribution {
        entities,
        mentions,
        categories,
    }
}

/// Everything the dashboard header shows, computed in one pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardMetrics {
    pub generated_at: DateTime<Utc>,
    pub employees_total: usize,
    pub technicians: usize,
    pub attendance_rate: u32,
    pub projects: ProjectStatusCounts,
    pub project_percentages: StatusPercentages,
    pub average_days_remaining: i64,
    pub delayed_project_ids: Vec<i64>,
    pub issues: IssueCounts,
    pub issue_types: CategoryDistribution,
}

impl DashboardMetrics {
    pub fn compute(
        employees: &[Employee],
        projects: &[Project],
        issues: &[Issue],
        now: DateTime<Utc>,
    ) -> Self {
        let project_counts = ProjectStatusCounts::from_projects(projects);
        Self {
            generated_at: now,
            employees_total: employees.len(),
            technicians: employees.iter().filter(|e| e.is_technician()).count(),
            attendance_rate: attendance_rate(employees),
            projects: project_counts,
            project_percentages: project_counts.percentages(),
            average_days_remaining: average_days_remaining(projects, now),
            delayed_project_ids: delayed_projects(projects, now).iter().map(|p| p.id).collect(),
            issues: IssueCounts::from_issues(issues),
            issue_types: category_distribution(
                issues.iter().map(|i| Some(i.issue_type.as_str())),
            ),
        }
    }
}
