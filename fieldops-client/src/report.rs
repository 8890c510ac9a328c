//! Project report aggregation
//!
//! Turns a project's checkpoint log into the numbers the report view
//! renders: category breakdown, per-technician activity and a completion
//! projection from the observed scan rate.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use shared::models::{Checkpoint, Project};

use crate::metrics::{self, CategoryDistribution};

/// Label for checkpoints without a technician
pub const UNASSIGNED: &str = "Sin asignar";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TechnicianStats {
    pub name: String,
    pub checkpoints: usize,
    pub failed: usize,
    pub first_scan: DateTime<Utc>,
    pub last_scan: DateTime<Utc>,
    /// Distinct calendar days with at least one scan
    pub active_days: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeProjection {
    pub remaining_parts: u32,
    pub parts_per_day: f64,
    pub projected_days: Option<i64>,
    pub projected_completion: Option<DateTime<Utc>>,
    /// `None` when there is no projection or no end date
    pub on_track: Option<bool>,
}

impl TimeProjection {
    fn compute(project: &Project, checkpoints: &[Checkpoint], now: DateTime<Utc>) -> Self {
        let remaining_parts = project.remaining_parts();
        let passed = checkpoints.iter().filter(|c| c.passed).count();
        let days: BTreeSet<NaiveDate> = checkpoints
            .iter()
            .map(|c| c.scanned_at.date_naive())
            .collect();

        let parts_per_day = if days.is_empty() {
            0.0
        } else {
            passed as f64 / days.len() as f64
        };

        let has_rate = remaining_parts == 0 || parts_per_day > 0.0;
        let projected_days = if remaining_parts == 0 {
            Some(0)
        } else if parts_per_day > 0.0 {
            let days = (f64::from(remaining_parts) / parts_per_day).ceil();
            (days < i64::MAX as f64).then_some(days as i64)
        } else {
            None
        };
        // None when the date falls outside the representable range
        let projected_completion = projected_days
            .and_then(Duration::try_days)
            .and_then(|delta| now.checked_add_signed(delta));
        let on_track = match (projected_completion, project.end_date) {
            (Some(done), Some(end)) => Some(done.date_naive() <= end),
            (None, Some(_)) if has_rate => Some(false),
            _ => None,
        };

        Self {
            remaining_parts,
            parts_per_day,
            projected_days,
            projected_completion,
            on_track,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectReport {
    pub project_id: i64,
    pub project_name: String,
    pub generated_at: DateTime<Utc>,
    pub total_checkpoints: usize,
    pub failed_checkpoints: usize,
    pub categories: CategoryDistribution,
    pub technicians: Vec<TechnicianStats>,
    pub projection: TimeProjection,
    pub delayed: bool,
}

impl ProjectReport {
    pub fn build(project: &Project, checkpoints: &[Checkpoint], now: DateTime<Utc>) -> Self {
        let categories =
            metrics::category_distribution(checkpoints.iter().map(|c| c.category.as_deref()));

        Self {
            project_id: project.id,
            project_name: project.name.clone(),
            generated_at: now,
            total_checkpoints: checkpoints.len(),
            failed_checkpoints: checkpoints.iter().filter(|c| !c.passed).count(),
            categories,
            technicians: technician_stats(checkpoints),
            projection: TimeProjection::compute(project, checkpoints, now),
            delayed: metrics::is_delayed(project, now),
        }
    }
}

struct Accumulator {
    checkpoints: usize,
    failed: usize,
    first_scan: DateTime<Utc>,
    last_scan: DateTime<Utc>,
    days: BTreeSet<NaiveDate>,
}

fn technician_stats(checkpoints: &[Checkpoint]) -> Vec<TechnicianStats> {
    let mut by_name: BTreeMap<&str, Accumulator> = BTreeMap::new();

    for cp in checkpoints {
        let name = cp
            .technician
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(UNASSIGNED);
        let acc = by_name.entry(name).or_insert_with(|| Accumulator {
            checkpoints: 0,
            failed: 0,
            first_scan: cp.scanned_at,
            last_scan: cp.scanned_at,
            days: BTreeSet::new(),
        });
        acc.checkpoints += 1;
        if !cp.passed {
            acc.failed += 1;
        }
        acc.first_scan = acc.first_scan.min(cp.scanned_at);
        acc.last_scan = acc.last_scan.max(cp.scanned_at);
        acc.days.insert(cp.scanned_at.date_naive());
    }

    let mut stats: Vec<TechnicianStats> = by_name
        .into_iter()
        .map(|(name, acc)| TechnicianStats {
            name: name.to_string(),
            checkpoints: acc.checkpoints,
            failed: acc.failed,
            first_scan: acc.first_scan,
            last_scan: acc.last_scan,
            active_days: acc.days.len(),
        })
        .collect();
    // stable sort keeps name order among ties
    stats.sort_by(|a, b| b.checkpoints.cmp(&a.checkpoints));
    stats
}
