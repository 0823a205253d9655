use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use serde::Serialize;

use crate::db::models::{PaymentRecord, ProjectRecord, TaskRecord};
use crate::report::period::{parse_record_date, ReportWindow};

pub const NO_DATA_LABEL: &str = "暂无数据";
pub const UNCATEGORIZED_LABEL: &str = "未分类";

const PENDING_LABEL: &str = "待办";
const IN_PROGRESS_LABEL: &str = "进行中";
const COMPLETED_LABEL: &str = "已完成";
const SETTLED_LABEL: &str = "已结算";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartSlice {
    pub label: String,
    pub value: usize,
}

impl ChartSlice {
    fn new(label: &str, value: usize) -> Self {
        Self {
            label: label.to_string(),
            value,
        }
    }

    fn no_data() -> Self {
        Self::new(NO_DATA_LABEL, 1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub completed_projects: usize,
    pub settled_projects: usize,
    pub settlement_rate: u32,
    pub active_days: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusDistribution {
    pub pending: usize,
    #[serde(rename = "in-progress")]
    pub in_progress: usize,
    pub completed: usize,
    pub settled: usize,
    pub slices: Vec<ChartSlice>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Trend {
    pub labels: Vec<String>,
    pub completed: Vec<usize>,
    pub settled: Vec<usize>,
    pub created: Vec<usize>,
}

/// Active projects first, then archived projects not already present.
pub fn merge_projects(
    active: Vec<ProjectRecord>,
    archived: Vec<ProjectRecord>,
) -> Vec<ProjectRecord> {
    let mut seen = active
        .iter()
        .map(|project| project.id.clone())
        .collect::<HashSet<_>>();

    let mut merged = active;
    for project in archived {
        if seen.insert(project.id.clone()) {
            merged.push(project);
        }
    }

    merged
}

/// Active tasks created inside the window.
pub fn tasks_in_window<'a>(tasks: &'a [TaskRecord], window: &ReportWindow) -> Vec<&'a TaskRecord> {
    tasks
        .iter()
        .filter(|task| task.is_active())
        .filter(|task| {
            parse_record_date(&task.created_at).is_some_and(|created| window.contains(created))
        })
        .collect()
}

/// Projects completed inside the window.
pub fn projects_in_window<'a>(
    projects: &'a [ProjectRecord],
    window: &ReportWindow,
) -> Vec<&'a ProjectRecord> {
    projects
        .iter()
        .filter(|project| {
            project
                .completion_date
                .as_deref()
                .and_then(parse_record_date)
                .is_some_and(|completed| window.contains(completed))
        })
        .collect()
}

pub fn summarize(
    tasks: &[TaskRecord],
    projects: &[ProjectRecord],
    window: &ReportWindow,
) -> Summary {
    let completed_projects = projects.len();
    let settled_projects = projects.iter().filter(|project| project.is_paid()).count();

    let settlement_rate = if completed_projects == 0 {
        0
    } else {
        ((settled_projects as f64 / completed_projects as f64) * 100.0).round() as u32
    };

    let mut active_days: HashSet<NaiveDate> = HashSet::new();
    for task in tasks_in_window(tasks, window) {
        if let Some(created) = parse_record_date(&task.created_at) {
            active_days.insert(created.date());
        }
    }
    for project in projects_in_window(projects, window) {
        if let Some(completed) = project.completion_date.as_deref().and_then(parse_record_date) {
            active_days.insert(completed.date());
        }
    }

    Summary {
        completed_projects,
        settled_projects,
        settlement_rate,
        active_days: active_days.len(),
    }
}

pub fn status_distribution(
    tasks: &[TaskRecord],
    projects: &[ProjectRecord],
    window: &ReportWindow,
) -> StatusDistribution {
    let filtered = tasks_in_window(tasks, window);

    let pending = filtered
        .iter()
        .filter(|task| task.status == "pending")
        .count();
    let in_progress = filtered
        .iter()
        .filter(|task| task.status == "in-progress")
        .count();
    let completed = projects.len();
    let settled = projects.iter().filter(|project| project.is_paid()).count();

    let slices = if filtered.is_empty() && projects.is_empty() {
        vec![ChartSlice::no_data()]
    } else {
        vec![
            ChartSlice::new(PENDING_LABEL, pending),
            ChartSlice::new(IN_PROGRESS_LABEL, in_progress),
            ChartSlice::new(COMPLETED_LABEL, completed),
            ChartSlice::new(SETTLED_LABEL, settled),
        ]
    };

    StatusDistribution {
        pending,
        in_progress,
        completed,
        settled,
        slices,
    }
}

/// Project counts per type, largest first; ties ordered by label.
pub fn type_distribution(projects: &[ProjectRecord]) -> Vec<ChartSlice> {
    if projects.is_empty() {
        return vec![ChartSlice::no_data()];
    }

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for project in projects {
        let label = project
            .project_type
            .as_deref()
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .unwrap_or(UNCATEGORIZED_LABEL);
        *counts.entry(label).or_default() += 1;
    }

    let mut slices = counts
        .into_iter()
        .map(|(label, value)| ChartSlice::new(label, value))
        .collect::<Vec<_>>();
    slices.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.label.cmp(&b.label)));
    slices
}

pub fn trend(
    projects: &[ProjectRecord],
    payments: &[PaymentRecord],
    window: &ReportWindow,
) -> Trend {
    let buckets = window.labels.len();
    let mut completed = vec![0; buckets];
    let mut settled = vec![0; buckets];

    for project in projects {
        let index = project
            .completion_date
            .as_deref()
            .and_then(parse_record_date)
            .and_then(|completed_at| window.bucket_index(completed_at));
        if let Some(index) = index {
            completed[index] += 1;
        }
    }

    for payment in payments {
        if let Some(index) =
            parse_record_date(&payment.date).and_then(|paid_at| window.bucket_index(paid_at))
        {
            settled[index] += 1;
        }
    }

    Trend {
        labels: window.labels.clone(),
        created: completed.clone(),
        completed,
        settled,
    }
}
