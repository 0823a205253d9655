//! Reporting over tasks, projects and payments.
//!
//! Everything here is pure: callers fetch the records, pick a period and pass
//! the current local time in.

pub mod aggregate;
pub mod payments;
pub mod period;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::db::models::{PaymentRecord, ProjectRecord, TaskRecord};

pub use aggregate::{ChartSlice, StatusDistribution, Summary, Trend};
pub use payments::{payment_stats, PaymentPeriod, PaymentStats};
pub use period::{Period, ReportWindow};

#[derive(Debug, Clone, Serialize)]
pub struct TaskReport {
    pub period: Period,
    pub start: String,
    pub end: String,
    pub days: usize,
    pub summary: Summary,
    pub status: StatusDistribution,
    pub types: Vec<ChartSlice>,
    pub trend: Trend,
}

/// Raw collections a task report is computed from.
#[derive(Debug, Clone, Default)]
pub struct ReportInputs {
    pub tasks: Vec<TaskRecord>,
    pub active_projects: Vec<ProjectRecord>,
    pub archived_projects: Vec<ProjectRecord>,
    pub payments: Vec<PaymentRecord>,
}

pub fn build_task_report(inputs: ReportInputs, period: Period, now: NaiveDateTime) -> TaskReport {
    let window = ReportWindow::resolve(period, now);
    let projects = aggregate::merge_projects(inputs.active_projects, inputs.archived_projects);

    TaskReport {
        period,
        start: window.start.format("%Y-%m-%dT%H:%M:%S").to_string(),
        end: window.end.format("%Y-%m-%dT%H:%M:%S").to_string(),
        days: window.day_count(),
        summary: aggregate::summarize(&inputs.tasks, &projects, &window),
        status: aggregate::status_distribution(&inputs.tasks, &projects, &window),
        types: aggregate::type_distribution(&projects),
        trend: aggregate::trend(&projects, &inputs.payments, &window),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::aggregate::tests::{now, payment, project, task};

    #[test]
    fn report_merges_archived_projects_into_every_view() {
        let mut archived = project("p2", Some("Print"), Some("2026-10-13"), "paid");
        archived.archived = 1;

        let inputs = ReportInputs {
            tasks: vec![task("t1", "pending", "2026-10-14 10:00:00")],
            active_projects: vec![project("p1", Some("Web"), Some("2026-10-12"), "unpaid")],
            archived_projects: vec![archived],
            payments: vec![payment("pay1", 80.0, "2026-10-13")],
        };

        let report = build_task_report(inputs, Period::Week, now());

        assert_eq!(report.start, "2026-10-12T00:00:00");
        assert_eq!(report.end, "2026-10-18T23:59:59");
        assert_eq!(report.days, 7);
        assert_eq!(report.summary.completed_projects, 2);
        assert_eq!(report.summary.settled_projects, 1);
        assert_eq!(report.summary.settlement_rate, 50);
        assert_eq!(report.summary.active_days, 3);
        assert_eq!(report.status.pending, 1);
        assert_eq!(report.types.len(), 2);
        assert_eq!(report.trend.completed, vec![1, 1, 0, 0, 0, 0, 0]);
        assert_eq!(report.trend.settled, vec![0, 1, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn report_serializes_status_keys() {
        let report = build_task_report(ReportInputs::default(), Period::Month, now());
        let value = serde_json::to_value(&report).expect("report should serialize");

        assert_eq!(value["period"], "month");
        assert_eq!(value["status"]["in-progress"], 0);
        assert_eq!(value["status"]["slices"][0]["label"], "暂无数据");
        assert_eq!(value["trend"]["labels"].as_array().map(Vec::len), Some(31));
    }
}
