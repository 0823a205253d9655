use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::db::queries::TaskFilters;
use crate::error::AppResult;
use crate::report::{build_task_report, Period, ReportInputs, TaskReport};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/reports/tasks", get(task_report))
}

#[derive(Debug, Deserialize)]
struct ReportQuery {
    period: Option<String>,
}

#[derive(Debug, Serialize)]
struct TaskReportResponse {
    generation: u64,
    #[serde(flatten)]
    report: TaskReport,
}

/// Fetches every input concurrently and aggregates only once all of them arrived.
async fn task_report(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> AppResult<Json<TaskReportResponse>> {
    let generation = state.next_report_generation();
    let period = Period::parse(query.period.as_deref().unwrap_or_default());

    let (tasks, active_projects, archived_projects, payments) = tokio::try_join!(
        queries::list_tasks(
            &state.db,
            TaskFilters {
                include_deleted: true,
                ..Default::default()
            },
        ),
        queries::list_projects(&state.db, false),
        queries::list_projects(&state.db, true),
        queries::list_payments(&state.db, None),
    )?;

    let report = build_task_report(
        ReportInputs {
            tasks,
            active_projects,
            archived_projects,
            payments,
        },
        period,
        Local::now().naive_local(),
    );

    Ok(Json(TaskReportResponse { generation, report }))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use chrono::Local;
    use serde_json::{json, Value};

    use crate::api::test_support::test_app;

    #[tokio::test]
    async fn report_covers_active_and_archived_projects() {
        let app = test_app("api-reports").await;
        let today = Local::now().date_naive().format("%Y-%m-%d").to_string();

        let paid = app
            .server
            .post("/api/v1/projects")
            .json(&json!({ "name": "Logo", "type": "Design", "completion_date": today }))
            .await
            .json::<Value>();
        app.server
            .post("/api/v1/payments")
            .json(&json!({ "project_id": paid["id"], "amount": 500.0, "date": today }))
            .await
            .assert_status(StatusCode::CREATED);

        let archived = app
            .server
            .post("/api/v1/projects")
            .json(&json!({ "name": "Old flyer" }))
            .await
            .json::<Value>();
        let archived_id = archived["id"].as_str().expect("project id");
        app.server
            .patch(&format!("/api/v1/projects/{archived_id}"))
            .json(&json!({ "archived": true }))
            .await
            .assert_status_ok();

        let first = app
            .server
            .get("/api/v1/reports/tasks?period=week")
            .await
            .json::<Value>();
        assert_eq!(first["period"], "week");
        assert_eq!(first["summary"]["completed_projects"], 2);
        assert_eq!(first["summary"]["settled_projects"], 1);
        assert_eq!(first["summary"]["settlement_rate"], 50);
        assert_eq!(first["summary"]["active_days"], 1);
        assert_eq!(first["status"]["completed"], 2);
        assert_eq!(first["types"][0]["value"], 1);
        assert_eq!(first["trend"]["labels"].as_array().map(Vec::len), Some(7));
        let settled_total: u64 = first["trend"]["settled"]
            .as_array()
            .expect("settled series")
            .iter()
            .filter_map(Value::as_u64)
            .sum();
        assert_eq!(settled_total, 1);

        let second = app
            .server
            .get("/api/v1/reports/tasks?period=bogus")
            .await
            .json::<Value>();
        assert_eq!(second["period"], "week");
        assert!(second["generation"].as_u64() > first["generation"].as_u64());
    }

    #[tokio::test]
    async fn empty_database_reports_placeholders() {
        let app = test_app("api-reports-empty").await;

        let report = app
            .server
            .get("/api/v1/reports/tasks?period=year")
            .await
            .json::<Value>();
        assert_eq!(report["summary"]["settlement_rate"], 0);
        assert_eq!(report["status"]["slices"], json!([{ "label": "暂无数据", "value": 1 }]));
        assert_eq!(report["types"], json!([{ "label": "暂无数据", "value": 1 }]));
        assert_eq!(report["trend"]["completed"].as_array().map(Vec::len), Some(12));
    }
}
