use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::api::require_any_field;
use crate::db::models::{ProjectRecord, TaskProgressRecord, TaskRecord};
use crate::db::queries;
use crate::db::queries::{NewTaskInput, TaskFilters, UpdateTaskInput};
use crate::error::AppResult;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/convert-completed", post(convert_completed_tasks))
        .route(
            "/tasks/{task_id}",
            get(get_task).patch(update_task).delete(delete_task),
        )
        .route(
            "/tasks/{task_id}/progress",
            get(list_progress).post(add_progress),
        )
}

#[derive(Debug, Deserialize)]
struct TaskListQuery {
    status: Option<String>,
    priority: Option<String>,
    #[serde(default)]
    include_deleted: bool,
}

#[derive(Debug, Deserialize)]
struct CreateTaskRequest {
    title: String,
    client: Option<String>,
    category: Option<String>,
    deadline: Option<String>,
    priority: Option<String>,
    notes: Option<String>,
    quantity: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct UpdateTaskRequest {
    title: Option<String>,
    client: Option<String>,
    category: Option<String>,
    deadline: Option<String>,
    priority: Option<String>,
    notes: Option<String>,
    quantity: Option<i64>,
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AddProgressRequest {
    progress_text: String,
}

#[derive(Debug, Serialize)]
struct TaskUpdateResponse {
    task: TaskRecord,
    converted_project: Option<ProjectRecord>,
}

#[derive(Debug, Serialize)]
struct ConversionResponse {
    created: usize,
    projects: Vec<ProjectRecord>,
}

async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<TaskListQuery>,
) -> AppResult<Json<Vec<TaskRecord>>> {
    let tasks = queries::list_tasks(
        &state.db,
        TaskFilters {
            status: query.status,
            priority: query.priority,
            include_deleted: query.include_deleted,
        },
    )
    .await?;

    Ok(Json(tasks))
}

async fn create_task(
    State(state): State<AppState>,
    Json(payload): Json<CreateTaskRequest>,
) -> AppResult<(StatusCode, Json<TaskRecord>)> {
    let task = queries::create_task(
        &state.db,
        NewTaskInput {
            title: payload.title,
            client: payload.client,
            category: payload.category,
            deadline: payload.deadline,
            priority: payload.priority.unwrap_or_else(|| "medium".to_string()),
            notes: payload.notes.unwrap_or_default(),
            quantity: payload.quantity.unwrap_or(1),
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(task)))
}

async fn get_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> AppResult<Json<TaskRecord>> {
    let task = queries::get_task(&state.db, &task_id).await?;
    Ok(Json(task))
}

async fn update_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    Json(payload): Json<UpdateTaskRequest>,
) -> AppResult<Json<TaskUpdateResponse>> {
    require_any_field(&[
        payload.title.is_some(),
        payload.client.is_some(),
        payload.category.is_some(),
        payload.deadline.is_some(),
        payload.priority.is_some(),
        payload.notes.is_some(),
        payload.quantity.is_some(),
        payload.status.is_some(),
    ])?;

    let update = queries::update_task(
        &state.db,
        &task_id,
        UpdateTaskInput {
            title: payload.title,
            client: payload.client,
            category: payload.category,
            deadline: payload.deadline,
            priority: payload.priority,
            notes: payload.notes,
            quantity: payload.quantity,
            status: payload.status,
        },
    )
    .await?;

    Ok(Json(TaskUpdateResponse {
        task: update.task,
        converted_project: update.converted_project,
    }))
}

async fn delete_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> AppResult<StatusCode> {
    queries::delete_task(&state.db, &task_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn convert_completed_tasks(
    State(state): State<AppState>,
) -> AppResult<Json<ConversionResponse>> {
    let projects = queries::convert_completed_tasks(&state.db).await?;

    Ok(Json(ConversionResponse {
        created: projects.len(),
        projects,
    }))
}

async fn list_progress(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> AppResult<Json<Vec<TaskProgressRecord>>> {
    let progress = queries::list_task_progress(&state.db, &task_id).await?;
    Ok(Json(progress))
}

async fn add_progress(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    Json(payload): Json<AddProgressRequest>,
) -> AppResult<(StatusCode, Json<TaskProgressRecord>)> {
    let progress = queries::add_task_progress(&state.db, &task_id, &payload.progress_text).await?;
    Ok((StatusCode::CREATED, Json(progress)))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{json, Value};

    use crate::api::test_support::test_app;

    #[tokio::test]
    async fn completing_a_task_over_http_records_one_project() {
        let app = test_app("api-tasks").await;

        let created = app
            .server
            .post("/api/v1/tasks")
            .json(&json!({ "title": "Design logo", "client": "Acme" }))
            .await;
        created.assert_status(StatusCode::CREATED);
        let task = created.json::<Value>();
        let task_id = task["id"].as_str().expect("task id").to_string();
        assert_eq!(task["status"], "pending");
        assert_eq!(task["is_deleted"], false);

        let completed = app
            .server
            .patch(&format!("/api/v1/tasks/{task_id}"))
            .json(&json!({ "status": "completed" }))
            .await;
        completed.assert_status_ok();
        let body = completed.json::<Value>();
        assert_eq!(body["task"]["status"], "completed");
        assert_eq!(body["converted_project"]["name"], "[Acme] Design logo");
        assert_eq!(body["converted_project"]["payment_status"], "unpaid");
        assert_eq!(body["converted_project"]["task_id"], task_id.as_str());

        let again = app
            .server
            .patch(&format!("/api/v1/tasks/{task_id}"))
            .json(&json!({ "status": "completed" }))
            .await;
        again.assert_status_ok();
        assert!(again.json::<Value>()["converted_project"].is_null());

        let bulk = app.server.post("/api/v1/tasks/convert-completed").await;
        bulk.assert_status_ok();
        assert_eq!(bulk.json::<Value>()["created"], 0);

        let projects = app.server.get("/api/v1/projects").await.json::<Value>();
        assert_eq!(projects.as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn empty_update_is_rejected() {
        let app = test_app("api-tasks-empty").await;

        let created = app
            .server
            .post("/api/v1/tasks")
            .json(&json!({ "title": "Icons" }))
            .await
            .json::<Value>();
        let task_id = created["id"].as_str().expect("task id");

        let response = app
            .server
            .patch(&format!("/api/v1/tasks/{task_id}"))
            .json(&json!({}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"], "bad_request");
    }

    #[tokio::test]
    async fn deleted_tasks_disappear_and_progress_requires_a_task() {
        let app = test_app("api-tasks-delete").await;

        let created = app
            .server
            .post("/api/v1/tasks")
            .json(&json!({ "title": "Scratch", "priority": "high" }))
            .await
            .json::<Value>();
        let task_id = created["id"].as_str().expect("task id").to_string();

        let progress = app
            .server
            .post(&format!("/api/v1/tasks/{task_id}/progress"))
            .json(&json!({ "progress_text": "drafted" }))
            .await;
        progress.assert_status(StatusCode::CREATED);

        let listed = app
            .server
            .get(&format!("/api/v1/tasks/{task_id}/progress"))
            .await
            .json::<Value>();
        assert_eq!(listed[0]["progress_text"], "drafted");

        app.server
            .delete(&format!("/api/v1/tasks/{task_id}"))
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let tasks = app.server.get("/api/v1/tasks").await.json::<Value>();
        assert_eq!(tasks.as_array().map(Vec::len), Some(0));

        app.server
            .get("/api/v1/tasks/missing/progress")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
