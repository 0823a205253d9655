use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use crate::api::require_any_field;
use crate::db::models::ProjectRecord;
use crate::db::queries;
use crate::db::queries::{NewProjectInput, UpdateProjectInput};
use crate::error::AppResult;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/projects", get(list_projects).post(create_project))
        .route(
            "/projects/{project_id}",
            get(get_project)
                .patch(update_project)
                .delete(delete_project),
        )
}

#[derive(Debug, Deserialize)]
struct ProjectListQuery {
    #[serde(default)]
    archived: bool,
}

#[derive(Debug, Deserialize)]
struct CreateProjectRequest {
    name: String,
    #[serde(rename = "type")]
    project_type: Option<String>,
    quantity: Option<i64>,
    completion_date: Option<String>,
    payment_status: Option<String>,
    notes: Option<String>,
    task_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpdateProjectRequest {
    name: Option<String>,
    #[serde(rename = "type")]
    project_type: Option<String>,
    quantity: Option<i64>,
    completion_date: Option<String>,
    payment_status: Option<String>,
    notes: Option<String>,
    archived: Option<bool>,
}

async fn list_projects(
    State(state): State<AppState>,
    Query(query): Query<ProjectListQuery>,
) -> AppResult<Json<Vec<ProjectRecord>>> {
    let projects = queries::list_projects(&state.db, query.archived).await?;
    Ok(Json(projects))
}

async fn create_project(
    State(state): State<AppState>,
    Json(payload): Json<CreateProjectRequest>,
) -> AppResult<(StatusCode, Json<ProjectRecord>)> {
    let project = queries::create_project(
        &state.db,
        NewProjectInput {
            name: payload.name,
            project_type: payload.project_type,
            quantity: payload.quantity,
            completion_date: payload.completion_date,
            payment_status: payload.payment_status,
            notes: payload.notes.unwrap_or_default(),
            task_id: payload.task_id,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(project)))
}

async fn get_project(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> AppResult<Json<ProjectRecord>> {
    let project = queries::get_project(&state.db, &project_id).await?;
    Ok(Json(project))
}

async fn update_project(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    Json(payload): Json<UpdateProjectRequest>,
) -> AppResult<Json<ProjectRecord>> {
    require_any_field(&[
        payload.name.is_some(),
        payload.project_type.is_some(),
        payload.quantity.is_some(),
        payload.completion_date.is_some(),
        payload.payment_status.is_some(),
        payload.notes.is_some(),
        payload.archived.is_some(),
    ])?;

    let project = queries::update_project(
        &state.db,
        &project_id,
        UpdateProjectInput {
            name: payload.name,
            project_type: payload.project_type,
            quantity: payload.quantity,
            completion_date: payload.completion_date,
            payment_status: payload.payment_status,
            notes: payload.notes,
            archived: payload.archived,
        },
    )
    .await?;

    Ok(Json(project))
}

async fn delete_project(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> AppResult<StatusCode> {
    queries::delete_project(&state.db, &project_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
