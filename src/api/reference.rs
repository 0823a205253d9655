use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{Json, Router};
use serde::Deserialize;

use crate::db::models::ReferenceRecord;
use crate::db::queries;
use crate::db::queries::ReferenceList;
use crate::error::AppResult;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/clients", get(list_clients).post(create_client))
        .route("/clients/{id}", delete(delete_client))
        .route("/categories", get(list_categories).post(create_category))
        .route("/categories/{id}", delete(delete_category))
}

#[derive(Debug, Deserialize)]
struct CreateReferenceRequest {
    name: String,
}

async fn list_clients(State(state): State<AppState>) -> AppResult<Json<Vec<ReferenceRecord>>> {
    list(&state, ReferenceList::Clients).await
}

async fn create_client(
    State(state): State<AppState>,
    Json(payload): Json<CreateReferenceRequest>,
) -> AppResult<(StatusCode, Json<ReferenceRecord>)> {
    create(&state, ReferenceList::Clients, &payload.name).await
}

async fn delete_client(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    remove(&state, ReferenceList::Clients, &id).await
}

async fn list_categories(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<ReferenceRecord>>> {
    list(&state, ReferenceList::Categories).await
}

async fn create_category(
    State(state): State<AppState>,
    Json(payload): Json<CreateReferenceRequest>,
) -> AppResult<(StatusCode, Json<ReferenceRecord>)> {
    create(&state, ReferenceList::Categories, &payload.name).await
}

async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    remove(&state, ReferenceList::Categories, &id).await
}

async fn list(state: &AppState, list: ReferenceList) -> AppResult<Json<Vec<ReferenceRecord>>> {
    let records = queries::list_references(&state.db, list).await?;
    Ok(Json(records))
}

async fn create(
    state: &AppState,
    list: ReferenceList,
    name: &str,
) -> AppResult<(StatusCode, Json<ReferenceRecord>)> {
    let record = queries::create_reference(&state.db, list, name).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn remove(state: &AppState, list: ReferenceList, id: &str) -> AppResult<StatusCode> {
    queries::delete_reference(&state.db, list, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{json, Value};

    use crate::api::test_support::test_app;

    #[tokio::test]
    async fn clients_and_categories_are_separate_lists() {
        let app = test_app("api-reference").await;

        let client = app
            .server
            .post("/api/v1/clients")
            .json(&json!({ "name": "Acme" }))
            .await;
        client.assert_status(StatusCode::CREATED);

        app.server
            .post("/api/v1/categories")
            .json(&json!({ "name": "Acme" }))
            .await
            .assert_status(StatusCode::CREATED);

        app.server
            .post("/api/v1/clients")
            .json(&json!({ "name": "Acme" }))
            .await
            .assert_status(StatusCode::CONFLICT);

        let client_id = client.json::<Value>()["id"]
            .as_str()
            .expect("client id")
            .to_string();
        app.server
            .delete(&format!("/api/v1/clients/{client_id}"))
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let clients = app.server.get("/api/v1/clients").await.json::<Value>();
        assert_eq!(clients.as_array().map(Vec::len), Some(0));
        let categories = app.server.get("/api/v1/categories").await.json::<Value>();
        assert_eq!(categories[0]["name"], "Acme");
    }
}
