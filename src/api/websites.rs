use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, patch};
use axum::{Json, Router};
use serde::Deserialize;

use crate::api::require_any_field;
use crate::db::models::WebsiteRecord;
use crate::db::queries;
use crate::db::queries::UpdateWebsiteInput;
use crate::error::AppResult;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/websites", get(list_websites).post(create_website))
        .route(
            "/websites/{website_id}",
            patch(update_website).delete(delete_website),
        )
}

#[derive(Debug, Deserialize)]
struct CreateWebsiteRequest {
    name: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct UpdateWebsiteRequest {
    name: Option<String>,
    url: Option<String>,
    description: Option<String>,
}

async fn list_websites(State(state): State<AppState>) -> AppResult<Json<Vec<WebsiteRecord>>> {
    let websites = queries::list_websites(&state.db).await?;
    Ok(Json(websites))
}

async fn create_website(
    State(state): State<AppState>,
    Json(payload): Json<CreateWebsiteRequest>,
) -> AppResult<(StatusCode, Json<WebsiteRecord>)> {
    let website =
        queries::create_website(&state.db, &payload.name, payload.url, payload.description)
            .await?;
    Ok((StatusCode::CREATED, Json(website)))
}

async fn update_website(
    State(state): State<AppState>,
    Path(website_id): Path<String>,
    Json(payload): Json<UpdateWebsiteRequest>,
) -> AppResult<Json<WebsiteRecord>> {
    require_any_field(&[
        payload.name.is_some(),
        payload.url.is_some(),
        payload.description.is_some(),
    ])?;

    let website = queries::update_website(
        &state.db,
        &website_id,
        UpdateWebsiteInput {
            name: payload.name,
            url: payload.url,
            description: payload.description,
        },
    )
    .await?;

    Ok(Json(website))
}

async fn delete_website(
    State(state): State<AppState>,
    Path(website_id): Path<String>,
) -> AppResult<StatusCode> {
    queries::delete_website(&state.db, &website_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{json, Value};

    use crate::api::test_support::test_app;

    #[tokio::test]
    async fn website_names_are_unique_and_trimmed() {
        let app = test_app("api-websites").await;

        let created = app
            .server
            .post("/api/v1/websites")
            .json(&json!({ "name": "  Dribbble ", "url": "https://dribbble.com" }))
            .await;
        created.assert_status(StatusCode::CREATED);
        let website = created.json::<Value>();
        assert_eq!(website["name"], "Dribbble");

        let duplicate = app
            .server
            .post("/api/v1/websites")
            .json(&json!({ "name": "Dribbble" }))
            .await;
        duplicate.assert_status(StatusCode::CONFLICT);
        assert_eq!(duplicate.json::<Value>()["error"], "conflict");

        app.server
            .post("/api/v1/websites")
            .json(&json!({ "name": "   " }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        let website_id = website["id"].as_str().expect("website id");
        app.server
            .delete(&format!("/api/v1/websites/{website_id}"))
            .await
            .assert_status(StatusCode::NO_CONTENT);
    }
}
