use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, patch};
use axum::{Json, Router};
use serde::Deserialize;

use crate::api::require_any_field;
use crate::db::models::AccountRecord;
use crate::db::queries;
use crate::db::queries::{NewAccountInput, UpdateAccountInput};
use crate::error::AppResult;
use crate::normalize::normalize_accounts;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/accounts", get(list_accounts).post(create_account))
        .route(
            "/accounts/{account_id}",
            patch(update_account).delete(delete_account),
        )
}

#[derive(Debug, Deserialize)]
struct AccountListQuery {
    tag: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreateAccountRequest {
    website_name: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    notes: String,
    #[serde(default)]
    tag: String,
    #[serde(default)]
    account: String,
    #[serde(default)]
    row: String,
}

#[derive(Debug, Deserialize)]
struct UpdateAccountRequest {
    website_name: Option<String>,
    url: Option<String>,
    username: Option<String>,
    password: Option<String>,
    notes: Option<String>,
    tag: Option<String>,
    account: Option<String>,
    row: Option<String>,
}

async fn list_accounts(
    State(state): State<AppState>,
    Query(query): Query<AccountListQuery>,
) -> AppResult<Json<Vec<AccountRecord>>> {
    let mut accounts = queries::list_accounts(&state.db, query.tag.as_deref()).await?;
    normalize_accounts(&mut accounts);
    Ok(Json(accounts))
}

async fn create_account(
    State(state): State<AppState>,
    Json(payload): Json<CreateAccountRequest>,
) -> AppResult<(StatusCode, Json<AccountRecord>)> {
    let account = queries::create_account(
        &state.db,
        NewAccountInput {
            website_name: payload.website_name,
            url: payload.url,
            username: payload.username,
            password: payload.password,
            notes: payload.notes,
            tag: payload.tag,
            account: payload.account,
            row: payload.row,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(account)))
}

async fn update_account(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
    Json(payload): Json<UpdateAccountRequest>,
) -> AppResult<Json<AccountRecord>> {
    require_any_field(&[
        payload.website_name.is_some(),
        payload.url.is_some(),
        payload.username.is_some(),
        payload.password.is_some(),
        payload.notes.is_some(),
        payload.tag.is_some(),
        payload.account.is_some(),
        payload.row.is_some(),
    ])?;

    let account = queries::update_account(
        &state.db,
        &account_id,
        UpdateAccountInput {
            website_name: payload.website_name,
            url: payload.url,
            username: payload.username,
            password: payload.password,
            notes: payload.notes,
            tag: payload.tag,
            account: payload.account,
            row: payload.row,
        },
    )
    .await?;

    Ok(Json(account))
}

async fn delete_account(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> AppResult<StatusCode> {
    queries::delete_account(&state.db, &account_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
