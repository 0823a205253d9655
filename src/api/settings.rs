use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use crate::api::require_any_field;
use crate::db::models::SettingsRecord;
use crate::db::queries;
use crate::db::queries::UpdateSettingsInput;
use crate::error::AppResult;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/settings", get(get_settings).patch(update_settings))
}

#[derive(Debug, Deserialize)]
struct UpdateSettingsRequest {
    theme: Option<String>,
    autostart: Option<bool>,
    minimize_to_tray: Option<bool>,
    username: Option<String>,
    #[serde(rename = "userAvatar", alias = "user_avatar")]
    user_avatar: Option<String>,
    window_width: Option<i64>,
    window_height: Option<i64>,
    min_width: Option<i64>,
    min_height: Option<i64>,
}

async fn get_settings(State(state): State<AppState>) -> AppResult<Json<SettingsRecord>> {
    let settings = queries::get_settings(&state.db).await?;
    Ok(Json(settings))
}

async fn update_settings(
    State(state): State<AppState>,
    Json(payload): Json<UpdateSettingsRequest>,
) -> AppResult<Json<SettingsRecord>> {
    require_any_field(&[
        payload.theme.is_some(),
        payload.autostart.is_some(),
        payload.minimize_to_tray.is_some(),
        payload.username.is_some(),
        payload.user_avatar.is_some(),
        payload.window_width.is_some(),
        payload.window_height.is_some(),
        payload.min_width.is_some(),
        payload.min_height.is_some(),
    ])?;

    let settings = queries::update_settings(
        &state.db,
        UpdateSettingsInput {
            theme: payload.theme,
            autostart: payload.autostart,
            minimize_to_tray: payload.minimize_to_tray,
            username: payload.username,
            user_avatar: payload.user_avatar,
            window_width: payload.window_width,
            window_height: payload.window_height,
            min_width: payload.min_width,
            min_height: payload.min_height,
        },
    )
    .await?;

    Ok(Json(settings))
}
