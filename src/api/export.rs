use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Local;
use serde::Deserialize;
use tracing::info;

use crate::db::queries;
use crate::error::{AppError, AppResult};
use crate::export::{
    accounts_table, export_file_name, payments_table, projects_table, write_export, ExportFormat,
    ExportKind, ExportedFile,
};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/export", post(export_data))
}

#[derive(Debug, Deserialize)]
struct ExportRequest {
    #[serde(rename = "type")]
    kind: String,
    format: Option<String>,
}

async fn export_data(
    State(state): State<AppState>,
    Json(payload): Json<ExportRequest>,
) -> AppResult<Json<ExportedFile>> {
    let kind = ExportKind::parse(&payload.kind)
        .ok_or_else(|| AppError::BadRequest(format!("invalid export type '{}'", payload.kind)))?;
    let format_token = payload.format.unwrap_or_else(|| "excel".to_string());
    let format = ExportFormat::parse(&format_token)
        .ok_or_else(|| AppError::BadRequest(format!("invalid export format '{format_token}'")))?;

    let table = match kind {
        ExportKind::Accounts => accounts_table(&queries::list_accounts(&state.db, None).await?),
        ExportKind::Projects => projects_table(&queries::list_all_projects(&state.db).await?),
        ExportKind::Payments => {
            payments_table(&queries::list_payment_export_rows(&state.db).await?)
        }
    };

    let row_count = table.rows.len();
    let data_dir = state.config.data_dir.clone();
    let file_name = export_file_name(kind, format, Local::now().naive_local());

    let exported = tokio::task::spawn_blocking(move || {
        write_export(&table, format, &data_dir, &file_name)
    })
    .await??;

    info!(
        kind = kind.as_str(),
        rows = row_count,
        file_path = %exported.file_path,
        "data exported"
    );

    Ok(Json(exported))
}
