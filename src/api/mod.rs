pub mod accounts;
pub mod export;
pub mod payments;
pub mod projects;
pub mod reference;
pub mod reports;
pub mod settings;
pub mod tasks;
pub mod websites;

use axum::Json;
use axum::Router;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(tasks::router())
        .merge(projects::router())
        .merge(payments::router())
        .merge(accounts::router())
        .merge(websites::router())
        .merge(reference::router())
        .merge(settings::router())
        .merge(reports::router())
        .merge(export::router())
}

#[derive(Debug, Serialize)]
pub struct HealthzResponse {
    pub status: &'static str,
}

pub async fn healthz() -> Json<HealthzResponse> {
    Json(HealthzResponse { status: "ok" })
}

pub(crate) fn require_any_field(fields: &[bool]) -> AppResult<()> {
    if fields.iter().any(|present| *present) {
        return Ok(());
    }

    Err(AppError::BadRequest(
        "at least one field must be provided".to_string(),
    ))
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::routing::get;
    use axum::Router;
    use axum_test::TestServer;
    use tempfile::TempDir;

    use crate::config::test_config;
    use crate::db;
    use crate::state::AppState;

    pub(crate) struct TestApp {
        pub server: TestServer,
        pub state: AppState,
        _temp_dir: TempDir,
    }

    pub(crate) async fn test_app(db_name: &str) -> TestApp {
        let temp_dir = tempfile::tempdir().expect("tempdir should be created");
        let config = test_config(temp_dir.path(), db_name);
        let pool = db::connect_and_migrate(&config)
            .await
            .expect("database should initialize");
        let state = AppState::new(config, pool);

        let app = Router::new()
            .nest("/api/v1", super::router())
            .route("/healthz", get(super::healthz))
            .with_state(state.clone());

        TestApp {
            server: TestServer::new(app).expect("test server should start"),
            state,
            _temp_dir: temp_dir,
        }
    }
}
