pub mod models;
pub mod queries;

use std::str::FromStr;

use anyhow::Context;
use sqlx::any::{AnyConnectOptions, AnyPoolOptions};
use sqlx::{AnyPool, ConnectOptions, Executor};

use crate::config::Config;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./src/db/migrations");

/// SQLite settings that only hold per connection, applied to each new pool member.
const SQLITE_CONNECTION_PRAGMAS: [&str; 2] =
    ["PRAGMA foreign_keys = ON;", "PRAGMA busy_timeout = 5000;"];

pub async fn connect_and_migrate(config: &Config) -> anyhow::Result<AnyPool> {
    sqlx::any::install_default_drivers();

    let db_url = normalized_db_url(&config.db_url);
    let is_sqlite = db_url.starts_with("sqlite://");

    let connect_options = AnyConnectOptions::from_str(&db_url)
        .with_context(|| format!("invalid PPMS_DB_URL: {}", config.db_url))?
        .disable_statement_logging();

    let pool = AnyPoolOptions::new()
        .max_connections(8)
        .after_connect(move |connection, _meta| {
            Box::pin(async move {
                if is_sqlite {
                    for pragma in SQLITE_CONNECTION_PRAGMAS {
                        connection.execute(pragma).await?;
                    }
                }
                Ok(())
            })
        })
        .connect_with(connect_options)
        .await
        .context("failed to establish sqlx AnyPool")?;

    if is_sqlite {
        pool.execute("PRAGMA journal_mode = WAL;")
            .await
            .context("failed to set sqlite WAL mode")?;
    }

    MIGRATOR
        .run(&pool)
        .await
        .context("failed to run migrations")?;

    Ok(pool)
}

fn normalized_db_url(db_url: &str) -> String {
    if !db_url.starts_with("sqlite://") {
        return db_url.to_string();
    }

    let mut normalized = normalize_sqlite_db_url_path(db_url);
    if !normalized.contains('?') {
        normalized.push_str("?mode=rwc");
    }

    normalized
}

fn normalize_sqlite_db_url_path(db_url: &str) -> String {
    let Some(path_and_query) = db_url.strip_prefix("sqlite://") else {
        return db_url.to_string();
    };

    let (path, query) = match path_and_query.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (path_and_query, None),
    };

    let mut normalized_path = path.replace('\\', "/");
    if normalized_path.starts_with("//?/") {
        normalized_path = normalized_path.replacen("//?/", "/", 1);
    }

    let has_windows_drive_prefix = normalized_path.len() >= 2
        && normalized_path.as_bytes()[0].is_ascii_alphabetic()
        && normalized_path.as_bytes()[1] == b':';
    if has_windows_drive_prefix {
        normalized_path.insert(0, '/');
    }

    let mut normalized = format!("sqlite://{normalized_path}");
    if let Some(query) = query {
        normalized.push('?');
        normalized.push_str(query);
    }

    normalized
}

#[cfg(test)]
mod tests {
    use crate::db::normalized_db_url;
    use crate::db::queries::tests::setup_db;

    #[tokio::test]
    async fn every_pooled_connection_enforces_foreign_keys() {
        let (_temp_dir, pool) = setup_db("pragma-test").await;

        let mut held = Vec::new();
        for _ in 0..3 {
            held.push(pool.acquire().await.expect("connection should be acquired"));
        }
        drop(held);

        for _ in 0..3 {
            let result = sqlx::query(
                "INSERT INTO task_progress (id, task_id, progress_text, created_at) VALUES (?, ?, ?, ?)",
            )
            .bind(uuid::Uuid::new_v4().to_string())
            .bind("missing-task")
            .bind("orphan")
            .bind("2026-10-16T00:00:00Z")
            .execute(&pool)
            .await;
            assert!(result.is_err(), "orphan progress rows must be rejected");
        }
    }

    #[test]
    fn normalized_db_url_preserves_non_sqlite_urls() {
        assert_eq!(
            normalized_db_url("postgres://localhost/ppms"),
            "postgres://localhost/ppms"
        );
    }

    #[test]
    fn normalized_db_url_adds_mode_when_missing() {
        assert_eq!(
            normalized_db_url("sqlite://./ppms.db"),
            "sqlite://./ppms.db?mode=rwc"
        );
    }

    #[test]
    fn normalized_db_url_normalizes_windows_paths() {
        assert_eq!(
            normalized_db_url(r"sqlite://C:\Temp\ppms.db"),
            "sqlite:///C:/Temp/ppms.db?mode=rwc"
        );
        assert_eq!(
            normalized_db_url(r"sqlite://C:\Temp\ppms.db?mode=rwc"),
            "sqlite:///C:/Temp/ppms.db?mode=rwc"
        );
    }
}
