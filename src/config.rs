use std::fs;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::warn;

#[derive(Clone, Debug, Parser)]
#[command(name = "ppms")]
pub struct Config {
    #[arg(long, env = "PPMS_HOST", default_value = "127.0.0.1")]
    pub host: IpAddr,

    #[arg(long, env = "PPMS_PORT", default_value_t = 7410)]
    pub port: u16,

    #[arg(long, env = "PPMS_DB_URL", default_value = "sqlite://./ppms.db")]
    pub db_url: String,

    #[arg(long, env = "PPMS_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Root for exported spreadsheets.
    #[arg(long, env = "PPMS_DATA_DIR", default_value = "./data")]
    pub data_dir: PathBuf,

    #[arg(long, env = "PPMS_MAX_REQUEST_BODY_BYTES", default_value_t = 8 * 1024 * 1024)]
    pub max_request_body_bytes: usize,

    /// Origin of the webview front-end when it is not served by this process.
    #[arg(long, env = "PPMS_CORS_ORIGIN")]
    pub cors_origin: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        let config = <Self as Parser>::parse();
        config.validate();
        config
    }

    pub fn ensure_data_dir(&self) -> std::io::Result<()> {
        ensure_directory(&self.data_dir)
    }

    pub fn log_startup_warnings(&self) {
        if !self.host.is_loopback() {
            warn!(
                host = %self.host,
                "PPMS_HOST is not a loopback address, the api is reachable from the network"
            );
        }

        if self
            .cors_origin
            .as_deref()
            .is_some_and(|origin| origin.trim() == "*")
        {
            warn!("PPMS_CORS_ORIGIN is '*', any web page can call the local api");
        }
    }

    fn validate(&self) {
        assert_non_zero_usize(
            "PPMS_MAX_REQUEST_BODY_BYTES",
            self.max_request_body_bytes,
        );
        assert!(
            !self.db_url.trim().is_empty(),
            "PPMS_DB_URL must not be empty"
        );
    }
}

fn ensure_directory(path: &Path) -> std::io::Result<()> {
    fs::create_dir_all(path)
}

fn assert_non_zero_usize(key: &'static str, value: usize) {
    assert!(value > 0, "{key} must be greater than 0");
}

#[cfg(test)]
pub(crate) fn test_config(root: &Path, db_name: &str) -> Config {
    let db_path = root.join(format!("{db_name}.db"));
    Config {
        host: IpAddr::from([127, 0, 0, 1]),
        port: 7410,
        db_url: format!("sqlite://{}?mode=rwc", db_path.display()),
        log_level: "info".to_string(),
        data_dir: root.join("data"),
        max_request_body_bytes: 8 * 1024 * 1024,
        cors_origin: None,
    }
}
