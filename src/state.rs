use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use sqlx::AnyPool;

use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: AnyPool,
    report_generation: Arc<AtomicU64>,
}

impl AppState {
    pub fn new(config: Config, db: AnyPool) -> Self {
        Self {
            config: Arc::new(config),
            db,
            report_generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Issues the next report refresh number. Later refreshes always get larger numbers.
    pub fn next_report_generation(&self) -> u64 {
        self.report_generation.fetch_add(1, Ordering::Relaxed) + 1
    }
}
