pub mod clock;
pub mod form;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod services;
pub mod sleep;

use crate::state::AppState;
use axum::Router;

pub use repo::{MetricsStore, PgMetricsStore};
pub use repo_types::{HealthMetricRecord, NewHealthMetric, UpsertOutcome};

pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    handlers::metrics_routes(max_upload_bytes)
}
