pub mod handlers;
pub mod repo;
pub mod repo_types;

use crate::state::AppState;
use axum::Router;

pub use repo_types::TrainerProfile;

pub fn router() -> Router<AppState> {
    handlers::trainer_routes()
}
