use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod extractors;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod services;
pub mod session;

pub use extractors::{MaybeSessionUser, SessionUser};
pub use repo_types::User;

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
