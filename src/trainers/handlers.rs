use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::{repo, repo_types::TrainerProfile};
use crate::{
    errors::AppError,
    flash::{self, Message},
    state::AppState,
};

const NOT_FOUND: &str = "Trainer not found.";

#[derive(Debug, Serialize)]
pub struct TrainerListPage {
    pub trainers: Vec<TrainerProfile>,
    pub messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
pub struct TrainerPage {
    pub trainer: TrainerProfile,
    pub messages: Vec<Message>,
}

pub fn trainer_routes() -> Router<AppState> {
    Router::new()
        .route("/trainers/", get(list_trainers))
        .route("/trainer/:id/", get(show_trainer))
}

#[instrument(skip(state, jar))]
pub async fn list_trainers(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<TrainerListPage>), AppError> {
    let trainers = repo::list_available(&state.db).await?;
    let (jar, messages) = flash::take(jar);
    Ok((jar, Json(TrainerListPage { trainers, messages })))
}

#[instrument(skip(state, jar))]
pub async fn show_trainer(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(raw_id): Path<String>,
) -> Result<(CookieJar, Json<TrainerPage>), AppError> {
    let Ok(id) = raw_id.parse::<Uuid>() else {
        debug!(%raw_id, "malformed trainer id");
        return Err(AppError::NotFound(NOT_FOUND));
    };
    let trainer = repo::find_by_id(&state.db, id)
        .await?
        .ok_or(AppError::NotFound(NOT_FOUND))?;
    let (jar, messages) = flash::take(jar);
    Ok((jar, Json(TrainerPage { trainer, messages })))
}
