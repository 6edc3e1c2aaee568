use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use time::OffsetDateTime;
use tracing::{instrument, warn};

use super::{
    form::{self, FormChoices, FormValues},
    services::{record_health_metrics, recent_history, HealthMetricView},
};
use crate::{
    auth::{handlers::DASHBOARD_PATH, SessionUser},
    errors::{AppError, FieldErrors},
    flash::{self, Message},
    state::AppState,
};

#[derive(Debug, Serialize)]
pub struct HistoryPage {
    pub health_metrics: Vec<HealthMetricView>,
    pub messages: Vec<Message>,
}

/// Context of the add/update form.
#[derive(Debug, Serialize)]
pub struct HealthMetricsFormPage {
    pub values: FormValues,
    pub choices: FormChoices,
    pub errors: FieldErrors,
    pub max_upload_bytes: usize,
    pub messages: Vec<Message>,
}

pub fn metrics_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/health-metrics/", get(history))
        .route(
            "/add-health-metrics/",
            get(add_form).post(submit).layer(DefaultBodyLimit::max(
                // room for the text fields so an oversized image still reaches validation
                max_upload_bytes.saturating_mul(2).max(1024 * 1024),
            )),
        )
}

#[instrument(skip(state, jar))]
pub async fn history(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
    jar: CookieJar,
) -> Result<(CookieJar, Json<HistoryPage>), AppError> {
    let health_metrics = recent_history(&state, user_id).await?;
    let (jar, messages) = flash::take(jar);
    Ok((jar, Json(HistoryPage { health_metrics, messages })))
}

#[instrument(skip(state, jar))]
pub async fn add_form(
    State(state): State<AppState>,
    SessionUser(_user_id): SessionUser,
    jar: CookieJar,
) -> (CookieJar, Json<HealthMetricsFormPage>) {
    let today = OffsetDateTime::now_utc().to_offset(state.config.utc_offset).date();
    let (jar, messages) = flash::take(jar);
    (
        jar,
        Json(HealthMetricsFormPage {
            values: FormValues::initial(today),
            choices: FormChoices::default(),
            errors: FieldErrors::new(),
            max_upload_bytes: state.config.images.max_upload_bytes,
            messages,
        }),
    )
}

#[instrument(skip(state, jar, mp))]
pub async fn submit(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
    jar: CookieJar,
    mp: Multipart,
) -> Result<Response, AppError> {
    let raw = form::read_multipart(mp).await?;
    let input = match form::validate(raw, state.config.images.max_upload_bytes) {
        Ok(input) => input,
        Err((values, errors)) => {
            warn!(%user_id, %errors, "health metrics form rejected");
            let (jar, messages) = flash::take(jar);
            let page = HealthMetricsFormPage {
                values,
                choices: FormChoices::default(),
                errors,
                max_upload_bytes: state.config.images.max_upload_bytes,
                messages,
            };
            return Ok((StatusCode::BAD_REQUEST, jar, Json(page)).into_response());
        }
    };

    let date = input.date;
    let outcome = record_health_metrics(&state, user_id, input).await?;
    let text = if outcome.created {
        format!("Health metrics for {} added successfully!", date)
    } else {
        format!("Health metrics for {} updated successfully!", date)
    };
    let jar = flash::push(jar, Message::success(text));
    Ok((jar, Redirect::to(DASHBOARD_PATH)).into_response())
}
