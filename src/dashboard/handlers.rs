use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use super::services::{dashboard_records, select_target, Target, INVALID_USER_ERROR};
use crate::{
    auth::{dto::PublicUser, SessionUser, User},
    errors::AppError,
    flash::{self, Message},
    metrics::services::HealthMetricView,
    state::AppState,
    trainers::{repo as trainer_repo, TrainerProfile},
};

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DashboardPage {
    pub is_admin: bool,
    pub viewing_user: PublicUser,
    pub selected_user: Option<PublicUser>,
    pub health_metrics: Vec<HealthMetricView>,
    pub recent_images: Vec<HealthMetricView>,
    pub all_users: Option<Vec<PublicUser>>,
    pub is_trainer: bool,
    pub trainer_profile: Option<TrainerProfile>,
    pub messages: Vec<Message>,
}

pub fn dashboard_routes() -> Router<AppState> {
    Router::new().route("/dashboard/", get(dashboard))
}

#[instrument(skip(state, jar))]
pub async fn dashboard(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
    jar: CookieJar,
    Query(q): Query<DashboardQuery>,
) -> Result<(CookieJar, Json<DashboardPage>), AppError> {
    let caller = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("session user {} no longer exists", user_id)))?;
    let is_admin = caller.is_privileged();
    let (jar, mut messages) = flash::take(jar);

    let mut selected_user = None;
    let viewing = match select_target(caller.id, is_admin, q.user_id.as_deref()) {
        Target::Own => caller.clone(),
        Target::OwnWithNotice(msg) => {
            warn!(caller = %caller.id, requested = ?q.user_id, "dashboard selection refused");
            messages.push(msg);
            caller.clone()
        }
        Target::Other(id) => match User::find_by_id(&state.db, id).await? {
            Some(other) => {
                selected_user = Some(PublicUser::from(&other));
                other
            }
            None => {
                warn!(caller = %caller.id, requested = %id, "dashboard selection unknown user");
                messages.push(Message::error(INVALID_USER_ERROR));
                caller.clone()
            }
        },
    };

    let records = dashboard_records(&state, viewing.id).await?;

    let all_users = if is_admin {
        Some(User::list_active(&state.db).await?.iter().map(PublicUser::from).collect())
    } else {
        None
    };

    let trainer_profile = trainer_repo::find_by_user(&state.db, caller.id).await?;

    Ok((
        jar,
        Json(DashboardPage {
            is_admin,
            viewing_user: PublicUser::from(&viewing),
            selected_user,
            health_metrics: records.health_metrics,
            recent_images: records.recent_images,
            all_users,
            is_trainer: trainer_profile.is_some(),
            trainer_profile,
            messages,
        }),
    ))
}
