use uuid::Uuid;

use crate::{
    flash::Message,
    metrics::services::{to_views, HealthMetricView, RECENT_IMAGES, RECENT_RECORDS},
    state::AppState,
};

pub const FOREIGN_ID_WARNING: &str = "You can only view your own data.";
pub const INVALID_USER_ERROR: &str = "Invalid user selected. Showing your own data.";

/// Whose data the dashboard shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Own,
    Other(Uuid),
    /// Fall back to the caller's own data and tell them why.
    OwnWithNotice(Message),
}

/// Applies the viewing rule: only privileged callers may pick another user.
pub fn select_target(caller: Uuid, privileged: bool, requested: Option<&str>) -> Target {
    let Some(raw) = requested.map(str::trim).filter(|s| !s.is_empty()) else {
        return Target::Own;
    };
    let parsed = raw.parse::<Uuid>().ok();
    if parsed == Some(caller) {
        return Target::Own;
    }
    if !privileged {
        return Target::OwnWithNotice(Message::warning(FOREIGN_ID_WARNING));
    }
    match parsed {
        Some(id) => Target::Other(id),
        None => Target::OwnWithNotice(Message::error(INVALID_USER_ERROR)),
    }
}

#[derive(Debug, Clone)]
pub struct DashboardRecords {
    pub health_metrics: Vec<HealthMetricView>,
    pub recent_images: Vec<HealthMetricView>,
}

/// Latest records and latest photo entries for `viewing_user`.
pub async fn dashboard_records(st: &AppState, viewing_user: Uuid) -> anyhow::Result<DashboardRecords> {
    let recent = st.metrics.recent_for_user(viewing_user, RECENT_RECORDS).await?;
    let with_images = st.metrics.recent_with_images(viewing_user, RECENT_IMAGES).await?;
    Ok(DashboardRecords {
        health_metrics: to_views(st, recent).await?,
        recent_images: to_views(st, with_images).await?,
    })
}
