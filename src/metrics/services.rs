use rust_decimal::Decimal;
use serde::Serialize;
use time::{Date, OffsetDateTime};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    form::HealthMetricsInput,
    repo_types::{HealthMetricRecord, NewHealthMetric, UpsertOutcome},
    sleep::{self, SleepWindow},
};
use crate::{
    errors::AppError,
    images::{self, services::store_image, NormalizeOptions},
    state::AppState,
};

pub const RECENT_RECORDS: i64 = 10;
pub const RECENT_IMAGES: i64 = 5;

/// Record as shown to users, with the derived sleep figures.
#[derive(Debug, Clone, Serialize)]
pub struct HealthMetricView {
    pub id: Uuid,
    pub recorded_date: Date,
    pub weight: Decimal,
    pub thigh_length: Decimal,
    pub hip_length: Decimal,
    #[serde(with = "time::serde::rfc3339")]
    pub sleeping_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub wakeup_at: OffsetDateTime,
    pub sleep_duration_hours: Option<f64>,
    pub sleep_duration: String,
    pub has_image: bool,
    pub image_url: Option<String>,
}

/// Validated form in, stored row out. The image (if any) is normalized and
/// uploaded before the row is written; a failed write removes the upload.
#[instrument(skip(st, input), fields(date = %input.date))]
pub async fn record_health_metrics(
    st: &AppState,
    user_id: Uuid,
    input: HealthMetricsInput,
) -> Result<UpsertOutcome, AppError> {
    let sleep_time = input
        .sleep
        .to_time()
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;
    let wake_time = input
        .wakeup
        .to_time()
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;
    let window = SleepWindow::on_date(input.date, sleep_time, wake_time, st.config.utc_offset);

    let image_key = match input.image {
        Some(upload) => {
            let opts = NormalizeOptions {
                quality: st.config.images.quality,
                max_width: st.config.images.max_width,
                max_height: st.config.images.max_height,
            };
            let img = images::services::normalize_upload(upload, opts)
                .await?
                .map_err(|e| {
                    warn!(%user_id, error = %e, "rejecting unreadable image");
                    AppError::InvalidImage(e.to_string())
                })?;
            Some(store_image(st.storage.as_ref(), user_id, input.date, img).await?)
        }
        None => None,
    };

    let new = NewHealthMetric {
        user_id,
        recorded_date: input.date,
        weight: input.weight,
        thigh_length: input.thigh_length,
        hip_length: input.hip_length,
        sleeping_at: window.sleeping_at,
        wakeup_at: window.wakeup_at,
        image_key: image_key.clone(),
    };

    let outcome = match st.metrics.upsert(new).await {
        Ok(o) => o,
        Err(e) => {
            if let Some(key) = image_key {
                if let Err(del) = st.storage.delete_object(&key).await {
                    warn!(error = %del, %key, "orphaned upload left behind");
                }
            }
            return Err(AppError::Internal(e));
        }
    };

    info!(
        %user_id,
        record_id = %outcome.record.id,
        created = outcome.created,
        sleep = %sleep::format_duration(window.duration()),
        "health metrics saved"
    );
    Ok(outcome)
}

pub async fn to_view(st: &AppState, r: HealthMetricRecord) -> anyhow::Result<HealthMetricView> {
    let duration = r.sleep_duration();
    let has_image = r.has_image();
    let image_url = match r.image_key.as_deref() {
        Some(key) if has_image => Some(st.storage.public_url(key).await?),
        _ => None,
    };
    Ok(HealthMetricView {
        id: r.id,
        recorded_date: r.recorded_date,
        weight: r.weight,
        thigh_length: r.thigh_length,
        hip_length: r.hip_length,
        sleeping_at: r.sleeping_at,
        wakeup_at: r.wakeup_at,
        sleep_duration_hours: duration.map(sleep::duration_hours),
        sleep_duration: sleep::format_optional(duration),
        has_image,
        image_url,
    })
}

pub async fn to_views(
    st: &AppState,
    records: Vec<HealthMetricRecord>,
) -> anyhow::Result<Vec<HealthMetricView>> {
    let mut out = Vec::with_capacity(records.len());
    for r in records {
        out.push(to_view(st, r).await?);
    }
    Ok(out)
}

/// The caller's latest records for the history page.
pub async fn recent_history(st: &AppState, user_id: Uuid) -> anyhow::Result<Vec<HealthMetricView>> {
    let rows = st.metrics.recent_for_user(user_id, RECENT_RECORDS).await?;
    to_views(st, rows).await
}
