use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use time::{Date, Duration, OffsetDateTime};
use uuid::Uuid;

use super::sleep;

/// One day of measurements for one user.
#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
pub struct HealthMetricRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub recorded_date: Date,
    pub weight: Decimal,       // kg
    pub thigh_length: Decimal, // cm
    pub hip_length: Decimal,   // cm
    #[serde(with = "time::serde::rfc3339")]
    pub sleeping_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub wakeup_at: OffsetDateTime,
    pub image_key: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl HealthMetricRecord {
    pub fn sleep_duration(&self) -> Option<Duration> {
        sleep::sleep_duration(Some(self.sleeping_at), Some(self.wakeup_at))
    }

    pub fn has_image(&self) -> bool {
        self.image_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

/// Everything the upsert writes; the key is `(user_id, recorded_date)`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewHealthMetric {
    pub user_id: Uuid,
    pub recorded_date: Date,
    pub weight: Decimal,
    pub thigh_length: Decimal,
    pub hip_length: Decimal,
    pub sleeping_at: OffsetDateTime,
    pub wakeup_at: OffsetDateTime,
    pub image_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UpsertOutcome {
    pub record: HealthMetricRecord,
    pub created: bool,
}
