use anyhow::Context;
use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use time::Date;
use uuid::Uuid;

use super::repo_types::{HealthMetricRecord, NewHealthMetric, UpsertOutcome};

#[async_trait]
pub trait MetricsStore: Send + Sync {
    /// Inserts the row for `(user_id, recorded_date)` or overwrites every
    /// field of the existing one.
    async fn upsert(&self, new: NewHealthMetric) -> anyhow::Result<UpsertOutcome>;

    /// Newest first by recorded date.
    async fn recent_for_user(&self, user_id: Uuid, limit: i64)
        -> anyhow::Result<Vec<HealthMetricRecord>>;

    /// Newest first, only rows carrying a non-empty image reference.
    async fn recent_with_images(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> anyhow::Result<Vec<HealthMetricRecord>>;
}

const RECORD_COLUMNS: &str = "id, user_id, recorded_date, weight, thigh_length, hip_length, \
     sleeping_at, wakeup_at, image_key, created_at, updated_at";

#[derive(FromRow)]
struct UpsertRow {
    #[sqlx(flatten)]
    record: HealthMetricRecord,
    created: bool,
}

#[derive(Clone)]
pub struct PgMetricsStore {
    db: PgPool,
}

impl PgMetricsStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MetricsStore for PgMetricsStore {
    async fn upsert(&self, new: NewHealthMetric) -> anyhow::Result<UpsertOutcome> {
        // xmax is 0 only for a freshly inserted tuple
        let sql = format!(
            r#"
            INSERT INTO health_metrics
                (id, user_id, recorded_date, weight, thigh_length, hip_length,
                 sleeping_at, wakeup_at, image_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (user_id, recorded_date) DO UPDATE SET
                weight       = EXCLUDED.weight,
                thigh_length = EXCLUDED.thigh_length,
                hip_length   = EXCLUDED.hip_length,
                sleeping_at  = EXCLUDED.sleeping_at,
                wakeup_at    = EXCLUDED.wakeup_at,
                image_key    = EXCLUDED.image_key,
                updated_at   = now()
            RETURNING {}, (xmax = 0) AS created
            "#,
            RECORD_COLUMNS
        );
        let row = sqlx::query_as::<_, UpsertRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(new.user_id)
            .bind(new.recorded_date)
            .bind(new.weight)
            .bind(new.thigh_length)
            .bind(new.hip_length)
            .bind(new.sleeping_at)
            .bind(new.wakeup_at)
            .bind(new.image_key)
            .fetch_one(&self.db)
            .await
            .context("upsert health metric")?;
        Ok(UpsertOutcome {
            record: row.record,
            created: row.created,
        })
    }

    async fn recent_for_user(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> anyhow::Result<Vec<HealthMetricRecord>> {
        let sql = format!(
            r#"
            SELECT {}
              FROM health_metrics
             WHERE user_id = $1
             ORDER BY recorded_date DESC
             LIMIT $2
            "#,
            RECORD_COLUMNS
        );
        let rows = sqlx::query_as::<_, HealthMetricRecord>(&sql)
            .bind(user_id)
            .bind(limit)
            .fetch_all(&self.db)
            .await
            .context("list health metrics")?;
        Ok(rows)
    }

    async fn recent_with_images(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> anyhow::Result<Vec<HealthMetricRecord>> {
        let sql = format!(
            r#"
            SELECT {}
              FROM health_metrics
             WHERE user_id = $1
               AND image_key IS NOT NULL
               AND image_key <> ''
             ORDER BY recorded_date DESC
             LIMIT $2
            "#,
            RECORD_COLUMNS
        );
        let rows = sqlx::query_as::<_, HealthMetricRecord>(&sql)
            .bind(user_id)
            .bind(limit)
            .fetch_all(&self.db)
            .await
            .context("list health metrics with images")?;
        Ok(rows)
    }
}

/// Removes a user's records within `[from, to]`; returns the number deleted.
pub async fn delete_in_range(db: &PgPool, user_id: Uuid, from: Date, to: Date) -> anyhow::Result<u64> {
    let res = sqlx::query(
        r#"
        DELETE FROM health_metrics
         WHERE user_id = $1 AND recorded_date BETWEEN $2 AND $3
        "#,
    )
    .bind(user_id)
    .bind(from)
    .bind(to)
    .execute(db)
    .await
    .context("delete health metrics in range")?;
    Ok(res.rows_affected())
}

/// Record count and mean weight across all of a user's records.
pub async fn weight_summary(db: &PgPool, user_id: Uuid) -> anyhow::Result<(i64, Option<Decimal>)> {
    let row: (i64, Option<Decimal>) = sqlx::query_as(
        r#"
        SELECT COUNT(*), AVG(weight)
          FROM health_metrics
         WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_one(db)
    .await
    .context("health metric summary")?;
    Ok(row)
}

#[cfg(test)]
pub(crate) mod memory {
    use std::collections::HashMap;

    use time::OffsetDateTime;
    use tokio::sync::Mutex;

    use super::*;

    /// Keeps records in a map keyed like the table's unique constraint.
    #[derive(Default)]
    pub struct MemoryMetricsStore {
        rows: Mutex<HashMap<(Uuid, Date), HealthMetricRecord>>,
    }

    impl MemoryMetricsStore {
        pub async fn len(&self) -> usize {
            self.rows.lock().await.len()
        }

        fn sorted(mut rows: Vec<HealthMetricRecord>, limit: i64) -> Vec<HealthMetricRecord> {
            rows.sort_by(|a, b| b.recorded_date.cmp(&a.recorded_date));
            rows.truncate(limit.max(0) as usize);
            rows
        }
    }

    #[async_trait]
    impl MetricsStore for MemoryMetricsStore {
        async fn upsert(&self, new: NewHealthMetric) -> anyhow::Result<UpsertOutcome> {
            let now = OffsetDateTime::now_utc();
            let mut rows = self.rows.lock().await;
            let key = (new.user_id, new.recorded_date);
            let created = !rows.contains_key(&key);
            let (id, created_at) = rows
                .get(&key)
                .map(|r| (r.id, r.created_at))
                .unwrap_or_else(|| (Uuid::new_v4(), now));
            let record = HealthMetricRecord {
                id,
                user_id: new.user_id,
                recorded_date: new.recorded_date,
                weight: new.weight,
                thigh_length: new.thigh_length,
                hip_length: new.hip_length,
                sleeping_at: new.sleeping_at,
                wakeup_at: new.wakeup_at,
                image_key: new.image_key,
                created_at,
                updated_at: now,
            };
            rows.insert(key, record.clone());
            Ok(UpsertOutcome { record, created })
        }

        async fn recent_for_user(
            &self,
            user_id: Uuid,
            limit: i64,
        ) -> anyhow::Result<Vec<HealthMetricRecord>> {
            let rows = self.rows.lock().await;
            let mine = rows.values().filter(|r| r.user_id == user_id).cloned().collect();
            Ok(Self::sorted(mine, limit))
        }

        async fn recent_with_images(
            &self,
            user_id: Uuid,
            limit: i64,
        ) -> anyhow::Result<Vec<HealthMetricRecord>> {
            let rows = self.rows.lock().await;
            let mine = rows
                .values()
                .filter(|r| r.user_id == user_id && r.has_image())
                .cloned()
                .collect();
            Ok(Self::sorted(mine, limit))
        }
    }
}
