use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{NewTrainerProfile, TrainerProfile};

const TRAINER_SELECT: &str = r#"
    SELECT t.id, t.user_id, u.first_name, u.last_name, t.specialization,
           t.experience_years, t.hourly_rate, t.bio, t.is_available,
           t.created_at, t.updated_at
      FROM trainer_profiles t
      JOIN users u ON u.id = t.user_id
"#;

pub async fn list_available(db: &PgPool) -> anyhow::Result<Vec<TrainerProfile>> {
    let sql = format!("{} WHERE t.is_available ORDER BY u.last_name, u.first_name", TRAINER_SELECT);
    let rows = sqlx::query_as::<_, TrainerProfile>(&sql)
        .fetch_all(db)
        .await
        .context("list available trainers")?;
    Ok(rows)
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<TrainerProfile>> {
    let sql = format!("{} WHERE t.id = $1", TRAINER_SELECT);
    let row = sqlx::query_as::<_, TrainerProfile>(&sql)
        .bind(id)
        .fetch_optional(db)
        .await
        .context("find trainer by id")?;
    Ok(row)
}

pub async fn find_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Option<TrainerProfile>> {
    let sql = format!("{} WHERE t.user_id = $1", TRAINER_SELECT);
    let row = sqlx::query_as::<_, TrainerProfile>(&sql)
        .bind(user_id)
        .fetch_optional(db)
        .await
        .context("find trainer by user")?;
    Ok(row)
}

/// Administrative insert; the web app never writes trainer profiles.
pub async fn create(db: &PgPool, new: &NewTrainerProfile) -> anyhow::Result<Uuid> {
    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO trainer_profiles
            (user_id, specialization, experience_years, hourly_rate, bio, is_available)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id
        "#,
    )
    .bind(new.user_id)
    .bind(&new.specialization)
    .bind(new.experience_years)
    .bind(new.hourly_rate)
    .bind(&new.bio)
    .bind(new.is_available)
    .fetch_one(db)
    .await
    .context("create trainer profile")?;
    Ok(id)
}
