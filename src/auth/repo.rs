use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::repo_types::{NewUser, User};

const USER_COLUMNS: &str = "id, username, first_name, last_name, email, password_hash, \
     is_staff, is_superuser, is_active, created_at";

impl User {
    pub async fn find_by_username(db: &PgPool, username: &str) -> anyhow::Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(db)
            .await
            .context("find user by username")?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(db)
            .await
            .context("find user by id")?;
        Ok(user)
    }

    /// Active accounts ordered by username, for the admin user picker.
    pub async fn list_active(db: &PgPool) -> anyhow::Result<Vec<User>> {
        let sql = format!(
            "SELECT {} FROM users WHERE is_active ORDER BY username",
            USER_COLUMNS
        );
        let users = sqlx::query_as::<_, User>(&sql)
            .fetch_all(db)
            .await
            .context("list active users")?;
        Ok(users)
    }

    /// Create a new user with an already hashed password.
    pub async fn create(db: &PgPool, new: &NewUser, password_hash: &str) -> anyhow::Result<User> {
        let sql = format!(
            r#"
            INSERT INTO users (username, first_name, last_name, email, password_hash, is_staff, is_superuser)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(&new.username)
            .bind(&new.first_name)
            .bind(&new.last_name)
            .bind(&new.email)
            .bind(password_hash)
            .bind(new.is_staff)
            .bind(new.is_superuser)
            .fetch_one(db)
            .await
            .with_context(|| format!("create user {}", new.username))?;
        Ok(user)
    }
}
