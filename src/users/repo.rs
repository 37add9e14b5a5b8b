use anyhow::Context;
use axum::async_trait;
use sqlx::PgPool;

use super::dto::{NewUser, User, UserSummary};
use crate::{
    auth::password::{hash_password, verify_password},
    store::{StoreError, StoreResult},
};

/// Credential store. Password hashes go in through `register` and are only
/// ever compared inside `verify_credentials`.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn register(&self, user: NewUser) -> StoreResult<User>;
    async fn verify_credentials(&self, username: &str, password: &str) -> StoreResult<bool>;
    async fn touch_last_login(&self, username: &str) -> StoreResult<()>;
    async fn get(&self, username: &str) -> StoreResult<User>;
    /// All users ordered by username.
    async fn list(&self) -> StoreResult<Vec<UserSummary>>;
}

pub(crate) fn no_such_user(username: &str) -> StoreError {
    StoreError::NotFound(format!("no such user: {username}"))
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn register(&self, user: NewUser) -> StoreResult<User> {
        let hash = hash_password(&user.password)?;
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash, first_name, last_name, phone, join_at)
            VALUES ($1, $2, $3, $4, $5, now())
            RETURNING username, first_name, last_name, phone, join_at, last_login_at
            "#,
        )
        .bind(&user.username)
        .bind(&hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.phone)
        .fetch_one(&self.db)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Duplicate(format!("username already taken: {}", user.username))
            }
            other => StoreError::from(other),
        })?;
        Ok(created)
    }

    async fn verify_credentials(&self, username: &str, password: &str) -> StoreResult<bool> {
        let hash: Option<String> =
            sqlx::query_scalar(r#"SELECT password_hash FROM users WHERE username = $1"#)
                .bind(username)
                .fetch_optional(&self.db)
                .await
                .context("load password hash")?;
        Ok(hash.is_some_and(|h| verify_password(password, &h)))
    }

    async fn touch_last_login(&self, username: &str) -> StoreResult<()> {
        let result = sqlx::query(r#"UPDATE users SET last_login_at = now() WHERE username = $1"#)
            .bind(username)
            .execute(&self.db)
            .await
            .context("update last_login_at")?;
        if result.rows_affected() == 0 {
            return Err(no_such_user(username));
        }
        Ok(())
    }

    async fn get(&self, username: &str) -> StoreResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT username, first_name, last_name, phone, join_at, last_login_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await
        .context("get user")?
        .ok_or_else(|| no_such_user(username))
    }

    async fn list(&self) -> StoreResult<Vec<UserSummary>> {
        let rows = sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT username, first_name, last_name, phone
            FROM users
            ORDER BY username
            "#,
        )
        .fetch_all(&self.db)
        .await
        .context("list users")?;
        Ok(rows)
    }
}
