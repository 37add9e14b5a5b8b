use anyhow::Context;
use axum::async_trait;
use sqlx::PgPool;

use super::dto::{Message, NewMessage};
use crate::store::{StoreError, StoreResult};

#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn create(&self, msg: NewMessage) -> StoreResult<Message>;
    async fn get(&self, id: i64) -> StoreResult<Message>;
    async fn list_from(&self, username: &str) -> StoreResult<Vec<Message>>;
    async fn list_to(&self, username: &str) -> StoreResult<Vec<Message>>;
    /// Sets `read_at` if unset. A second call returns the message unchanged.
    async fn mark_read(&self, id: i64) -> StoreResult<Message>;
}

pub(crate) fn no_such_message(id: i64) -> StoreError {
    StoreError::NotFound(format!("no such message: {id}"))
}

#[derive(Clone)]
pub struct PgMessageStore {
    db: PgPool,
}

impl PgMessageStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn list_where(&self, column: &str, username: &str) -> StoreResult<Vec<Message>> {
        let sql = format!(
            "SELECT id, from_username, to_username, body, sent_at, read_at \
             FROM messages WHERE {column} = $1 ORDER BY sent_at, id"
        );
        let rows = sqlx::query_as::<_, Message>(&sql)
            .bind(username)
            .fetch_all(&self.db)
            .await
            .with_context(|| format!("list messages by {column}"))?;
        Ok(rows)
    }
}

#[async_trait]
impl MessageStore for PgMessageStore {
    async fn create(&self, msg: NewMessage) -> StoreResult<Message> {
        let row = sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (from_username, to_username, body, sent_at)
            VALUES ($1, $2, $3, now())
            RETURNING id, from_username, to_username, body, sent_at, read_at
            "#,
        )
        .bind(&msg.from_username)
        .bind(&msg.to_username)
        .bind(&msg.body)
        .fetch_one(&self.db)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                StoreError::NotFound(format!("no such user: {}", msg.to_username))
            }
            other => StoreError::from(other),
        })?;
        Ok(row)
    }

    async fn get(&self, id: i64) -> StoreResult<Message> {
        sqlx::query_as::<_, Message>(
            r#"
            SELECT id, from_username, to_username, body, sent_at, read_at
            FROM messages
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("get message")?
        .ok_or_else(|| no_such_message(id))
    }

    async fn list_from(&self, username: &str) -> StoreResult<Vec<Message>> {
        self.list_where("from_username", username).await
    }

    async fn list_to(&self, username: &str) -> StoreResult<Vec<Message>> {
        self.list_where("to_username", username).await
    }

    async fn mark_read(&self, id: i64) -> StoreResult<Message> {
        sqlx::query_as::<_, Message>(
            r#"
            UPDATE messages
            SET read_at = COALESCE(read_at, now())
            WHERE id = $1
            RETURNING id, from_username, to_username, body, sent_at, read_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("mark message read")?
        .ok_or_else(|| no_such_message(id))
    }
}
