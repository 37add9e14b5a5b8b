use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::users::dto::UserSummary;

#[derive(Debug, Clone, Serialize, FromRow, PartialEq, Eq)]
pub struct Message {
    pub id: i64,
    pub from_username: String,
    pub to_username: String,
    pub body: String,
    #[serde(with = "time::serde::rfc3339")]
    pub sent_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub read_at: Option<OffsetDateTime>,
}

/// `Unread -> Read` is the only transition; `Read` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStatus {
    Unread,
    Read,
}

impl Message {
    pub fn read_status(&self) -> ReadStatus {
        match self.read_at {
            Some(_) => ReadStatus::Read,
            None => ReadStatus::Unread,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub from_username: String,
    pub to_username: String,
    pub body: String,
}

/// Request body for sending. Any `from` field a client sends is ignored;
/// the sender is always the authenticated caller.
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub to_username: String,
    pub body: String,
}

/// A message as seen by either party, with both users' summaries.
#[derive(Debug, Serialize)]
pub struct MessageDetail {
    pub id: i64,
    pub from_user: UserSummary,
    pub to_user: UserSummary,
    pub body: String,
    #[serde(with = "time::serde::rfc3339")]
    pub sent_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub read_at: Option<OffsetDateTime>,
}

#[derive(Debug, Serialize)]
pub struct SentMessage {
    pub id: i64,
    pub to_user: UserSummary,
    pub body: String,
    #[serde(with = "time::serde::rfc3339")]
    pub sent_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub read_at: Option<OffsetDateTime>,
}

#[derive(Debug, Serialize)]
pub struct ReceivedMessage {
    pub id: i64,
    pub from_user: UserSummary,
    pub body: String,
    #[serde(with = "time::serde::rfc3339")]
    pub sent_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub read_at: Option<OffsetDateTime>,
}

#[derive(Debug, Serialize)]
pub struct MessageListResponse<T> {
    pub messages: Vec<T>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse<T> {
    pub message: T,
}
