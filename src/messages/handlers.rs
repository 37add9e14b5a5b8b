use axum::{
    extract::State,
    routing::{get, post},
    Router,
};
use tracing::{debug, info, instrument};

use super::{
    dto::{
        Message, MessageDetail, MessageListResponse, MessageResponse, NewMessage,
        ReadStatus, SendMessageRequest,
    },
    views,
};
use crate::{
    auth::{
        gate::AuthUser,
        policy::{require_message_party, require_message_recipient},
    },
    error::AppError,
    extract::{Json, Path},
    state::AppState,
};

pub fn message_routes() -> Router<AppState> {
    Router::new()
        .route("/messages", get(list_messages).post(send_message))
        .route("/messages/:id", get(get_message))
        .route("/messages/:id/read", post(mark_read))
}

/// Everything the caller sent or received.
#[instrument(skip(state, caller))]
pub async fn list_messages(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> Result<Json<MessageListResponse<Message>>, AppError> {
    let mut messages = state.messages.list_from(&caller.username).await?;
    // self-addressed messages already came back in list_from
    messages.extend(
        state
            .messages
            .list_to(&caller.username)
            .await?
            .into_iter()
            .filter(|m| m.from_username != caller.username),
    );
    messages.sort_by_key(|m| m.id);
    Ok(Json(MessageListResponse { messages }))
}

#[instrument(skip(state, caller))]
pub async fn get_message(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse<MessageDetail>>, AppError> {
    let message = state.messages.get(id).await?;
    require_message_party(&caller, &message)?;
    let message = views::detail(state.users.as_ref(), message).await?;
    Ok(Json(MessageResponse { message }))
}

#[instrument(skip(state, caller, payload))]
pub async fn send_message(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Json(payload): Json<SendMessageRequest>,
) -> Result<Json<MessageResponse<Message>>, AppError> {
    let body = payload.body.trim();
    if body.is_empty() {
        return Err(AppError::InvalidInput("message body is required".into()));
    }
    // memory store has no foreign keys, so check the recipient here
    state.users.get(&payload.to_username).await?;

    let message = state
        .messages
        .create(NewMessage {
            from_username: caller.username,
            to_username: payload.to_username,
            body: body.to_string(),
        })
        .await?;
    info!(id = message.id, from = %message.from_username, to = %message.to_username, "message sent");
    Ok(Json(MessageResponse { message }))
}

#[instrument(skip(state, caller))]
pub async fn mark_read(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse<Message>>, AppError> {
    let message = state.messages.get(id).await?;
    require_message_recipient(&caller, &message)?;
    if message.read_status() == ReadStatus::Read {
        debug!(id, "message already read");
        return Ok(Json(MessageResponse { message }));
    }
    let message = state.messages.mark_read(id).await?;
    info!(id, read_at = ?message.read_at, "message read");
    Ok(Json(MessageResponse { message }))
}
