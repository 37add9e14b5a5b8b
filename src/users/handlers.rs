use axum::{extract::State, routing::get, Router};
use tracing::instrument;

use super::dto::{UserListResponse, UserResponse};
use crate::{
    auth::{gate::AuthUser, policy::require_self},
    error::AppError,
    extract::{Json, Path},
    messages::{
        dto::{MessageListResponse, ReceivedMessage, SentMessage},
        views,
    },
    state::AppState,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/:username", get(get_user))
        .route("/users/:username/to", get(messages_to))
        .route("/users/:username/from", get(messages_from))
}

#[instrument(skip(state, _caller))]
pub async fn list_users(
    State(state): State<AppState>,
    _caller: AuthUser,
) -> Result<Json<UserListResponse>, AppError> {
    let users = state.users.list().await?;
    Ok(Json(UserListResponse { users }))
}

#[instrument(skip(state, caller))]
pub async fn get_user(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(username): Path<String>,
) -> Result<Json<UserResponse>, AppError> {
    require_self(&caller, &username)?;
    let user = state.users.get(&username).await?;
    Ok(Json(UserResponse { user }))
}

/// Messages received by `username`, each with the sender's summary.
#[instrument(skip(state, caller))]
pub async fn messages_to(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(username): Path<String>,
) -> Result<Json<MessageListResponse<ReceivedMessage>>, AppError> {
    require_self(&caller, &username)?;
    let messages = state.messages.list_to(&username).await?;
    let messages = views::received(state.users.as_ref(), messages).await?;
    Ok(Json(MessageListResponse { messages }))
}

/// Messages sent by `username`, each with the recipient's summary.
#[instrument(skip(state, caller))]
pub async fn messages_from(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(username): Path<String>,
) -> Result<Json<MessageListResponse<SentMessage>>, AppError> {
    require_self(&caller, &username)?;
    let messages = state.messages.list_from(&username).await?;
    let messages = views::sent(state.users.as_ref(), messages).await?;
    Ok(Json(MessageListResponse { messages }))
}
