use axum::{
    extract::{FromRef, State},
    routing::post,
    Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, RegisterRequest, TokenResponse},
        jwt::TokenCodec,
    },
    error::AppError,
    extract::Json,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

/// POST /auth/register: creates the user, logs them in and returns a token.
#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let payload_name = payload.username.clone();
    let new_user = payload.validate().map_err(|e| {
        warn!(error = %e, username = %payload_name, "rejected registration");
        e
    })?;

    let user = state.users.register(new_user).await?;
    let token = TokenCodec::from_ref(&state)
        .issue(&user.username)
        .map_err(anyhow::Error::from)?;
    state.users.touch_last_login(&user.username).await?;

    info!(username = %user.username, "user registered");
    Ok(Json(TokenResponse { token }))
}

/// POST /auth/login
#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let username = payload.username.trim();
    if !state
        .users
        .verify_credentials(username, &payload.password)
        .await?
    {
        warn!(%username, "login with invalid credentials");
        return Err(AppError::InvalidInput("invalid username/password".into()));
    }

    let token = TokenCodec::from_ref(&state)
        .issue(username)
        .map_err(anyhow::Error::from)?;
    state.users.touch_last_login(username).await?;

    info!(%username, "user logged in");
    Ok(Json(TokenResponse { token }))
}
