use axum::{
    async_trait,
    body::Body,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use serde::Deserialize;
use tracing::{debug, warn};

use super::{claims::Identity, policy};
use crate::{error::AppError, state::AppState};

const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Resolves the caller's identity for every request.
///
/// Public paths pass straight through. Otherwise the first non-empty token
/// found in the `Authorization: Bearer` header or the JSON body (`_token`,
/// then `token`) is verified, and on success an [`Identity`] is stored in the
/// request extensions. A missing or bad token leaves the request anonymous;
/// routes that need a caller reject it through [`AuthUser`].
pub async fn authenticate(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if state.config.auth.is_public(req.uri().path()) {
        return Ok(next.run(req).await);
    }

    let (mut parts, body) = req.into_parts();
    let bytes = axum::body::to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|_| AppError::InvalidInput("request body too large".into()))?;

    let candidate = bearer_token(&parts.headers).or_else(|| body_token(&bytes));
    match candidate {
        Some(token) => match state.tokens.verify(&token) {
            Ok(identity) => {
                debug!(username = %identity.username, "request authenticated");
                parts.extensions.insert(identity);
            }
            Err(e) => {
                warn!(error = %e, path = %parts.uri.path(), "ignoring invalid session token");
                if state.config.auth.fail_fast {
                    return Err(AppError::Unauthorized);
                }
            }
        },
        None => debug!(path = %parts.uri.path(), "no session token presented"),
    }

    let req = Request::from_parts(parts, Body::from(bytes));
    Ok(next.run(req).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

#[derive(Deserialize)]
struct BodyToken {
    #[serde(rename = "_token")]
    underscored: Option<String>,
    token: Option<String>,
}

fn body_token(bytes: &[u8]) -> Option<String> {
    if bytes.is_empty() {
        return None;
    }
    let found: BodyToken = serde_json::from_slice(bytes).ok()?;
    [found.underscored, found.token]
        .into_iter()
        .flatten()
        .find(|t| !t.is_empty())
}

/// The authenticated caller; rejects with 401 when the gate attached none.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let identity = policy::require_authenticated(parts.extensions.get::<Identity>())?;
        Ok(AuthUser(identity.clone()))
    }
}
