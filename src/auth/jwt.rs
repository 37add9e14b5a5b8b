use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, warn};

use super::claims::{Claims, Identity};
use crate::{config::AuthConfig, state::AppState};

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("invalid token")]
    InvalidToken,

    #[error("failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    #[error("token lifetime out of range")]
    TtlOutOfRange,
}

/// Issues and verifies stateless session tokens.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    ttl: Option<Duration>,
    validation: Validation,
}

impl FromRef<AppState> for TokenCodec {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}

impl TokenCodec {
    pub fn new(cfg: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(std::slice::from_ref(&cfg.issuer));
        // exp is checked whenever present but only demanded when we issue it
        let required: &[&str] = if cfg.ttl.is_some() {
            &["exp", "iss"]
        } else {
            &["iss"]
        };
        validation.set_required_spec_claims(required);
        validation.validate_exp = true;

        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            ttl: cfg.ttl,
            validation,
        }
    }

    pub fn issue(&self, username: &str) -> Result<String, TokenError> {
        let exp = match self.ttl {
            Some(ttl) => Some(expiry_after(ttl)?),
            None => None,
        };
        let claims = Claims {
            username: username.to_string(),
            iss: self.issuer.clone(),
            exp,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(TokenError::Signing)?;
        debug!(%username, expires = ?exp, "session token issued");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Identity, TokenError> {
        if token.is_empty() {
            return Err(TokenError::InvalidToken);
        }
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            warn!(error = %e, "session token rejected");
            TokenError::InvalidToken
        })?;
        debug!(username = %data.claims.username, "session token verified");
        Ok(data.claims.into())
    }
}

fn expiry_after(ttl: Duration) -> Result<usize, TokenError> {
    let secs = i64::try_from(ttl.as_secs()).map_err(|_| TokenError::TtlOutOfRange)?;
    let at = OffsetDateTime::now_utc()
        .checked_add(TimeDuration::seconds(secs))
        .ok_or(TokenError::TtlOutOfRange)?;
    usize::try_from(at.unix_timestamp()).map_err(|_| TokenError::TtlOutOfRange)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(secret: &str, issuer: &str, ttl: Option<Duration>) -> AuthConfig {
        AuthConfig {
            secret: secret.into(),
            issuer: issuer.into(),
            ttl,
            public_paths: vec![],
            fail_fast: false,
        }
    }

    fn codec() -> TokenCodec {
        TokenCodec::new(&cfg("dev-secret", "test-issuer", None))
    }

    #[test]
    fn issue_then_verify_yields_username() {
        let keys = codec();
        for name in ["alice", "bob", "carol.d-99"] {
            let token = keys.issue(name).expect("issue");
            let identity = keys.verify(&token).expect("verify");
            assert_eq!(identity.username, name);
        }
    }

    #[test]
    fn tokens_without_ttl_are_deterministic() {
        let keys = codec();
        assert_eq!(keys.issue("alice").unwrap(), keys.issue("alice").unwrap());
    }

    #[test]
    fn verify_rejects_garbage() {
        let keys = codec();
        for junk in ["", "not-a-token", "a.b.c", "Bearer x", "...."] {
            assert!(matches!(keys.verify(junk), Err(TokenError::InvalidToken)), "{junk}");
        }
    }

    #[test]
    fn verify_rejects_other_secret() {
        let other = TokenCodec::new(&cfg("other-secret", "test-issuer", None));
        let token = other.issue("alice").unwrap();
        assert!(matches!(codec().verify(&token), Err(TokenError::InvalidToken)));
    }

    #[test]
    fn verify_rejects_spliced_payload() {
        let keys = codec();
        let genuine = keys.issue("alice").unwrap();
        let forged = TokenCodec::new(&cfg("attacker", "test-issuer", None))
            .issue("mallory")
            .unwrap();
        let g: Vec<&str> = genuine.split('.').collect();
        let f: Vec<&str> = forged.split('.').collect();
        let spliced = format!("{}.{}.{}", g[0], f[1], g[2]);
        assert!(matches!(keys.verify(&spliced), Err(TokenError::InvalidToken)));
    }

    #[test]
    fn verify_rejects_wrong_issuer() {
        let other = TokenCodec::new(&cfg("dev-secret", "someone-else", None));
        let token = other.issue("alice").unwrap();
        assert!(codec().verify(&token).is_err());
    }

    #[test]
    fn ttl_adds_exp_and_expired_tokens_fail() {
        let keys = TokenCodec::new(&cfg("dev-secret", "test-issuer", Some(Duration::from_secs(600))));
        let token = keys.issue("alice").unwrap();
        assert_eq!(keys.verify(&token).unwrap().username, "alice");

        let past = (OffsetDateTime::now_utc().unix_timestamp() - 3600) as usize;
        let expired = encode(
            &Header::new(Algorithm::HS256),
            &Claims {
                username: "alice".into(),
                iss: "test-issuer".into(),
                exp: Some(past),
            },
            &EncodingKey::from_secret(b"dev-secret"),
        )
        .unwrap();
        assert!(keys.verify(&expired).is_err());
        // expiry is honoured even when the verifier has no TTL of its own
        assert!(codec().verify(&expired).is_err());
    }

    #[test]
    fn oversized_ttl_is_an_error_not_a_panic() {
        for ttl in [
            Duration::from_secs(1_000_000_000_000 * 60),
            Duration::from_secs(u64::MAX),
        ] {
            let keys = TokenCodec::new(&cfg("dev-secret", "test-issuer", Some(ttl)));
            assert!(matches!(keys.issue("alice"), Err(TokenError::TtlOutOfRange)));
        }
    }

    #[test]
    fn ttl_codec_requires_exp() {
        let no_exp = codec().issue("alice").unwrap();
        let keys = TokenCodec::new(&cfg("dev-secret", "test-issuer", Some(Duration::from_secs(600))));
        assert!(keys.verify(&no_exp).is_err());
    }
}
