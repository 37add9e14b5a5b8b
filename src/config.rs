use std::time::Duration;

use anyhow::{bail, Context};

/// Longest accepted token lifetime: one year.
pub const MAX_TTL_MINUTES: u64 = 365 * 24 * 60;

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub issuer: String,
    /// `None` means issued tokens carry no `exp` claim.
    pub ttl: Option<Duration>,
    /// Exact paths, or prefixes ending in `*`, that skip token extraction.
    pub public_paths: Vec<String>,
    /// Reject a request carrying an invalid token instead of treating it as anonymous.
    pub fail_fast: bool,
}

impl AuthConfig {
    pub fn is_public(&self, path: &str) -> bool {
        self.public_paths.iter().any(|p| match p.strip_suffix('*') {
            Some(prefix) => path.starts_with(prefix),
            None => path == p,
        })
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub auth: AuthConfig,
}

pub const DEFAULT_PUBLIC_PATHS: &[&str] = &["/health", "/auth/login", "/auth/register"];

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").ok().filter(|v| !v.is_empty());
        let auth = AuthConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "messagely".into()),
            ttl: parse_ttl_minutes(std::env::var("JWT_TTL_MINUTES").ok().as_deref())?,
            public_paths: std::env::var("AUTH_PUBLIC_PATHS")
                .map(|v| parse_list(&v))
                .unwrap_or_else(|_| DEFAULT_PUBLIC_PATHS.iter().map(|s| s.to_string()).collect()),
            fail_fast: std::env::var("AUTH_FAIL_FAST")
                .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        };
        Ok(Self {
            database_url,
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: std::env::var("APP_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
            auth,
        })
    }
}

/// Unset, empty or `0` disables expiry.
fn parse_ttl_minutes(raw: Option<&str>) -> anyhow::Result<Option<Duration>> {
    let Some(raw) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    let minutes: u64 = raw
        .parse()
        .with_context(|| format!("JWT_TTL_MINUTES is not a whole number: {raw}"))?;
    if minutes == 0 {
        return Ok(None);
    }
    if minutes > MAX_TTL_MINUTES {
        bail!("JWT_TTL_MINUTES must be at most {MAX_TTL_MINUTES}, got {minutes}");
    }
    let secs = minutes
        .checked_mul(60)
        .context("JWT_TTL_MINUTES overflows")?;
    Ok(Some(Duration::from_secs(secs)))
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth(paths: &[&str]) -> AuthConfig {
        AuthConfig {
            secret: "s".into(),
            issuer: "i".into(),
            ttl: None,
            public_paths: paths.iter().map(|s| s.to_string()).collect(),
            fail_fast: false,
        }
    }

    #[test]
    fn exact_public_paths_match_only_themselves() {
        let cfg = auth(DEFAULT_PUBLIC_PATHS);
        assert!(cfg.is_public("/auth/login"));
        assert!(cfg.is_public("/auth/register"));
        assert!(!cfg.is_public("/auth/login/extra"));
        assert!(!cfg.is_public("/users"));
    }

    #[test]
    fn trailing_star_matches_prefix() {
        let cfg = auth(&["/auth/*"]);
        assert!(cfg.is_public("/auth/login"));
        assert!(cfg.is_public("/auth/anything"));
        assert!(!cfg.is_public("/users/auth"));
    }

    #[test]
    fn ttl_minutes_parse_and_bounds() {
        assert_eq!(parse_ttl_minutes(None).unwrap(), None);
        assert_eq!(parse_ttl_minutes(Some("")).unwrap(), None);
        assert_eq!(parse_ttl_minutes(Some("0")).unwrap(), None);
        assert_eq!(
            parse_ttl_minutes(Some(" 15 ")).unwrap(),
            Some(Duration::from_secs(900))
        );
        assert_eq!(
            parse_ttl_minutes(Some(&MAX_TTL_MINUTES.to_string())).unwrap(),
            Some(Duration::from_secs(MAX_TTL_MINUTES * 60))
        );
    }

    #[test]
    fn ttl_minutes_rejects_garbage_and_huge_values() {
        assert!(parse_ttl_minutes(Some("soon")).is_err());
        assert!(parse_ttl_minutes(Some("-5")).is_err());
        assert!(parse_ttl_minutes(Some(&(MAX_TTL_MINUTES + 1).to_string())).is_err());
        assert!(parse_ttl_minutes(Some("1000000000000")).is_err());
        assert!(parse_ttl_minutes(Some(&u64::MAX.to_string())).is_err());
    }

    #[test]
    fn parse_list_trims_and_drops_empty_entries() {
        assert_eq!(parse_list(" /a, ,/b ,"), vec!["/a".to_string(), "/b".to_string()]);
    }
}
