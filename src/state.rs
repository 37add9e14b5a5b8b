use std::sync::Arc;

use anyhow::Context;
use sqlx::{migrate::Migrator, postgres::PgPoolOptions};
use tracing::{info, warn};

use crate::auth::jwt::TokenCodec;
use crate::config::AppConfig;
use crate::messages::{
    memory::MemoryMessageStore,
    repo::{MessageStore, PgMessageStore},
};
use crate::users::{
    memory::MemoryUserStore,
    repo::{PgUserStore, UserStore},
};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub tokens: TokenCodec,
    pub users: Arc<dyn UserStore>,
    pub messages: Arc<dyn MessageStore>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;

        let Some(url) = config.database_url.clone() else {
            warn!("DATABASE_URL not set; using in-memory stores");
            return Ok(Self::in_memory(config));
        };

        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(&url)
            .await
            .context("connect to database")?;

        MIGRATOR.run(&db).await.context("run migrations")?;
        info!(migrations = MIGRATOR.iter().count(), "using postgres stores");

        Ok(Self::from_parts(
            config,
            Arc::new(PgUserStore::new(db.clone())),
            Arc::new(PgMessageStore::new(db)),
        ))
    }

    pub fn from_parts(
        config: AppConfig,
        users: Arc<dyn UserStore>,
        messages: Arc<dyn MessageStore>,
    ) -> Self {
        Self {
            tokens: TokenCodec::new(&config.auth),
            config: Arc::new(config),
            users,
            messages,
        }
    }

    pub fn in_memory(config: AppConfig) -> Self {
        Self::from_parts(
            config,
            Arc::new(MemoryUserStore::default()),
            Arc::new(MemoryMessageStore::default()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_migrations_create_both_tables() {
        let first = MIGRATOR.iter().next().expect("at least one migration");
        assert_eq!(first.version, 1);
        assert!(first.sql.contains("CREATE TABLE IF NOT EXISTS users"));
        assert!(first.sql.contains("CREATE TABLE IF NOT EXISTS messages"));
    }
}
