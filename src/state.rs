use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;

use crate::auth::repo::{TokenStore, UserStore};
use crate::auth::services::AuthService;
use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<AppConfig>,
    pub auth: AuthService,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await?;

        Ok(Self::from_parts(db, config))
    }

    /// Wires the stores and the service from already-built parts.
    pub fn from_parts(db: PgPool, config: Arc<AppConfig>) -> Self {
        // `ttl_hours > 0` is enforced when the config is loaded.
        let token_ttl = Duration::from_secs(config.token.ttl_hours as u64 * 3600);
        let auth = AuthService::new(
            UserStore::new(db.clone()),
            TokenStore::new(db.clone()),
            token_ttl,
        );
        Self { db, config, auth }
    }
}
