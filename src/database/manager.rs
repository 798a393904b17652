use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;

use super::error::{StoreError, StoreResult};
use crate::config::DatabaseConfig;

/// Builds the connection pool and applies embedded migrations.
pub struct DatabaseManager;

impl DatabaseManager {
    /// Connects using `database.url` from configuration.
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<PgPool> {
        let url = config.url.as_deref().ok_or(StoreError::ConfigMissing("DATABASE_URL"))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;

        info!("Connected to database {}", Self::redacted(url));
        Ok(pool)
    }

    /// Runs every pending migration from `migrations/`.
    pub async fn migrate(pool: &PgPool) -> StoreResult<()> {
        sqlx::migrate!("./migrations").run(pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    /// Connection string with the password masked, for logs.
    fn redacted(url: &str) -> String {
        match url::Url::parse(url) {
            Ok(mut parsed) => {
                if parsed.password().is_some() {
                    let _ = parsed.set_password(Some("***"));
                }
                parsed.into()
            }
            Err(_) => "<invalid url>".to_string(),
        }
    }
}
