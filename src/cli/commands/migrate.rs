use crate::cli::{utils::output_success, OutputFormat};
use crate::config;
use crate::database::DatabaseManager;

pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let pool = DatabaseManager::connect(&config::config().database).await?;
    DatabaseManager::migrate(&pool).await?;
    output_success(&output_format, "Database migrations applied", None)
}
