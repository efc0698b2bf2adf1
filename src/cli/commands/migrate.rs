use anyhow::Context;

use crate::config;
use crate::database::{schema, DatabaseManager};

pub async fn handle() -> anyhow::Result<()> {
    DatabaseManager::init(&config::config().database)
        .await
        .context("failed to initialize database pool")?;
    let pool = DatabaseManager::pool().await?;

    let result = schema::ensure_schema(&pool).await;
    DatabaseManager::close().await;
    result.context("failed to initialize database schema")
}
