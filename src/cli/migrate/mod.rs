//! Migrate command - brings the PostgreSQL schema up to date

use anyhow::bail;
use tracing::info;

use crate::config::AppConfig;
use crate::infrastructure::logging;
use crate::infrastructure::storage::{run_storage_migrations, StorageConfig};

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    logging::init_logging(&config.logging);

    let StorageConfig::Postgres(pg) = config.storage.resolve()? else {
        bail!("Migrations need storage.backend = postgres (got '{}')", config.storage.backend);
    };

    let pool = pg.connect().await?;
    let version = run_storage_migrations(&pool).await?;

    info!(version = ?version, "Migrations complete");
    pool.close().await;

    Ok(())
}
