//! Runtime storage backend selection

use std::str::FromStr;

use sqlx::PgPool;
use tracing::info;

use crate::domain::DomainError;

use super::migrations::run_storage_migrations;
use super::postgres::PostgresConfig;

/// Supported storage backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    /// Process-local maps, lost on restart
    InMemory,
    /// PostgreSQL via sqlx
    Postgres,
}

impl FromStr for StorageType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" | "inmemory" | "in-memory" | "in_memory" => Ok(Self::InMemory),
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            other => Err(DomainError::configuration(format!(
                "Unknown storage backend '{}'. Allowed: memory, postgres",
                other
            ))),
        }
    }
}

/// Resolved storage configuration
#[derive(Debug, Clone)]
pub enum StorageConfig {
    InMemory,
    Postgres(PostgresConfig),
}

impl StorageConfig {
    /// Build from a backend name and an optional database URL
    pub fn resolve(backend: &str, database_url: Option<&str>) -> Result<Self, DomainError> {
        match backend.parse::<StorageType>()? {
            StorageType::InMemory => Ok(Self::InMemory),
            StorageType::Postgres => {
                let url = database_url.filter(|u| !u.trim().is_empty()).ok_or_else(|| {
                    DomainError::configuration("storage.database_url is required for postgres")
                })?;
                Ok(Self::Postgres(PostgresConfig::new(url)))
            }
        }
    }

    pub fn storage_type(&self) -> StorageType {
        match self {
            Self::InMemory => StorageType::InMemory,
            Self::Postgres(_) => StorageType::Postgres,
        }
    }
}

/// Opens pools and prepares schemas
#[derive(Debug)]
pub struct StorageFactory;

impl StorageFactory {
    /// Connect to PostgreSQL and bring the schema up to date
    pub async fn connect_postgres(config: &PostgresConfig) -> Result<PgPool, DomainError> {
        let pool = config.connect().await?;

        if let Some(version) = run_storage_migrations(&pool).await? {
            info!(version, "Storage schema ready");
        }

        Ok(pool)
    }
}
