use chrono::FixedOffset;
use serde::Deserialize;

use crate::domain::DomainError;
use crate::infrastructure::auth::{JwtConfig, DEFAULT_JWT_SECRET};
use crate::infrastructure::observability::MetricsConfig;
use crate::infrastructure::registry::RegistryOptions;
use crate::infrastructure::storage::{PostgresConfig, StorageConfig};

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub storage: StorageSettings,
    pub auth: AuthSettings,
    pub registry: RegistrySettings,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// `memory` or `postgres`
    pub backend: String,
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub token_expiration_hours: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RegistrySettings {
    pub max_allocation_attempts: u32,
    /// Offset used to decide which calendar month an instant belongs to
    pub utc_offset_minutes: i32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: "memory".to_string(),
            database_url: None,
            max_connections: 10,
            min_connections: 1,
            connect_timeout_secs: 30,
            idle_timeout_secs: 600,
        }
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            token_expiration_hours: 24,
        }
    }
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            max_allocation_attempts: 3,
            utc_offset_minutes: 0,
        }
    }
}

impl StorageSettings {
    pub fn resolve(&self) -> Result<StorageConfig, DomainError> {
        Ok(
            match StorageConfig::resolve(&self.backend, self.database_url.as_deref())? {
                StorageConfig::Postgres(pg) => StorageConfig::Postgres(
                    PostgresConfig::new(pg.url)
                        .with_max_connections(self.max_connections)
                        .with_min_connections(self.min_connections)
                        .with_connect_timeout(self.connect_timeout_secs)
                        .with_idle_timeout(self.idle_timeout_secs),
                ),
                other => other,
            },
        )
    }
}

impl AuthSettings {
    pub fn jwt_config(&self) -> JwtConfig {
        JwtConfig::new(self.jwt_secret.clone(), self.token_expiration_hours)
    }
}

impl RegistrySettings {
    pub fn options(&self) -> Result<RegistryOptions, DomainError> {
        let utc_offset = self
            .utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                DomainError::configuration(format!(
                    "registry.utc_offset_minutes out of range: {}",
                    self.utc_offset_minutes
                ))
            })?;

        Ok(RegistryOptions {
            max_allocation_attempts: self.max_allocation_attempts.max(1),
            utc_offset,
        })
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
