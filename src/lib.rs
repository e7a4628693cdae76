//! Membership intake service
//!
//! Registers beneficiaries under month-scoped sequential identifiers
//! (`M` + `YYMM` + three digits), lets linked accounts read and patch their
//! own profile through an allow-list, and offers keyword search and a
//! paginated member directory.

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use api::state::AppState;
use domain::{AccountRepository, MemberStore, SystemClock};
use infrastructure::{
    account::{AccountService, Argon2Hasher, InMemoryAccountRepository, PostgresAccountRepository},
    auth::{JwtAuthenticator, JwtGenerator, JwtService, DEFAULT_JWT_SECRET},
    registry::{MemberRegistry, RegistryOptions},
    storage::{InMemoryMemberStore, PostgresMemberStore, StorageConfig, StorageFactory},
};
use tracing::{info, warn};

/// Build the application state for the configured storage backend
pub async fn create_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let options = config.registry.options()?;
    let jwt: Arc<dyn JwtGenerator> = Arc::new(JwtService::new(config.auth.jwt_config()));

    if config.auth.jwt_secret == DEFAULT_JWT_SECRET {
        warn!("Using the default JWT secret; set APP__AUTH__JWT_SECRET");
    }

    match config.storage.resolve()? {
        StorageConfig::InMemory => {
            info!("Using in-memory storage");
            Ok(build_state(
                Arc::new(InMemoryMemberStore::new()),
                Arc::new(InMemoryAccountRepository::new()),
                jwt,
                options,
            ))
        }
        StorageConfig::Postgres(pg) => {
            info!("Using PostgreSQL storage");
            let pool = StorageFactory::connect_postgres(&pg).await?;
            Ok(build_state(
                Arc::new(PostgresMemberStore::new(pool.clone())),
                Arc::new(PostgresAccountRepository::new(pool)),
                jwt,
                options,
            ))
        }
    }
}

fn build_state<S, R>(
    store: Arc<S>,
    accounts: Arc<R>,
    jwt: Arc<dyn JwtGenerator>,
    options: RegistryOptions,
) -> AppState
where
    S: MemberStore + 'static,
    R: AccountRepository + 'static,
{
    let registry = MemberRegistry::new(store.clone(), Arc::new(SystemClock), options);
    let account_service = AccountService::new(
        accounts.clone(),
        store,
        Arc::new(Argon2Hasher::new()),
        jwt.clone(),
    );
    let authenticator = JwtAuthenticator::new(jwt, accounts);

    AppState::new(
        Arc::new(registry),
        Arc::new(account_service),
        Arc::new(authenticator),
    )
}
