//! Storage infrastructure - member store backends and schema migrations

mod factory;
mod in_memory;
pub mod migrations;
mod postgres;

pub use factory::{StorageConfig, StorageFactory, StorageType};
pub use in_memory::InMemoryMemberStore;
pub use migrations::{run_storage_migrations, Migration, PostgresMigrator};
pub use postgres::{PostgresConfig, PostgresMemberStore};
