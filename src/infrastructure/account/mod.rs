//! Account infrastructure module
//!
//! Argon2 password hashing, in-memory and PostgreSQL account repositories,
//! and the account service behind registration and login.

mod password;
mod postgres_repository;
mod repository;
mod service;

pub use password::{Argon2Hasher, PasswordHasher};
pub use postgres_repository::PostgresAccountRepository;
pub use repository::InMemoryAccountRepository;
pub use service::{AccountService, AuthSession, RegisterAccountRequest};
