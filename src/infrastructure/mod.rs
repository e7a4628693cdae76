//! Infrastructure layer - storage backends, services and external adapters

pub mod account;
pub mod auth;
pub mod logging;
pub mod observability;
pub mod registry;
pub mod storage;
