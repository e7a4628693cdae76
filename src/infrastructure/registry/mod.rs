//! Member registry infrastructure
//!
//! Identifier allocation and the registry service that orchestrates
//! registration, profile updates, search and the member directory.

mod allocator;
mod service;

pub use allocator::IdentifierAllocator;
pub use service::{
    MemberPage, MemberRegistry, MemberStats, RegistryOptions, DEFAULT_PER_PAGE, MAX_PER_PAGE,
};
