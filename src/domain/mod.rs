//! Domain layer - Core business logic and entities

pub mod account;
pub mod auth;
pub mod clock;
pub mod error;
pub mod member;

pub use account::{AccountId, AccountRecord, AccountRepository, AccountRole};
pub use auth::{Authenticator, CallerIdentity};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::DomainError;
pub use member::{
    MemberFilter, MemberId, MemberQuery, MemberRecord, MemberSort, MemberStore, MemberSummary,
    NewMemberInput, ProfilePatch,
};
