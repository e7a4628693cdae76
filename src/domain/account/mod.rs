//! Account domain
//!
//! Login accounts for staff and members. An account may reference the member
//! record it speaks for; the two are otherwise independent.

mod entity;
mod repository;
mod validation;

pub use entity::{AccountId, AccountRecord, AccountRole};
pub use repository::AccountRepository;
pub use validation::{
    AccountValidationError, validate_email, validate_password, validate_username,
};

#[cfg(test)]
pub use repository::MockAccountRepository;
