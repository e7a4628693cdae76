//! Account repository trait

use async_trait::async_trait;

use super::entity::{AccountId, AccountRecord};
use crate::domain::member::MemberId;
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Repository trait for account storage
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Get an account by its ID
    async fn get(&self, id: &AccountId) -> Result<Option<AccountRecord>, DomainError>;

    /// Get an account by its username (for login)
    async fn get_by_username(&self, username: &str) -> Result<Option<AccountRecord>, DomainError>;

    async fn get_by_email(&self, email: &str) -> Result<Option<AccountRecord>, DomainError>;

    /// The account linked to a member profile, if any
    async fn get_by_member_id(
        &self,
        member_id: &MemberId,
    ) -> Result<Option<AccountRecord>, DomainError>;

    /// Create a new account; a taken username, email or member link is a conflict
    async fn create(&self, account: AccountRecord) -> Result<AccountRecord, DomainError>;
}
