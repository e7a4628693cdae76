//! In-memory account repository

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::account::{AccountId, AccountRecord, AccountRepository};
use crate::domain::member::MemberId;
use crate::domain::DomainError;

/// In-memory implementation of AccountRepository
#[derive(Debug, Default)]
pub struct InMemoryAccountRepository {
    accounts: Arc<RwLock<HashMap<String, AccountRecord>>>,
    /// Index for username -> account ID lookup
    username_index: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn get(&self, id: &AccountId) -> Result<Option<AccountRecord>, DomainError> {
        let accounts = self.accounts.read().await;
        Ok(accounts.get(id.as_str()).cloned())
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<AccountRecord>, DomainError> {
        let username_index = self.username_index.read().await;

        if let Some(account_id) = username_index.get(username) {
            let accounts = self.accounts.read().await;
            return Ok(accounts.get(account_id).cloned());
        }

        Ok(None)
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<AccountRecord>, DomainError> {
        let accounts = self.accounts.read().await;
        Ok(accounts.values().find(|a| a.email() == email).cloned())
    }

    async fn get_by_member_id(
        &self,
        member_id: &MemberId,
    ) -> Result<Option<AccountRecord>, DomainError> {
        let accounts = self.accounts.read().await;
        Ok(accounts
            .values()
            .find(|a| a.member_id() == Some(member_id))
            .cloned())
    }

    async fn create(&self, account: AccountRecord) -> Result<AccountRecord, DomainError> {
        let mut accounts = self.accounts.write().await;
        let mut username_index = self.username_index.write().await;

        let id = account.id().as_str().to_string();

        if accounts.contains_key(&id) {
            return Err(DomainError::conflict(format!(
                "Account with ID '{}' already exists",
                id
            )));
        }

        if username_index.contains_key(account.username()) {
            return Err(DomainError::conflict(format!(
                "Username '{}' already exists",
                account.username()
            )));
        }

        if accounts.values().any(|a| a.email() == account.email()) {
            return Err(DomainError::conflict(format!(
                "Email '{}' already exists",
                account.email()
            )));
        }

        if let Some(member_id) = account.member_id() {
            if accounts.values().any(|a| a.member_id() == Some(member_id)) {
                return Err(DomainError::conflict(format!(
                    "Member '{}' is already linked to an account",
                    member_id
                )));
            }
        }

        username_index.insert(account.username().to_string(), id.clone());
        accounts.insert(id, account.clone());

        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(username: &str, email: &str) -> AccountRecord {
        AccountRecord::new(AccountId::generate(), username, email, "hash", "Full Name")
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let repo = InMemoryAccountRepository::new();
        let created = repo
            .create(account("worker", "worker@example.org"))
            .await
            .unwrap();

        let by_id = repo.get(created.id()).await.unwrap().unwrap();
        assert_eq!(by_id.username(), "worker");

        let by_name = repo.get_by_username("worker").await.unwrap().unwrap();
        assert_eq!(by_name.id(), created.id());

        let by_email = repo
            .get_by_email("worker@example.org")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_email.id(), created.id());

        assert!(repo.get_by_username("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_username_and_email_unique() {
        let repo = InMemoryAccountRepository::new();
        repo.create(account("worker", "worker@example.org"))
            .await
            .unwrap();

        let same_name = repo.create(account("worker", "other@example.org")).await;
        assert!(matches!(same_name, Err(DomainError::Conflict { .. })));

        let same_email = repo.create(account("other", "worker@example.org")).await;
        assert!(matches!(same_email, Err(DomainError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_member_link_unique() {
        let repo = InMemoryAccountRepository::new();
        let member = MemberId::new("M2403001").unwrap();

        let linked = repo
            .create(account("chan", "chan@example.org").with_member_id(Some(member.clone())))
            .await
            .unwrap();
        let found = repo.get_by_member_id(&member).await.unwrap().unwrap();
        assert_eq!(found.id(), linked.id());

        let second = repo
            .create(account("stranger", "stranger@example.org").with_member_id(Some(member)))
            .await;
        assert!(matches!(second, Err(DomainError::Conflict { .. })));

        // unlinked accounts never collide
        repo.create(account("a", "a@example.org")).await.unwrap();
        repo.create(account("b", "b@example.org")).await.unwrap();
    }
}
