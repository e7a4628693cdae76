//! Application state for shared services

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::account::{AccountId, AccountRecord, AccountRepository};
use crate::domain::member::{MemberRecord, MemberStore, MemberSummary, NewMemberInput, ProfilePatch};
use crate::domain::{Authenticator, CallerIdentity, DomainError, MemberId};
use crate::infrastructure::account::{AccountService, AuthSession, RegisterAccountRequest};
use crate::infrastructure::registry::{MemberPage, MemberRegistry, MemberStats};

/// Application state containing shared services using dynamic dispatch
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<dyn MemberRegistryTrait>,
    pub accounts: Arc<dyn AccountServiceTrait>,
    pub authenticator: Arc<dyn Authenticator>,
}

impl AppState {
    pub fn new(
        registry: Arc<dyn MemberRegistryTrait>,
        accounts: Arc<dyn AccountServiceTrait>,
        authenticator: Arc<dyn Authenticator>,
    ) -> Self {
        Self {
            registry,
            accounts,
            authenticator,
        }
    }
}

/// Member registry operations exposed to handlers
#[async_trait]
pub trait MemberRegistryTrait: Send + Sync {
    async fn register(&self, input: NewMemberInput) -> Result<MemberId, DomainError>;
    async fn get_profile(&self, caller: &CallerIdentity) -> Result<MemberRecord, DomainError>;
    async fn update_profile(
        &self,
        caller: &CallerIdentity,
        patch: ProfilePatch,
    ) -> Result<MemberRecord, DomainError>;
    async fn search(&self, term: Option<&str>) -> Result<Vec<MemberSummary>, DomainError>;
    async fn get(&self, member_id: &str) -> Result<MemberRecord, DomainError>;
    async fn list(&self, page: usize, per_page: usize) -> Result<MemberPage, DomainError>;
    async fn stats(&self) -> Result<MemberStats, DomainError>;
    async fn health_check(&self) -> Result<(), DomainError>;
}

/// Account operations exposed to handlers
#[async_trait]
pub trait AccountServiceTrait: Send + Sync {
    async fn register(&self, request: RegisterAccountRequest) -> Result<AuthSession, DomainError>;
    async fn login(&self, username: &str, password: &str) -> Result<AuthSession, DomainError>;
    async fn get(&self, id: &AccountId) -> Result<AccountRecord, DomainError>;
}

#[async_trait]
impl<S: MemberStore + 'static> MemberRegistryTrait for MemberRegistry<S> {
    async fn register(&self, input: NewMemberInput) -> Result<MemberId, DomainError> {
        MemberRegistry::register(self, input).await
    }

    async fn get_profile(&self, caller: &CallerIdentity) -> Result<MemberRecord, DomainError> {
        MemberRegistry::get_profile(self, caller).await
    }

    async fn update_profile(
        &self,
        caller: &CallerIdentity,
        patch: ProfilePatch,
    ) -> Result<MemberRecord, DomainError> {
        MemberRegistry::update_profile(self, caller, patch).await
    }

    async fn search(&self, term: Option<&str>) -> Result<Vec<MemberSummary>, DomainError> {
        MemberRegistry::search(self, term).await
    }

    async fn get(&self, member_id: &str) -> Result<MemberRecord, DomainError> {
        MemberRegistry::get(self, member_id).await
    }

    async fn list(&self, page: usize, per_page: usize) -> Result<MemberPage, DomainError> {
        MemberRegistry::list(self, page, per_page).await
    }

    async fn stats(&self) -> Result<MemberStats, DomainError> {
        MemberRegistry::stats(self).await
    }

    async fn health_check(&self) -> Result<(), DomainError> {
        MemberRegistry::health_check(self).await
    }
}

#[async_trait]
impl<R, S> AccountServiceTrait for AccountService<R, S>
where
    R: AccountRepository + 'static,
    S: MemberStore + 'static,
{
    async fn register(&self, request: RegisterAccountRequest) -> Result<AuthSession, DomainError> {
        AccountService::register(self, request).await
    }

    async fn login(&self, username: &str, password: &str) -> Result<AuthSession, DomainError> {
        AccountService::login(self, username, password).await
    }

    async fn get(&self, id: &AccountId) -> Result<AccountRecord, DomainError> {
        AccountService::get(self, id).await
    }
}
