//! Caller authentication

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::DomainError;
use crate::domain::account::{AccountId, AccountRole};
use crate::domain::member::MemberId;

#[cfg(test)]
use mockall::automock;

/// Who is making a request, as established by a verified credential
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallerIdentity {
    pub account_id: AccountId,
    pub username: String,
    pub role: AccountRole,
    /// Member record the caller's profile operations act on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_id: Option<MemberId>,
}

/// Verifies bearer credentials
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Resolve a credential to a caller, or fail with `Unauthorized`
    async fn verify(&self, credential: &str) -> Result<CallerIdentity, DomainError>;
}
