//! Bearer-token authenticator backed by the account repository

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::jwt::JwtGenerator;
use crate::domain::account::{AccountId, AccountRepository};
use crate::domain::auth::{Authenticator, CallerIdentity};
use crate::domain::DomainError;

/// Validates a JWT and reloads the account it names
pub struct JwtAuthenticator<R: AccountRepository> {
    jwt: Arc<dyn JwtGenerator>,
    accounts: Arc<R>,
}

impl<R: AccountRepository> std::fmt::Debug for JwtAuthenticator<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtAuthenticator")
            .field("jwt", &self.jwt)
            .finish()
    }
}

impl<R: AccountRepository> JwtAuthenticator<R> {
    pub fn new(jwt: Arc<dyn JwtGenerator>, accounts: Arc<R>) -> Self {
        Self { jwt, accounts }
    }
}

#[async_trait]
impl<R: AccountRepository + 'static> Authenticator for JwtAuthenticator<R> {
    async fn verify(&self, credential: &str) -> Result<CallerIdentity, DomainError> {
        let claims = self.jwt.validate(credential)?;

        let account_id = AccountId::new(claims.account_id())
            .map_err(|_| DomainError::unauthorized("Invalid token subject"))?;

        let account = self.accounts.get(&account_id).await?.ok_or_else(|| {
            debug!(account_id = %account_id, "Token names an unknown account");
            DomainError::unauthorized("Account no longer exists")
        })?;

        Ok(CallerIdentity {
            account_id: account.id().clone(),
            username: account.username().to_string(),
            role: account.role(),
            member_id: account.member_id().cloned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::{AccountRecord, MockAccountRepository};
    use crate::domain::member::MemberId;
    use crate::infrastructure::auth::jwt::{JwtConfig, JwtService};

    fn linked_account() -> AccountRecord {
        AccountRecord::new(
            AccountId::generate(),
            "chan",
            "chan@example.org",
            "hash",
            "陳大文",
        )
        .with_member_id(Some(MemberId::new("M2403001").unwrap()))
    }

    #[tokio::test]
    async fn test_verify_valid_token() {
        let jwt = Arc::new(JwtService::new(JwtConfig::new("secret", 1)));
        let account = linked_account();
        let token = jwt.generate(&account).unwrap().token;

        let stored = account.clone();
        let mut accounts = MockAccountRepository::new();
        accounts
            .expect_get()
            .times(1)
            .returning(move |_| Ok(Some(stored.clone())));

        let authenticator = JwtAuthenticator::new(jwt, Arc::new(accounts));
        let caller = authenticator.verify(&token).await.unwrap();

        assert_eq!(caller.account_id, *account.id());
        assert_eq!(caller.username, "chan");
        assert_eq!(caller.member_id.unwrap().as_str(), "M2403001");
    }

    #[tokio::test]
    async fn test_bad_token_skips_repository() {
        let jwt = Arc::new(JwtService::new(JwtConfig::new("secret", 1)));
        let mut accounts = MockAccountRepository::new();
        accounts.expect_get().times(0);

        let authenticator = JwtAuthenticator::new(jwt, Arc::new(accounts));
        let err = authenticator.verify("garbage").await.unwrap_err();

        assert!(matches!(err, DomainError::Unauthorized { .. }));
    }

    #[tokio::test]
    async fn test_deleted_account_rejected() {
        let jwt = Arc::new(JwtService::new(JwtConfig::new("secret", 1)));
        let token = jwt.generate(&linked_account()).unwrap().token;

        let mut accounts = MockAccountRepository::new();
        accounts.expect_get().returning(|_| Ok(None));

        let authenticator = JwtAuthenticator::new(jwt, Arc::new(accounts));
        let err = authenticator.verify(&token).await.unwrap_err();

        assert!(matches!(err, DomainError::Unauthorized { .. }));
    }
}
