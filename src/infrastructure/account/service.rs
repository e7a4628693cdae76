//! Account service: registration, login and lookup

use std::sync::Arc;

use tracing::{info, warn};

use super::password::PasswordHasher;
use crate::domain::account::{
    validate_email, validate_password, validate_username, AccountId, AccountRecord,
    AccountRepository, AccountValidationError,
};
use crate::domain::member::{MemberFilter, MemberId, MemberQuery, MemberStore};
use crate::domain::DomainError;
use crate::infrastructure::auth::{IssuedToken, JwtGenerator};

const INVALID_CREDENTIALS: &str = "Invalid username or password";

/// Request for registering a new account
#[derive(Debug, Clone)]
pub struct RegisterAccountRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    /// Member profile the account should be linked to
    pub member_id: Option<String>,
}

/// An account together with a freshly issued token
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub account: AccountRecord,
    pub token: IssuedToken,
}

#[derive(Debug)]
pub struct AccountService<R: AccountRepository, S: MemberStore> {
    repository: Arc<R>,
    members: Arc<S>,
    hasher: Arc<dyn PasswordHasher>,
    jwt: Arc<dyn JwtGenerator>,
}

impl<R: AccountRepository, S: MemberStore> AccountService<R, S> {
    pub fn new(
        repository: Arc<R>,
        members: Arc<S>,
        hasher: Arc<dyn PasswordHasher>,
        jwt: Arc<dyn JwtGenerator>,
    ) -> Self {
        Self {
            repository,
            members,
            hasher,
            jwt,
        }
    }

    /// A member may back at most one account, and only once it is registered
    async fn ensure_member_claimable(&self, member_id: &MemberId) -> Result<(), DomainError> {
        let exists = self
            .members
            .find_one(MemberQuery::new(MemberFilter::MemberId(member_id.clone())))
            .await?
            .is_some();
        if !exists {
            return Err(DomainError::validation(format!(
                "Member '{}' is not registered",
                member_id
            )));
        }

        if self.repository.get_by_member_id(member_id).await?.is_some() {
            warn!(member_id = %member_id, "Account registration for an already linked member");
            return Err(DomainError::conflict(format!(
                "Member '{}' is already linked to an account",
                member_id
            )));
        }

        Ok(())
    }

    /// Register an account and sign the caller in
    pub async fn register(
        &self,
        request: RegisterAccountRequest,
    ) -> Result<AuthSession, DomainError> {
        let username = request.username.trim();
        let email = request.email.trim();
        let full_name = request.full_name.trim();

        validate_username(username)?;
        validate_email(email)?;
        validate_password(&request.password)?;
        if full_name.is_empty() {
            return Err(AccountValidationError::EmptyFullName.into());
        }

        let member_id = request
            .member_id
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(MemberId::new)
            .transpose()?;

        if self.repository.get_by_username(username).await?.is_some() {
            return Err(DomainError::conflict(format!(
                "Username '{}' is already taken",
                username
            )));
        }

        if self.repository.get_by_email(email).await?.is_some() {
            return Err(DomainError::conflict(format!(
                "Email '{}' is already registered",
                email
            )));
        }

        if let Some(member_id) = &member_id {
            self.ensure_member_claimable(member_id).await?;
        }

        let password_hash = self.hasher.hash(&request.password)?;

        let account = AccountRecord::new(
            AccountId::generate(),
            username,
            email,
            password_hash,
            full_name,
        )
        .with_phone(request.phone.filter(|p| !p.trim().is_empty()))
        .with_address(request.address.filter(|a| !a.trim().is_empty()))
        .with_member_id(member_id);

        let account = self.repository.create(account).await?;
        let token = self.jwt.generate(&account)?;

        info!(account_id = %account.id(), username = %account.username(), "Account registered");

        Ok(AuthSession { account, token })
    }

    /// Verify credentials and issue a token.
    ///
    /// Unknown usernames and wrong passwords fail identically.
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthSession, DomainError> {
        let Some(account) = self.repository.get_by_username(username.trim()).await? else {
            warn!(username = %username, "Login failed: unknown username");
            return Err(DomainError::unauthorized(INVALID_CREDENTIALS));
        };

        if !self.hasher.verify(password, account.password_hash()) {
            warn!(username = %username, "Login failed: wrong password");
            return Err(DomainError::unauthorized(INVALID_CREDENTIALS));
        }

        let token = self.jwt.generate(&account)?;
        info!(account_id = %account.id(), "Account logged in");

        Ok(AuthSession { account, token })
    }

    pub async fn get(&self, id: &AccountId) -> Result<AccountRecord, DomainError> {
        self.repository
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Account '{}' not found", id)))
    }
}
