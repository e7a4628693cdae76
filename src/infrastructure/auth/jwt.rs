//! JWT token generation and validation

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::domain::account::{AccountRecord, AccountRole};
use crate::domain::DomainError;

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (account ID)
    pub sub: String,
    pub username: String,
    pub role: AccountRole,
    /// Issued at timestamp (Unix epoch)
    pub iat: i64,
    /// Expiration timestamp (Unix epoch)
    pub exp: i64,
}

impl JwtClaims {
    /// Create new claims for an account
    pub fn new(account: &AccountRecord, expiration_hours: u64) -> Self {
        let now = Utc::now();
        let exp = now + Duration::hours(expiration_hours as i64);

        Self {
            sub: account.id().as_str().to_string(),
            username: account.username().to_string(),
            role: account.role(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        }
    }

    pub fn account_id(&self) -> &str {
        &self.sub
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

/// Placeholder signing secret; startup warns while it is in use
pub const DEFAULT_JWT_SECRET: &str = "change-me-in-production";

/// Configuration for JWT service
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for HS256 signing
    pub secret: String,
    /// Token expiration time in hours
    pub expiration_hours: u64,
}

impl JwtConfig {
    pub fn new(secret: impl Into<String>, expiration_hours: u64) -> Self {
        Self {
            secret: secret.into(),
            expiration_hours,
        }
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: DEFAULT_JWT_SECRET.to_string(),
            expiration_hours: 24,
        }
    }
}

/// A signed token and the moment it stops being accepted
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Trait for JWT operations
pub trait JwtGenerator: Send + Sync + Debug {
    /// Generate a JWT token for an account
    fn generate(&self, account: &AccountRecord) -> Result<IssuedToken, DomainError>;

    /// Validate a JWT token and return the claims
    fn validate(&self, token: &str) -> Result<JwtClaims, DomainError>;
}

/// HS256 JWT service
#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("expiration_hours", &self.config.expiration_hours)
            .field("encoding_key", &"[hidden]")
            .field("decoding_key", &"[hidden]")
            .finish()
    }
}

impl JwtService {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    pub fn expiration_hours(&self) -> u64 {
        self.config.expiration_hours
    }
}

impl JwtGenerator for JwtService {
    fn generate(&self, account: &AccountRecord) -> Result<IssuedToken, DomainError> {
        let claims = JwtClaims::new(account, self.config.expiration_hours);
        let expires_at = claims
            .expires_at()
            .ok_or_else(|| DomainError::internal("Token expiry is out of range"))?;

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| DomainError::internal(format!("Failed to generate JWT: {}", e)))?;

        Ok(IssuedToken { token, expires_at })
    }

    fn validate(&self, token: &str) -> Result<JwtClaims, DomainError> {
        let validation = Validation::default();

        let token_data = decode::<JwtClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| DomainError::unauthorized(format!("Invalid token: {}", e)))?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::AccountId;

    fn account() -> AccountRecord {
        AccountRecord::new(
            AccountId::generate(),
            "worker",
            "worker@example.org",
            "hash",
            "Social Worker",
        )
        .with_role(AccountRole::Admin)
    }

    #[test]
    fn test_generate_and_validate() {
        let service = JwtService::new(JwtConfig::new("test-secret", 24));
        let account = account();

        let issued = service.generate(&account).unwrap();
        let claims = service.validate(&issued.token).unwrap();

        assert_eq!(claims.account_id(), account.id().as_str());
        assert_eq!(claims.username, "worker");
        assert_eq!(claims.role, AccountRole::Admin);
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
        assert_eq!(claims.expires_at(), Some(issued.expires_at));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issuer = JwtService::new(JwtConfig::new("secret-a", 24));
        let verifier = JwtService::new(JwtConfig::new("secret-b", 24));

        let issued = issuer.generate(&account()).unwrap();
        let err = verifier.validate(&issued.token).unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized { .. }));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let service = JwtService::new(JwtConfig::default());
        assert!(service.validate("not.a.token").is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let service = JwtService::new(JwtConfig::new("test-secret", 24));
        let mut claims = JwtClaims::new(&account(), 24);
        claims.iat -= 3 * 24 * 3600;
        claims.exp = claims.iat + 3600;

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        assert!(service.validate(&token).is_err());
    }
}
