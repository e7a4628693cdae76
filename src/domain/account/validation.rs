//! Account validation utilities

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::domain::DomainError;

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid"));

/// Errors that can occur during account validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AccountValidationError {
    #[error("Username cannot be empty")]
    EmptyUsername,

    #[error("Username exceeds maximum length of {0} characters")]
    UsernameTooLong(usize),

    #[error("Username is too short. Minimum length is {0} characters")]
    UsernameTooShort(usize),

    #[error("Username contains invalid character: '{0}'. Only alphanumeric characters, underscores, and hyphens are allowed")]
    InvalidUsernameCharacter(char),

    #[error("Password is too short. Minimum length is {0} characters")]
    PasswordTooShort(usize),

    #[error("Password exceeds maximum length of {0} characters")]
    PasswordTooLong(usize),

    #[error("Invalid email address: '{0}'")]
    InvalidEmail(String),

    #[error("Full name cannot be empty")]
    EmptyFullName,

    #[error("Invalid account ID: '{0}'")]
    InvalidId(String),

    #[error("Unknown account role: '{0}'")]
    InvalidRole(String),
}

impl From<AccountValidationError> for DomainError {
    fn from(err: AccountValidationError) -> Self {
        DomainError::validation(err.to_string())
    }
}

const MIN_USERNAME_LENGTH: usize = 3;
const MAX_USERNAME_LENGTH: usize = 50;
const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_PASSWORD_LENGTH: usize = 128;

/// Validate a username
///
/// Rules:
/// - Cannot be empty
/// - Between 3 and 50 characters
/// - Only alphanumeric characters, underscores, and hyphens
pub fn validate_username(username: &str) -> Result<(), AccountValidationError> {
    if username.is_empty() {
        return Err(AccountValidationError::EmptyUsername);
    }

    if username.len() < MIN_USERNAME_LENGTH {
        return Err(AccountValidationError::UsernameTooShort(MIN_USERNAME_LENGTH));
    }

    if username.len() > MAX_USERNAME_LENGTH {
        return Err(AccountValidationError::UsernameTooLong(MAX_USERNAME_LENGTH));
    }

    for c in username.chars() {
        if !c.is_ascii_alphanumeric() && c != '_' && c != '-' {
            return Err(AccountValidationError::InvalidUsernameCharacter(c));
        }
    }

    Ok(())
}

/// Validate a password length (8 to 128 bytes)
pub fn validate_password(password: &str) -> Result<(), AccountValidationError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AccountValidationError::PasswordTooShort(MIN_PASSWORD_LENGTH));
    }

    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(AccountValidationError::PasswordTooLong(MAX_PASSWORD_LENGTH));
    }

    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), AccountValidationError> {
    if !EMAIL_PATTERN.is_match(email) {
        return Err(AccountValidationError::InvalidEmail(email.to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_usernames() {
        assert!(validate_username("admin").is_ok());
        assert!(validate_username("social_worker").is_ok());
        assert!(validate_username("staff-01").is_ok());
    }

    #[test]
    fn test_username_rules() {
        assert_eq!(
            validate_username(""),
            Err(AccountValidationError::EmptyUsername)
        );
        assert_eq!(
            validate_username("ab"),
            Err(AccountValidationError::UsernameTooShort(3))
        );
        assert_eq!(
            validate_username(&"a".repeat(51)),
            Err(AccountValidationError::UsernameTooLong(50))
        );
        assert_eq!(
            validate_username("user@name"),
            Err(AccountValidationError::InvalidUsernameCharacter('@'))
        );
    }

    #[test]
    fn test_password_rules() {
        assert!(validate_password("12345678").is_ok());
        assert_eq!(
            validate_password("short"),
            Err(AccountValidationError::PasswordTooShort(8))
        );
        assert_eq!(
            validate_password(&"a".repeat(129)),
            Err(AccountValidationError::PasswordTooLong(128))
        );
    }

    #[test]
    fn test_email_rules() {
        assert!(validate_email("worker@example.org").is_ok());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("two@@example.org").is_err());
        assert!(validate_email("space in@example.org").is_err());
    }
}
