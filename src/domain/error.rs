use thiserror::Error;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Member '{display_name}' is already registered")]
    DuplicateMember { display_name: String },

    #[error("Member ID sequence exhausted for prefix '{prefix}'")]
    AllocationExhausted { prefix: String },

    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// A storage-level uniqueness constraint rejected a write
    #[error("Unique constraint '{constraint}' violated by '{value}'")]
    UniqueViolation { constraint: String, value: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn duplicate_member(display_name: impl Into<String>) -> Self {
        Self::DuplicateMember {
            display_name: display_name.into(),
        }
    }

    pub fn allocation_exhausted(prefix: impl Into<String>) -> Self {
        Self::AllocationExhausted {
            prefix: prefix.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn unique_violation(constraint: impl Into<String>, value: impl Into<String>) -> Self {
        Self::UniqueViolation {
            constraint: constraint.into(),
            value: value.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// True for the retryable uniqueness sub-kind of store failure
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation { .. })
    }

    /// True for any failure raised by the record store
    pub fn is_store_error(&self) -> bool {
        matches!(self, Self::Storage { .. } | Self::UniqueViolation { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error() {
        let error = DomainError::not_found("Member 'M2401001' not found");
        assert_eq!(error.to_string(), "Not found: Member 'M2401001' not found");
    }

    #[test]
    fn test_validation_error() {
        let error = DomainError::validation("Invalid input");
        assert_eq!(error.to_string(), "Validation error: Invalid input");
    }

    #[test]
    fn test_duplicate_member_error() {
        let error = DomainError::duplicate_member("陳大文");
        assert_eq!(error.to_string(), "Member '陳大文' is already registered");
    }

    #[test]
    fn test_store_error_kinds() {
        let unique = DomainError::unique_violation("members_pkey", "M2401001");
        assert!(unique.is_unique_violation());
        assert!(unique.is_store_error());

        let storage = DomainError::storage("connection reset");
        assert!(!storage.is_unique_violation());
        assert!(storage.is_store_error());

        assert!(!DomainError::conflict("taken").is_store_error());
    }
}
