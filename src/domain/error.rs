//! Domain Error Types
//!
//! Pure domain errors that don't depend on infrastructure.

use thiserror::Error;

/// Business rule violations raised by value objects and the aggregate.
///
/// These never reach storage: validation happens before any event is staged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    #[error("display name must be at least 2 characters")]
    DisplayNameTooShort,

    #[error("display name must be at most 50 characters")]
    DisplayNameTooLong,

    #[error("bio must be at most 500 characters")]
    BioTooLong,

    #[error("member must be at least 18 years old")]
    TooYoung,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = DomainError::InvalidEmail("not-an-email".to_string());
        assert!(err.to_string().contains("not-an-email"));

        assert!(DomainError::TooYoung.to_string().contains("18"));
    }
}
