//! Authentication error types.

use thiserror::Error;

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Password hashing failed
    #[error("Password hashing failed")]
    HashingFailed,

    /// Unknown email or wrong password. Both causes share this variant so
    /// callers cannot tell them apart.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Email already exists
    #[error("Email already exists")]
    EmailTaken,

    /// Request field missing or malformed
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Session token not present in the store
    #[error("Session not found")]
    SessionNotFound,

    /// Session row exists but `expires_at` has passed
    #[error("Session expired")]
    SessionExpired,

    /// User not found
    #[error("User not found")]
    UserNotFound,

    /// Session lifetime pushes the expiry past the representable date range
    #[error("Session lifetime out of range")]
    SessionTtlOutOfRange,
}

impl AuthError {
    /// Get a client-safe error message that doesn't leak sensitive information
    ///
    /// Database errors are sanitized to prevent information disclosure
    /// about the internal system structure.
    pub fn client_message(&self) -> String {
        match self {
            AuthError::Database(_)
            | AuthError::HashingFailed
            | AuthError::SessionTtlOutOfRange => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }

    /// Whether this error comes from the store or the hasher rather than
    /// from what the client sent.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            AuthError::Database(_) | AuthError::HashingFailed | AuthError::SessionTtlOutOfRange
        )
    }

    /// Whether this error means the presented session cannot be used.
    pub fn is_session_rejection(&self) -> bool {
        matches!(
            self,
            AuthError::SessionNotFound | AuthError::SessionExpired | AuthError::UserNotFound
        )
    }
}

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_error_is_sanitized() {
        let err = AuthError::Database(sqlx::Error::PoolTimedOut);
        assert_eq!(err.client_message(), "Internal server error");
        assert!(err.is_internal());
    }

    #[test]
    fn test_ttl_overflow_is_internal() {
        let err = AuthError::SessionTtlOutOfRange;
        assert_eq!(err.client_message(), "Internal server error");
        assert!(err.is_internal());
        assert!(!err.is_session_rejection());
    }

    #[test]
    fn test_invalid_credentials_message_is_generic() {
        assert_eq!(
            AuthError::InvalidCredentials.client_message(),
            "Invalid credentials"
        );
        assert!(!AuthError::InvalidCredentials.is_internal());
    }

    #[test]
    fn test_session_rejections() {
        assert!(AuthError::SessionNotFound.is_session_rejection());
        assert!(AuthError::SessionExpired.is_session_rejection());
        assert!(AuthError::UserNotFound.is_session_rejection());
        assert!(!AuthError::Database(sqlx::Error::PoolClosed).is_session_rejection());
    }
}
