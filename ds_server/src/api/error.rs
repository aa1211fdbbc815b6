//! API error responses.
//!
//! Every failure leaving the HTTP layer is one of these variants, rendered as
//! `{"error": "<short message>"}` with the matching status code. Store and
//! hashing details never reach the client; they are logged where they occur.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use drive_school::auth::AuthError;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Client-facing error taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// Unknown email or wrong password
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Missing, invalid or expired session, or insufficient role
    #[error("Unauthorized")]
    Unauthorized,

    /// Unexpected fault while resolving a session in the middleware
    #[error("Verification failed")]
    VerificationFailed,

    /// Malformed request body
    #[error("Validation failed")]
    ValidationFailed,

    /// Any registration failure, including taken emails
    #[error("Registration failed")]
    RegistrationFailed,

    /// Store unreachable or read/write error
    #[error("Internal server error")]
    StoreFailure,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidCredentials | ApiError::Unauthorized | ApiError::VerificationFailed => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::ValidationFailed | ApiError::RegistrationFailed => StatusCode::BAD_REQUEST,
            ApiError::StoreFailure => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => ApiError::InvalidCredentials,
            AuthError::SessionNotFound | AuthError::SessionExpired | AuthError::UserNotFound => {
                ApiError::Unauthorized
            }
            AuthError::InvalidInput(_) => ApiError::ValidationFailed,
            AuthError::EmailTaken => ApiError::RegistrationFailed,
            AuthError::Database(_)
            | AuthError::HashingFailed
            | AuthError::SessionTtlOutOfRange => ApiError::StoreFailure,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::InvalidCredentials.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::VerificationFailed.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::ValidationFailed.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::RegistrationFailed.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::StoreFailure.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_store_errors_are_not_leaked() {
        let err = ApiError::from(AuthError::Database(sqlx::Error::PoolTimedOut));
        assert_eq!(err, ApiError::StoreFailure);
        assert_eq!(err.to_string(), "Internal server error");
    }

    #[test]
    fn test_session_rejections_collapse_to_unauthorized() {
        for err in [
            AuthError::SessionNotFound,
            AuthError::SessionExpired,
            AuthError::UserNotFound,
        ] {
            assert_eq!(ApiError::from(err), ApiError::Unauthorized);
        }
    }
}
