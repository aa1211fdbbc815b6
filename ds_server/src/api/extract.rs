//! Authenticated-caller extractor.
//!
//! [`access_middleware`](super::middleware::access_middleware) attaches an
//! [`AuthUser`] to every request it lets through on a gated path. Handlers
//! take it as an argument instead of re-reading the cookie:
//!
//! ```rust,no_run
//! use ds_server::api::extract::AuthUser;
//!
//! async fn my_calendars(user: AuthUser) -> String {
//!     format!("calendars of {}", user.email)
//! }
//! # let _ = my_calendars;
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};
use drive_school::auth::{Role, User, UserId};

use super::error::ApiError;

/// The user behind the current request's session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Check that the caller is the owner of a resource, e.g. the driver a
    /// stored file belongs to. Roles grant nothing here.
    pub fn ensure_owner(&self, owner_id: UserId) -> Result<(), ApiError> {
        if self.id == owner_id {
            Ok(())
        } else {
            tracing::warn!(user_id = %self.id, owner_id = %owner_id, "Ownership check failed");
            Err(ApiError::Unauthorized)
        }
    }
}

impl From<User> for AuthUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
        }
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(ApiError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use uuid::Uuid;

    fn user(role: &str) -> AuthUser {
        AuthUser {
            id: Uuid::new_v4(),
            email: "u@test.io".to_string(),
            name: "Jan".to_string(),
            role: Role::from(role),
        }
    }

    #[test]
    fn test_ensure_owner() {
        let driver = user("kursant");
        assert!(driver.ensure_owner(driver.id).is_ok());
        assert_eq!(
            driver.ensure_owner(Uuid::new_v4()),
            Err(ApiError::Unauthorized)
        );
    }

    #[test]
    fn test_admin_is_not_an_owner() {
        let admin = user("admin");
        assert!(admin.is_admin());
        assert!(admin.ensure_owner(Uuid::new_v4()).is_err());
    }

    #[tokio::test]
    async fn test_extract_from_extensions() {
        let expected = user("instruktor");
        let mut request = Request::new(());
        request.extensions_mut().insert(expected.clone());
        let (mut parts, _) = request.into_parts();

        let extracted = AuthUser::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(extracted, expected);
    }

    #[tokio::test]
    async fn test_missing_user_is_unauthorized() {
        let (mut parts, _) = Request::new(()).into_parts();
        let result = AuthUser::from_request_parts(&mut parts, &()).await;
        assert_eq!(result, Err(ApiError::Unauthorized));
    }
}
