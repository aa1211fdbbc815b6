//! Authentication manager implementation.
//!
//! Composes the credential verifier and the session manager into the four
//! operations the HTTP layer exposes. Tokens come in and go out as plain
//! values; reading and writing cookies is the caller's job.

use std::sync::Arc;

use super::{
    credentials::CredentialVerifier,
    errors::{AuthError, AuthResult},
    models::{
        IssuedSession, LoginRequest, NewUser, RegisterRequest, Role, User, UserId, UserProfile,
        VerifiedUser,
    },
    password::PasswordHasher,
    session::SessionManager,
};
use crate::db::{SessionRepository, UserRepository};

/// Role given to self-registered accounts
pub const DEFAULT_ROLE: &str = "user";

/// Outcome of a successful login
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: VerifiedUser,
    pub session: IssuedSession,
}

/// Outcome of a successful registration
#[derive(Debug, Clone)]
pub struct RegisterOutcome {
    pub user: User,
    pub session: IssuedSession,
}

/// Authentication manager
#[derive(Clone)]
pub struct AuthManager {
    users: Arc<dyn UserRepository>,
    hasher: PasswordHasher,
    verifier: CredentialVerifier,
    sessions: SessionManager,
}

impl AuthManager {
    /// Create a new authentication manager
    ///
    /// # Arguments
    ///
    /// * `users` - Credential store
    /// * `sessions` - Session store
    /// * `pepper` - Server-side pepper for password hashing, empty to disable
    pub fn new(
        users: Arc<dyn UserRepository>,
        sessions: Arc<dyn SessionRepository>,
        pepper: impl Into<String>,
    ) -> Self {
        let hasher = PasswordHasher::new(pepper);
        Self {
            verifier: CredentialVerifier::new(users.clone(), hasher.clone()),
            sessions: SessionManager::new(sessions),
            users,
            hasher,
        }
    }

    /// Override the session lifetime (default 7 days)
    pub fn with_session_ttl(mut self, ttl: chrono::Duration) -> Self {
        self.sessions = self.sessions.with_ttl(ttl);
        self
    }

    /// Access the session manager
    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Register a new account and open a session for it.
    ///
    /// Unlike [`login`](Self::login) this does not clear other sessions of
    /// the user.
    ///
    /// # Errors
    ///
    /// * `AuthError::InvalidInput` - Empty email, password or name
    /// * `AuthError::EmailTaken` - Email already exists
    /// * `AuthError::Database` - Store write failed; if the session insert is
    ///   what failed, the new user row is removed again
    pub async fn register(&self, request: RegisterRequest) -> AuthResult<RegisterOutcome> {
        let email = request.email.trim();
        let name = request.name.trim();
        if email.is_empty() {
            return Err(AuthError::InvalidInput("email is required".to_string()));
        }
        if request.password.is_empty() {
            return Err(AuthError::InvalidInput("password is required".to_string()));
        }
        if name.is_empty() {
            return Err(AuthError::InvalidInput("name is required".to_string()));
        }

        if self.users.find_credentials_by_email(email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = self.hasher.hash(&request.password).await?;
        let user = self
            .users
            .create_user(&NewUser {
                email: email.to_string(),
                password_hash,
                name: name.to_string(),
                role: Role::from(DEFAULT_ROLE),
            })
            .await?;

        let session = match self.sessions.create(user.id).await {
            Ok(session) => session,
            Err(e) => {
                // Drop the account so the email can be registered again
                if let Err(cleanup) = self.users.delete_user(user.id).await {
                    log::error!(
                        "Failed to remove user {} after session error: {}",
                        user.id,
                        cleanup
                    );
                }
                return Err(e);
            }
        };
        log::info!("Registered user {}", user.id);

        Ok(RegisterOutcome { user, session })
    }

    /// Verify credentials, rotate the user's sessions and touch `last_login`.
    ///
    /// A failed `last_login` update is logged and ignored.
    ///
    /// # Errors
    ///
    /// * `AuthError::InvalidCredentials` - Unknown email or wrong password
    /// * `AuthError::Database` - Store failure
    pub async fn login(&self, request: LoginRequest) -> AuthResult<LoginOutcome> {
        let user = self.verifier.verify(&request.email, &request.password).await?;
        let session = self.sessions.rotate(user.id).await?;

        if let Err(e) = self.users.update_last_login(user.id).await {
            log::warn!("Failed to update last login for user {}: {}", user.id, e);
        }

        log::info!("User {} logged in", user.id);
        Ok(LoginOutcome { user, session })
    }

    /// Drop the session behind `token`. Unknown tokens are ignored.
    pub async fn logout(&self, token: &str) -> AuthResult<()> {
        self.sessions.destroy(token).await
    }

    /// Resolve a token to the full user record.
    ///
    /// # Errors
    ///
    /// * `AuthError::SessionNotFound` / `AuthError::SessionExpired`
    /// * `AuthError::UserNotFound` - Session outlived its user
    /// * `AuthError::Database` - Store failure
    pub async fn authenticate(&self, token: &str) -> AuthResult<User> {
        let user_id = self.sessions.validate(token).await?;
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Public profile for the owner of `token`. Performs no writes.
    pub async fn session_profile(&self, token: &str) -> AuthResult<UserProfile> {
        self.authenticate(token).await.map(UserProfile::from)
    }

    /// Look up a user by id
    pub async fn find_user(&self, user_id: UserId) -> AuthResult<Option<User>> {
        self.users.find_by_id(user_id).await
    }

    /// Check that the credential store answers
    pub async fn health_check(&self) -> AuthResult<()> {
        self.users.health_check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{NewUser, UserCredentials};
    use crate::db::{MemorySessionRepository, MemoryUserRepository};
    use async_trait::async_trait;

    /// Memory store whose `last_login` write always fails
    struct StuckLastLogin(MemoryUserRepository);

    #[async_trait]
    impl UserRepository for StuckLastLogin {
        async fn health_check(&self) -> AuthResult<()> {
            self.0.health_check().await
        }

        async fn create_user(&self, user: &NewUser) -> AuthResult<User> {
            self.0.create_user(user).await
        }

        async fn find_credentials_by_email(
            &self,
            email: &str,
        ) -> AuthResult<Option<UserCredentials>> {
            self.0.find_credentials_by_email(email).await
        }

        async fn find_by_id(&self, user_id: UserId) -> AuthResult<Option<User>> {
            self.0.find_by_id(user_id).await
        }

        async fn update_last_login(&self, _user_id: UserId) -> AuthResult<()> {
            Err(AuthError::Database(sqlx::Error::PoolTimedOut))
        }

        async fn delete_user(&self, user_id: UserId) -> AuthResult<bool> {
            self.0.delete_user(user_id).await
        }
    }

    fn manager() -> (AuthManager, Arc<MemorySessionRepository>) {
        let sessions = Arc::new(MemorySessionRepository::new());
        let manager = AuthManager::new(
            Arc::new(MemoryUserRepository::new()),
            sessions.clone(),
            "test_pepper_for_tests",
        );
        (manager, sessions)
    }

    fn register_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: "pw123456".to_string(),
            name: "Jan".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_opens_session() {
        let (auth, _) = manager();
        let outcome = auth.register(register_request("u@test.io")).await.unwrap();

        assert_eq!(outcome.user.role.as_str(), DEFAULT_ROLE);
        let profile = auth.session_profile(&outcome.session.token).await.unwrap();
        assert_eq!(profile.email, "u@test.io");
        assert_eq!(profile.name, "Jan");
    }

    #[tokio::test]
    async fn test_register_rejects_blank_fields() {
        let (auth, sessions) = manager();
        let mut request = register_request("   ");
        assert!(matches!(
            auth.register(request.clone()).await,
            Err(AuthError::InvalidInput(_))
        ));

        request.email = "u@test.io".to_string();
        request.password = String::new();
        assert!(matches!(
            auth.register(request).await,
            Err(AuthError::InvalidInput(_))
        ));
        assert!(sessions.is_empty());
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let (auth, _) = manager();
        auth.register(register_request("dup@test.io")).await.unwrap();
        let result = auth.register(register_request("dup@test.io")).await;
        assert!(matches!(result, Err(AuthError::EmailTaken)));
    }

    #[tokio::test]
    async fn test_login_sets_last_login() {
        let (auth, _) = manager();
        let registered = auth.register(register_request("u@test.io")).await.unwrap();
        assert!(registered.user.last_login.is_none());

        auth.login(LoginRequest {
            email: "u@test.io".to_string(),
            password: "pw123456".to_string(),
        })
        .await
        .unwrap();

        let user = auth.find_user(registered.user.id).await.unwrap().unwrap();
        assert!(user.last_login.is_some());
    }

    #[tokio::test]
    async fn test_authenticate_after_logout_fails() {
        let (auth, _) = manager();
        let outcome = auth.register(register_request("u@test.io")).await.unwrap();

        auth.logout(&outcome.session.token).await.unwrap();
        assert!(matches!(
            auth.authenticate(&outcome.session.token).await,
            Err(AuthError::SessionNotFound)
        ));
    }

    #[tokio::test]
    async fn test_login_survives_last_login_failure() {
        let sessions = Arc::new(MemorySessionRepository::new());
        let auth = AuthManager::new(
            Arc::new(StuckLastLogin(MemoryUserRepository::new())),
            sessions.clone(),
            "test_pepper_for_tests",
        );
        let registered = auth.register(register_request("u@test.io")).await.unwrap();

        let outcome = auth
            .login(LoginRequest {
                email: "u@test.io".to_string(),
                password: "pw123456".to_string(),
            })
            .await
            .expect("login must not depend on the last_login write");

        assert_eq!(outcome.user.id, registered.user.id);
        let user = auth.authenticate(&outcome.session.token).await.unwrap();
        assert_eq!(user.id, registered.user.id);
        assert!(user.last_login.is_none());
        assert_eq!(sessions.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_session_insert_removes_new_user() {
        let users = Arc::new(MemoryUserRepository::new());
        let auth = AuthManager::new(
            users.clone(),
            Arc::new(MemorySessionRepository::new()),
            "test_pepper_for_tests",
        )
        .with_session_ttl(chrono::Duration::days(100_000_000));

        let result = auth.register(register_request("u@test.io")).await;
        assert!(matches!(result, Err(AuthError::SessionTtlOutOfRange)));
        assert!(users.is_empty());

        // The email is free again, so a retry fails the same way
        let retry = auth.register(register_request("u@test.io")).await;
        assert!(matches!(retry, Err(AuthError::SessionTtlOutOfRange)));
    }
}
