//! Email + password verification against the credential store.

use std::sync::Arc;

use super::{
    errors::{AuthError, AuthResult},
    models::VerifiedUser,
    password::PasswordHasher,
};
use crate::db::UserRepository;

/// Checks an email/password pair. Read-only.
#[derive(Clone)]
pub struct CredentialVerifier {
    users: Arc<dyn UserRepository>,
    hasher: PasswordHasher,
}

impl CredentialVerifier {
    pub fn new(users: Arc<dyn UserRepository>, hasher: PasswordHasher) -> Self {
        Self { users, hasher }
    }

    /// Verify credentials.
    ///
    /// Unknown email, empty email and wrong password all return
    /// `AuthError::InvalidCredentials`. An unknown email still pays for one
    /// hash verification so the two paths cost roughly the same.
    pub async fn verify(&self, email: &str, password: &str) -> AuthResult<VerifiedUser> {
        if email.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let Some(credentials) = self.users.find_credentials_by_email(email).await? else {
            self.hasher.verify_dummy(password).await?;
            return Err(AuthError::InvalidCredentials);
        };

        if !self
            .hasher
            .verify(password, &credentials.password_hash)
            .await?
        {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(VerifiedUser {
            id: credentials.id,
            email: credentials.email,
            name: credentials.name,
            role: credentials.role,
            needs_password_reset: credentials.needs_password_reset,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{NewUser, Role};
    use crate::db::MemoryUserRepository;

    async fn verifier_with(email: &str, password: &str) -> (CredentialVerifier, Arc<MemoryUserRepository>) {
        let users = Arc::new(MemoryUserRepository::new());
        let hasher = PasswordHasher::new("test_pepper_for_tests");
        let hash = hasher.hash(password).await.unwrap();
        users
            .create_user(&NewUser {
                email: email.to_string(),
                password_hash: hash,
                name: "Jan".to_string(),
                role: Role::Instruktor,
            })
            .await
            .unwrap();
        (CredentialVerifier::new(users.clone(), hasher), users)
    }

    #[tokio::test]
    async fn test_correct_password() {
        let (verifier, _) = verifier_with("u@test.io", "pw123456").await;
        let user = verifier.verify("u@test.io", "pw123456").await.unwrap();
        assert_eq!(user.email, "u@test.io");
        assert_eq!(user.name, "Jan");
        assert_eq!(user.role, Role::Instruktor);
        assert!(!user.needs_password_reset);
    }

    #[tokio::test]
    async fn test_reset_flag_is_reported() {
        let (verifier, users) = verifier_with("r@test.io", "pw123456").await;
        let id = verifier.verify("r@test.io", "pw123456").await.unwrap().id;
        users.set_needs_password_reset(id, true);

        let user = verifier.verify("r@test.io", "pw123456").await.unwrap();
        assert!(user.needs_password_reset);
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_email_look_the_same() {
        let (verifier, _) = verifier_with("u@test.io", "pw123456").await;

        let wrong = verifier.verify("u@test.io", "nope").await.unwrap_err();
        let unknown = verifier.verify("ghost@test.io", "pw123456").await.unwrap_err();

        assert!(matches!(wrong, AuthError::InvalidCredentials));
        assert!(matches!(unknown, AuthError::InvalidCredentials));
        assert_eq!(wrong.client_message(), unknown.client_message());
    }

    #[tokio::test]
    async fn test_empty_email_rejected() {
        let (verifier, _) = verifier_with("u@test.io", "pw123456").await;
        let err = verifier.verify("", "pw123456").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }
}
