//! Argon2id password hashing.
//!
//! Hashing and verification are deliberately slow, so both run on tokio's
//! blocking pool instead of the async workers.

use std::sync::{Arc, OnceLock};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString, rand_core::OsRng},
};

use super::errors::{AuthError, AuthResult};

/// Compared against when the email is unknown, so that path still pays for
/// one full verification.
const DUMMY_PASSWORD: &str = "dummy-password-for-unknown-accounts";

/// Argon2id hasher with an optional server-side pepper
#[derive(Clone, Default)]
pub struct PasswordHasher {
    pepper: String,
    dummy_hash: Arc<OnceLock<String>>,
}

impl PasswordHasher {
    /// Create a hasher. An empty pepper disables peppering.
    pub fn new(pepper: impl Into<String>) -> Self {
        Self {
            pepper: pepper.into(),
            dummy_hash: Arc::new(OnceLock::new()),
        }
    }

    /// Hash a password into a PHC string (algorithm, params and salt included)
    pub async fn hash(&self, password: &str) -> AuthResult<String> {
        let hasher = self.clone();
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hasher.hash_blocking(&password))
            .await
            .map_err(|_| AuthError::HashingFailed)?
    }

    /// Verify a password against a stored PHC string.
    ///
    /// A stored hash that cannot be parsed counts as a mismatch.
    pub async fn verify(&self, password: &str, hash: &str) -> AuthResult<bool> {
        let hasher = self.clone();
        let password = password.to_string();
        let hash = hash.to_string();
        tokio::task::spawn_blocking(move || Ok(hasher.verify_blocking(&password, &hash)))
            .await
            .map_err(|_| AuthError::HashingFailed)?
    }

    /// Burn one verification against a fixed hash. Always returns `false`.
    pub async fn verify_dummy(&self, password: &str) -> AuthResult<bool> {
        let hasher = self.clone();
        let password = password.to_string();
        tokio::task::spawn_blocking(move || {
            let hash = match hasher.dummy_hash.get() {
                Some(hash) => hash.clone(),
                None => {
                    let hash = hasher.hash_blocking(DUMMY_PASSWORD)?;
                    hasher.dummy_hash.get_or_init(|| hash).clone()
                }
            };
            hasher.verify_blocking(&password, &hash);
            Ok(false)
        })
        .await
        .map_err(|_| AuthError::HashingFailed)?
    }

    fn peppered(&self, password: &str) -> String {
        format!("{}{}", password, self.pepper)
    }

    fn hash_blocking(&self, password: &str) -> AuthResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(self.peppered(password).as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|_| AuthError::HashingFailed)
    }

    fn verify_blocking(&self, password: &str, hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            return false;
        };
        Argon2::default()
            .verify_password(self.peppered(password).as_bytes(), &parsed)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_and_verify() {
        let hasher = PasswordHasher::new("pepper");
        let hash = hasher.hash("pw123456").await.unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("pw123456", &hash).await.unwrap());
        assert!(!hasher.verify("pw1234567", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_same_password_different_salts() {
        let hasher = PasswordHasher::default();
        let a = hasher.hash("same").await.unwrap();
        let b = hasher.hash("same").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_pepper_is_part_of_the_hash() {
        let hash = PasswordHasher::new("one").hash("secret").await.unwrap();
        let other = PasswordHasher::new("two");
        assert!(!other.verify("secret", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_malformed_hash_is_a_mismatch() {
        let hasher = PasswordHasher::default();
        assert!(!hasher.verify("secret", "not-a-phc-string").await.unwrap());
    }

    #[tokio::test]
    async fn test_dummy_never_matches() {
        let hasher = PasswordHasher::default();
        assert!(!hasher.verify_dummy(DUMMY_PASSWORD).await.unwrap());
        assert!(!hasher.verify_dummy("anything").await.unwrap());
    }
}
