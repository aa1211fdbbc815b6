//! Session manager: the only writer of the session store.
//!
//! Tokens are 32 bytes from the thread-local CSPRNG, hex encoded. They are opaque
//! lookup keys and are never decoded. Expiry is checked when a token is read;
//! expired rows stay in the store until [`SessionManager::purge_expired`] runs.
//!
//! [`SessionManager::rotate`] is two statements (delete all, insert one) with
//! no transaction around them. Two logins for the same user racing each other
//! may leave two live sessions, or one may delete the row the other just
//! inserted.

use std::sync::Arc;

use chrono::{Duration, Utc};
use rand::RngCore;

use super::{
    errors::{AuthError, AuthResult},
    models::{IssuedSession, Session, UserId},
};
use crate::db::SessionRepository;

/// Default session lifetime
pub const DEFAULT_SESSION_TTL_DAYS: i64 = 7;

/// Random bytes per token (256 bits)
const TOKEN_BYTES: usize = 32;

/// Creates, rotates, validates and deletes session tokens
#[derive(Clone)]
pub struct SessionManager {
    sessions: Arc<dyn SessionRepository>,
    ttl: Duration,
}

impl SessionManager {
    /// Create a manager with the default 7-day lifetime
    pub fn new(sessions: Arc<dyn SessionRepository>) -> Self {
        Self {
            sessions,
            ttl: Duration::days(DEFAULT_SESSION_TTL_DAYS),
        }
    }

    /// Override the session lifetime
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Issue a new session for `user_id` without touching existing ones
    ///
    /// # Errors
    ///
    /// * `AuthError::SessionTtlOutOfRange` - `now + ttl` overflows
    /// * `AuthError::Database` - Store write failed
    pub async fn create(&self, user_id: UserId) -> AuthResult<IssuedSession> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or(AuthError::SessionTtlOutOfRange)?;
        let session = Session {
            token: generate_token(),
            user_id,
            created_at: now,
            expires_at,
        };

        self.sessions.insert_session(&session).await?;
        log::debug!("Session created for user {}", user_id);

        Ok(IssuedSession {
            token: session.token,
            expires_at: session.expires_at,
        })
    }

    /// Delete every session of `user_id`, then issue a fresh one
    pub async fn rotate(&self, user_id: UserId) -> AuthResult<IssuedSession> {
        let removed = self.sessions.delete_user_sessions(user_id).await?;
        if removed > 0 {
            log::debug!("Rotated out {} session(s) for user {}", removed, user_id);
        }
        self.create(user_id).await
    }

    /// Resolve a token to its owner.
    ///
    /// # Errors
    ///
    /// * `AuthError::SessionNotFound` - No row for this token
    /// * `AuthError::SessionExpired` - Row exists but `expires_at <= now`
    pub async fn validate(&self, token: &str) -> AuthResult<UserId> {
        let session = self
            .sessions
            .find_session(token)
            .await?
            .ok_or(AuthError::SessionNotFound)?;

        if !session.is_live_at(Utc::now()) {
            return Err(AuthError::SessionExpired);
        }

        Ok(session.user_id)
    }

    /// Delete a session. Missing tokens are not an error.
    pub async fn destroy(&self, token: &str) -> AuthResult<()> {
        if self.sessions.delete_session(token).await? {
            log::debug!("Session destroyed");
        }
        Ok(())
    }

    /// Delete every expired session row, returning how many were removed
    pub async fn purge_expired(&self) -> AuthResult<u64> {
        let purged = self.sessions.delete_expired(Utc::now()).await?;
        if purged > 0 {
            log::info!("Purged {} expired session(s)", purged);
        }
        Ok(purged)
    }

    /// Number of rows currently held for `user_id`, expired ones included
    pub async fn session_count(&self, user_id: UserId) -> AuthResult<u64> {
        self.sessions.count_user_sessions(user_id).await
    }
}

fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemorySessionRepository;
    use uuid::Uuid;

    fn manager() -> (SessionManager, Arc<MemorySessionRepository>) {
        let repo = Arc::new(MemorySessionRepository::new());
        (SessionManager::new(repo.clone()), repo)
    }

    #[test]
    fn test_token_shape() {
        let token = generate_token();
        assert_eq!(token.len(), TOKEN_BYTES * 2);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, generate_token());
    }

    #[tokio::test]
    async fn test_create_sets_seven_day_expiry() {
        let (manager, _) = manager();
        let before = Utc::now();
        let issued = manager.create(Uuid::new_v4()).await.unwrap();
        let after = Utc::now();

        assert!(issued.expires_at >= before + Duration::days(7));
        assert!(issued.expires_at <= after + Duration::days(7));
    }

    #[tokio::test]
    async fn test_oversized_ttl_is_an_error() {
        let (manager, repo) = manager();
        let manager = manager.with_ttl(Duration::days(100_000_000));

        let result = manager.create(Uuid::new_v4()).await;
        assert!(matches!(result, Err(AuthError::SessionTtlOutOfRange)));
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn test_validate_returns_owner() {
        let (manager, _) = manager();
        let user_id = Uuid::new_v4();
        let issued = manager.create(user_id).await.unwrap();
        assert_eq!(manager.validate(&issued.token).await.unwrap(), user_id);
    }

    #[tokio::test]
    async fn test_validate_unknown_token() {
        let (manager, _) = manager();
        let result = manager.validate("deadbeef").await;
        assert!(matches!(result, Err(AuthError::SessionNotFound)));
    }

    #[tokio::test]
    async fn test_expired_session_is_rejected_but_kept() {
        let (manager, repo) = manager();
        let manager = manager.with_ttl(Duration::seconds(-1));
        let issued = manager.create(Uuid::new_v4()).await.unwrap();

        let result = manager.validate(&issued.token).await;
        assert!(matches!(result, Err(AuthError::SessionExpired)));
        assert_eq!(repo.len(), 1, "validate must not delete the row");
    }

    #[tokio::test]
    async fn test_rotate_leaves_exactly_one_session() {
        let (manager, _) = manager();
        let user_id = Uuid::new_v4();
        let first = manager.create(user_id).await.unwrap();
        let second = manager.create(user_id).await.unwrap();

        let rotated = manager.rotate(user_id).await.unwrap();

        assert_eq!(manager.session_count(user_id).await.unwrap(), 1);
        assert!(manager.validate(&first.token).await.is_err());
        assert!(manager.validate(&second.token).await.is_err());
        assert_eq!(manager.validate(&rotated.token).await.unwrap(), user_id);
    }

    #[tokio::test]
    async fn test_rotate_does_not_touch_other_users() {
        let (manager, _) = manager();
        let other = Uuid::new_v4();
        let kept = manager.create(other).await.unwrap();

        manager.rotate(Uuid::new_v4()).await.unwrap();
        assert_eq!(manager.validate(&kept.token).await.unwrap(), other);
    }

    #[tokio::test]
    async fn test_destroy_is_idempotent() {
        let (manager, _) = manager();
        let issued = manager.create(Uuid::new_v4()).await.unwrap();

        manager.destroy(&issued.token).await.unwrap();
        manager.destroy(&issued.token).await.unwrap();
        assert!(matches!(
            manager.validate(&issued.token).await,
            Err(AuthError::SessionNotFound)
        ));
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let (manager, repo) = manager();
        let user_id = Uuid::new_v4();
        manager
            .clone()
            .with_ttl(Duration::seconds(-10))
            .create(user_id)
            .await
            .unwrap();
        let live = manager.create(user_id).await.unwrap();

        assert_eq!(manager.purge_expired().await.unwrap(), 1);
        assert_eq!(repo.len(), 1);
        assert!(manager.validate(&live.token).await.is_ok());
    }
}
