//! In-process repositories.
//!
//! Behave like the PostgreSQL ones (exact email match, unique email, no lazy
//! expiry) and back the test suites and local runs without a database.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

use super::repository::{SessionRepository, UserRepository};
use crate::auth::{AuthError, AuthResult, NewUser, Role, Session, User, UserCredentials, UserId};

#[derive(Clone)]
struct StoredUser {
    user: User,
    password_hash: String,
}

/// In-memory `UserRepository`
#[derive(Default)]
pub struct MemoryUserRepository {
    users: Mutex<HashMap<UserId, StoredUser>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Change a user's role, returning false for unknown ids
    pub fn set_role(&self, user_id: UserId, role: Role) -> bool {
        match self.users.lock().get_mut(&user_id) {
            Some(stored) => {
                stored.user.role = role;
                true
            }
            None => false,
        }
    }

    /// Raise or clear the password-reset flag
    pub fn set_needs_password_reset(&self, user_id: UserId, value: bool) -> bool {
        match self.users.lock().get_mut(&user_id) {
            Some(stored) => {
                stored.user.needs_password_reset = value;
                true
            }
            None => false,
        }
    }

    /// Replace a user's branch list
    pub fn set_branches(&self, user_id: UserId, branches: Vec<String>) -> bool {
        match self.users.lock().get_mut(&user_id) {
            Some(stored) => {
                stored.user.branches = branches;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.users.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn health_check(&self) -> AuthResult<()> {
        Ok(())
    }

    async fn create_user(&self, new_user: &NewUser) -> AuthResult<User> {
        let mut users = self.users.lock();
        if users.values().any(|s| s.user.email == new_user.email) {
            return Err(AuthError::EmailTaken);
        }

        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email.clone(),
            name: new_user.name.clone(),
            surname: None,
            phone: None,
            role: new_user.role.clone(),
            is_active: true,
            needs_password_reset: false,
            branches: Vec::new(),
            created_at: Utc::now(),
            last_login: None,
        };
        users.insert(
            user.id,
            StoredUser {
                user: user.clone(),
                password_hash: new_user.password_hash.clone(),
            },
        );
        Ok(user)
    }

    async fn find_credentials_by_email(&self, email: &str) -> AuthResult<Option<UserCredentials>> {
        let users = self.users.lock();
        Ok(users
            .values()
            .find(|s| s.user.email == email)
            .map(|s| UserCredentials {
                id: s.user.id,
                email: s.user.email.clone(),
                name: s.user.name.clone(),
                role: s.user.role.clone(),
                password_hash: s.password_hash.clone(),
                needs_password_reset: s.user.needs_password_reset,
            }))
    }

    async fn find_by_id(&self, user_id: UserId) -> AuthResult<Option<User>> {
        let users = self.users.lock();
        Ok(users.get(&user_id).map(|s| s.user.clone()))
    }

    async fn update_last_login(&self, user_id: UserId) -> AuthResult<()> {
        if let Some(stored) = self.users.lock().get_mut(&user_id) {
            stored.user.last_login = Some(Utc::now());
        }
        Ok(())
    }

    async fn delete_user(&self, user_id: UserId) -> AuthResult<bool> {
        Ok(self.users.lock().remove(&user_id).is_some())
    }
}

/// In-memory `SessionRepository`
#[derive(Default)]
pub struct MemorySessionRepository {
    sessions: Mutex<HashMap<String, Session>>,
}

impl MemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total rows held, expired ones included
    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SessionRepository for MemorySessionRepository {
    async fn insert_session(&self, session: &Session) -> AuthResult<()> {
        self.sessions
            .lock()
            .insert(session.token.clone(), session.clone());
        Ok(())
    }

    async fn find_session(&self, token: &str) -> AuthResult<Option<Session>> {
        Ok(self.sessions.lock().get(token).cloned())
    }

    async fn delete_session(&self, token: &str) -> AuthResult<bool> {
        Ok(self.sessions.lock().remove(token).is_some())
    }

    async fn delete_user_sessions(&self, user_id: UserId) -> AuthResult<u64> {
        let mut sessions = self.sessions.lock();
        let before = sessions.len();
        sessions.retain(|_, s| s.user_id != user_id);
        Ok((before - sessions.len()) as u64)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> AuthResult<u64> {
        let mut sessions = self.sessions.lock();
        let before = sessions.len();
        sessions.retain(|_, s| s.is_live_at(now));
        Ok((before - sessions.len()) as u64)
    }

    async fn count_user_sessions(&self, user_id: UserId) -> AuthResult<u64> {
        let sessions = self.sessions.lock();
        Ok(sessions.values().filter(|s| s.user_id == user_id).count() as u64)
    }
}
