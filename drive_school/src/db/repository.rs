//! Repository trait definitions for testability and dependency injection.
//!
//! The credential store (`users`) and the session store (`sessions`) sit behind
//! these traits. [`PgUserRepository`] and [`PgSessionRepository`] are the
//! PostgreSQL implementations; `db::memory` holds the in-process ones.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::auth::{AuthError, AuthResult, NewUser, Role, Session, User, UserCredentials, UserId};

/// Trait for user/credential repository operations
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Check that the store answers
    async fn health_check(&self) -> AuthResult<()>;

    /// Create a new user. A duplicate email yields `AuthError::EmailTaken`.
    async fn create_user(&self, user: &NewUser) -> AuthResult<User>;

    /// Find the credential row for an exact email match
    async fn find_credentials_by_email(&self, email: &str) -> AuthResult<Option<UserCredentials>>;

    /// Find user by ID
    async fn find_by_id(&self, user_id: UserId) -> AuthResult<Option<User>>;

    /// Update user's last login timestamp
    async fn update_last_login(&self, user_id: UserId) -> AuthResult<()>;

    /// Delete a user. Returns whether a row existed; session rows are not touched.
    async fn delete_user(&self, user_id: UserId) -> AuthResult<bool>;
}

/// Trait for session repository operations.
///
/// Every method is a single statement; nothing here spans more than one row
/// operation atomically.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Persist a new session row
    async fn insert_session(&self, session: &Session) -> AuthResult<()>;

    /// Exact-match lookup by token
    async fn find_session(&self, token: &str) -> AuthResult<Option<Session>>;

    /// Delete one session. Returns whether a row existed.
    async fn delete_session(&self, token: &str) -> AuthResult<bool>;

    /// Delete every session of a user, returning the number removed
    async fn delete_user_sessions(&self, user_id: UserId) -> AuthResult<u64>;

    /// Delete sessions with `expires_at <= now`, returning the number removed
    async fn delete_expired(&self, now: DateTime<Utc>) -> AuthResult<u64>;

    /// Count session rows (live or expired) held by a user
    async fn count_user_sessions(&self, user_id: UserId) -> AuthResult<u64>;
}

const USER_COLUMNS: &str = "id, email, name, surname, phone, role, is_active, \
     needs_password_reset, branches, created_at, last_login";

fn user_from_row(row: &PgRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        name: row.try_get("name")?,
        surname: row.try_get("surname")?,
        phone: row.try_get("phone")?,
        role: Role::from(row.try_get::<String, _>("role")?),
        is_active: row.try_get("is_active")?,
        needs_password_reset: row.try_get("needs_password_reset")?,
        branches: row.try_get("branches")?,
        created_at: row.try_get("created_at")?,
        last_login: row.try_get("last_login")?,
    })
}

fn session_from_row(row: &PgRow) -> Result<Session, sqlx::Error> {
    Ok(Session {
        token: row.try_get("token")?,
        user_id: row.try_get("user_id")?,
        created_at: row.try_get("created_at")?,
        expires_at: row.try_get("expires_at")?,
    })
}

/// Default PostgreSQL implementation of `UserRepository`
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn health_check(&self) -> AuthResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn create_user(&self, user: &NewUser) -> AuthResult<User> {
        let sql = format!(
            "INSERT INTO users (email, password_hash, name, role) \
             VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        );
        let result = sqlx::query(&sql)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.name)
            .bind(user.role.as_str())
            .fetch_one(&self.pool)
            .await;

        match result {
            Ok(row) => Ok(user_from_row(&row)?),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(AuthError::EmailTaken)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_credentials_by_email(&self, email: &str) -> AuthResult<Option<UserCredentials>> {
        let row = sqlx::query(
            "SELECT id, email, name, role, password_hash, needs_password_reset
             FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        let Some(r) = row else {
            return Ok(None);
        };

        Ok(Some(UserCredentials {
            id: r.try_get("id")?,
            email: r.try_get("email")?,
            name: r.try_get("name")?,
            role: Role::from(r.try_get::<String, _>("role")?),
            password_hash: r.try_get("password_hash")?,
            needs_password_reset: r.try_get("needs_password_reset")?,
        }))
    }

    async fn find_by_id(&self, user_id: UserId) -> AuthResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(user_from_row).transpose()?)
    }

    async fn update_last_login(&self, user_id: UserId) -> AuthResult<()> {
        sqlx::query("UPDATE users SET last_login = NOW() WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_user(&self, user_id: UserId) -> AuthResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Default PostgreSQL implementation of `SessionRepository`
#[derive(Clone)]
pub struct PgSessionRepository {
    pool: PgPool,
}

impl PgSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    async fn insert_session(&self, session: &Session) -> AuthResult<()> {
        sqlx::query(
            "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(&session.token)
        .bind(session.user_id)
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_session(&self, token: &str) -> AuthResult<Option<Session>> {
        let row = sqlx::query(
            "SELECT token, user_id, created_at, expires_at FROM sessions WHERE token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(session_from_row).transpose()?)
    }

    async fn delete_session(&self, token: &str) -> AuthResult<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_user_sessions(&self, user_id: UserId) -> AuthResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> AuthResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn count_user_sessions(&self, user_id: UserId) -> AuthResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }
}
