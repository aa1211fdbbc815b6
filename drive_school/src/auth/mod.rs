//! Authentication module providing registration, login, session management
//! and path-scoped access rules.
//!
//! This module implements:
//! - Argon2id password hashing with an optional server-side pepper
//! - Opaque, store-backed session tokens (7-day expiry, checked on read)
//! - Session rotation on login
//! - A routing table deciding which paths need a session or a role
//!
//! ## Example
//!
//! ```no_run
//! use drive_school::auth::{AuthManager, LoginRequest, RegisterRequest};
//! use drive_school::db::{Database, DatabaseConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::new(&DatabaseConfig::development()).await?;
//!     let (users, sessions) = db.repositories();
//!     let auth = AuthManager::new(Arc::new(users), Arc::new(sessions), "secret_pepper");
//!
//!     auth.register(RegisterRequest {
//!         email: "jan@example.com".to_string(),
//!         password: "pw123456".to_string(),
//!         name: "Jan".to_string(),
//!     })
//!     .await?;
//!
//!     let login = auth
//!         .login(LoginRequest {
//!             email: "jan@example.com".to_string(),
//!             password: "pw123456".to_string(),
//!         })
//!         .await?;
//!     println!("Session expires at {}", login.session.expires_at);
//!     Ok(())
//! }
//! ```

pub mod access;
pub mod credentials;
pub mod errors;
pub mod manager;
pub mod models;
pub mod password;
pub mod session;

pub use access::{AccessPolicy, AccessRule, DenyMode, Requirement};
pub use credentials::CredentialVerifier;
pub use errors::{AuthError, AuthResult};
pub use manager::{AuthManager, DEFAULT_ROLE, LoginOutcome, RegisterOutcome};
pub use models::{
    IssuedSession, LoginRequest, NewUser, RegisterRequest, Role, Session, User, UserCredentials,
    UserId, UserProfile, VerifiedUser,
};
pub use password::PasswordHasher;
pub use session::{DEFAULT_SESSION_TTL_DAYS, SessionManager};
