//! # Drive School
//!
//! Session authentication core of the driving school scheduler.
//!
//! Calendars, events, drivers, payments and reports are plain CRUD handlers
//! living elsewhere; they all sit behind the pieces in this crate:
//!
//! - [`auth`]: credential verification, session lifecycle, the access table
//! - [`db`]: PostgreSQL pool plus the credential and session repositories
//!
//! ## Example
//!
//! ```
//! use drive_school::auth::{AccessPolicy, Role};
//!
//! let policy = AccessPolicy::default();
//! let rule = policy.resolve("/api/users/admin/list").unwrap();
//! assert!(rule.permits(&Role::Admin));
//! assert!(!rule.permits(&Role::Instruktor));
//! ```

pub mod auth;
pub mod db;

pub use auth::{AuthError, AuthManager, AuthResult};
