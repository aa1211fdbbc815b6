//! Authentication API handlers.
//!
//! This module provides the four session endpoints:
//! - Registration, which opens a first session for the new account
//! - Login, which rotates every prior session of the user
//! - Logout, idempotent
//! - Session introspection ("who am I"), read-only
//!
//! The session token travels in the `session_token` cookie; see
//! [`SessionCookie`](super::cookie::SessionCookie).
//!
//! # Examples
//!
//! Register a new user:
//! ```bash
//! curl -i -X POST http://localhost:8080/api/auth/register \
//!   -H "Content-Type: application/json" \
//!   -d '{"email": "u@test.io", "password": "pw123456", "name": "Jan"}'
//! ```
//!
//! Ask who the cookie belongs to:
//! ```bash
//! curl -b "session_token=<token>" http://localhost:8080/api/auth/session
//! ```

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
};
use drive_school::auth::{
    AuthError, IssuedSession, LoginRequest, RegisterRequest, Role, UserId, UserProfile,
};
use serde::{Deserialize, Serialize};

use super::{AppState, error::ApiError};
use crate::{logging::log_security_event, metrics};

#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterPayload {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: UserId,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    pub need_password_reset: bool,
    pub user: UserSummary,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub user: UserSummary,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct SessionUser {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub branches: Vec<String>,
}

impl From<UserProfile> for SessionUser {
    fn from(profile: UserProfile) -> Self {
        Self {
            id: profile.id,
            email: profile.email,
            name: profile.name,
            role: profile.role,
            branches: profile.branches,
        }
    }
}

/// Body of the session endpoint; `user` is `null` when nobody is signed in
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: Option<SessionUser>,
}

/// Register a new account and sign it in.
///
/// # Request Body
///
/// ```json
/// { "email": "u@test.io", "password": "pw123456", "name": "Jan" }
/// ```
///
/// # Response
///
/// `200 OK` with the session cookie set:
/// ```json
/// { "success": true, "user": { "id": "…", "email": "u@test.io", "name": "Jan" } }
/// ```
///
/// # Errors
///
/// - `400 Bad Request` `{"error":"Registration failed"}` for every failure:
///   taken email, blank fields, malformed body or a store error. The cause
///   is only logged.
///
/// Registration does not clear other sessions of the account.
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterPayload>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload.map_err(|rejection| {
        tracing::debug!("Rejected registration body: {}", rejection);
        metrics::registrations_total(false);
        ApiError::RegistrationFailed
    })?;

    let request = RegisterRequest {
        email: payload.email,
        password: payload.password,
        name: payload.name,
    };

    match state.auth_manager.register(request).await {
        Ok(outcome) => {
            metrics::registrations_total(true);
            let cookie = issue_cookie(&state, &outcome.session)?;
            let body = RegisterResponse {
                success: true,
                user: UserSummary {
                    id: outcome.user.id,
                    email: outcome.user.email,
                    name: outcome.user.name,
                },
            };
            Ok(([(SET_COOKIE, cookie)], Json(body)).into_response())
        }
        Err(e) => {
            metrics::registrations_total(false);
            if e.is_internal() {
                tracing::error!("Registration failed: {}", e);
            } else {
                tracing::info!("Registration rejected: {}", e);
            }
            Err(ApiError::RegistrationFailed)
        }
    }
}

/// Verify credentials and start a fresh session.
///
/// Every session the user held before this call stops working.
///
/// # Request Body
///
/// ```json
/// { "email": "u@test.io", "password": "pw123456" }
/// ```
///
/// # Response
///
/// `200 OK` with the session cookie set:
/// ```json
/// {
///   "success": true,
///   "needPasswordReset": false,
///   "user": { "id": "…", "email": "u@test.io", "name": "Jan" }
/// }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized` `{"error":"Invalid credentials"}`: unknown email or
///   wrong password, indistinguishable to the client
/// - `400 Bad Request`: malformed body
/// - `500 Internal Server Error`: store failure
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginPayload>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload.map_err(|rejection| {
        tracing::debug!("Rejected login body: {}", rejection);
        ApiError::ValidationFailed
    })?;

    let request = LoginRequest {
        email: payload.email,
        password: payload.password,
    };

    match state.auth_manager.login(request).await {
        Ok(outcome) => {
            metrics::login_attempts_total(true);
            let cookie = issue_cookie(&state, &outcome.session)?;
            let body = LoginResponse {
                success: true,
                need_password_reset: outcome.user.needs_password_reset,
                user: UserSummary {
                    id: outcome.user.id,
                    email: outcome.user.email,
                    name: outcome.user.name,
                },
            };
            Ok(([(SET_COOKIE, cookie)], Json(body)).into_response())
        }
        Err(AuthError::InvalidCredentials) => {
            metrics::login_attempts_total(false);
            log_security_event("failed_login", None, Some("/api/auth/login"), "Invalid credentials");
            Err(ApiError::InvalidCredentials)
        }
        Err(e) => {
            metrics::login_attempts_total(false);
            tracing::error!("Login failed: {}", e);
            Err(ApiError::from(e))
        }
    }
}

/// Drop the caller's session and clear the cookie.
///
/// Always `200 {"success":true}`, with or without a cookie, unless the store
/// fails while deleting; the cookie is still cleared in that case.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(token) = state.session_cookie.read(&headers) else {
        return Json(LogoutResponse { success: true }).into_response();
    };

    let clear = [(SET_COOKIE, state.session_cookie.clear())];
    match state.auth_manager.logout(&token).await {
        Ok(()) => (clear, Json(LogoutResponse { success: true })).into_response(),
        Err(e) => {
            tracing::error!("Logout failed: {}", e);
            (clear, ApiError::from(e)).into_response()
        }
    }
}

/// Describe the user behind the session cookie.
///
/// Performs no writes, so clients may call it on every page load.
///
/// # Response
///
/// - `200 OK` `{"user":{"id","email","name","role","branches"}}`
/// - `401 Unauthorized` `{"user":null}`: no cookie, unknown or expired token,
///   or the account is gone
/// - `500 Internal Server Error`: store failure
pub async fn session(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let anonymous = (
        StatusCode::UNAUTHORIZED,
        Json(SessionResponse { user: None }),
    );

    let Some(token) = state.session_cookie.read(&headers) else {
        return anonymous.into_response();
    };

    match state.auth_manager.session_profile(&token).await {
        Ok(profile) => Json(SessionResponse {
            user: Some(profile.into()),
        })
        .into_response(),
        Err(e) if e.is_session_rejection() => anonymous.into_response(),
        Err(e) => {
            tracing::error!("Session lookup failed: {}", e);
            ApiError::from(e).into_response()
        }
    }
}

fn issue_cookie(
    state: &AppState,
    session: &IssuedSession,
) -> Result<axum::http::HeaderValue, ApiError> {
    state.session_cookie.issue(session).map_err(|e| {
        tracing::error!("Failed to encode session cookie: {}", e);
        ApiError::StoreFailure
    })
}
