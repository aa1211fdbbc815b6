//! HTTP API for the driving school scheduler.
//!
//! This module owns the session endpoints and the access middleware that
//! gates every other route. Resource handlers (calendars, events, drivers,
//! payments, reports) are supplied by the embedding application and mounted
//! behind the same middleware.
//!
//! # Modules
//!
//! - [`auth`]: register, login, logout, session introspection
//! - [`admin`]: admin-only session maintenance
//! - [`middleware`]: path-scoped access enforcement
//! - [`extract`]: the [`AuthUser`](extract::AuthUser) extractor
//! - [`cookie`]: the `session_token` cookie codec
//! - [`error`]: client-facing error responses
//! - [`request_id`]: request correlation ids
//!
//! # Endpoints Overview
//!
//! ## Authentication (no gate)
//! - `POST /api/auth/register` - Register and sign in
//! - `POST /api/auth/login` - Sign in, rotating prior sessions
//! - `POST /api/auth/logout` - Sign out
//! - `GET /api/auth/session` - Who am I
//!
//! ## Admin (admin role)
//! - `POST /api/users/admin/sessions/purge` - Delete expired sessions
//!
//! ## Health Check
//! - `GET /health` - Server health status
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use axum::{Router, routing::get};
//! use drive_school::auth::{AccessPolicy, AuthManager};
//! use drive_school::db::{MemorySessionRepository, MemoryUserRepository};
//! use ds_server::api::{AppState, cookie::SessionCookie, create_router};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let auth_manager = AuthManager::new(
//!     Arc::new(MemoryUserRepository::new()),
//!     Arc::new(MemorySessionRepository::new()),
//!     "",
//! );
//! let state = AppState {
//!     auth_manager: Arc::new(auth_manager),
//!     access_policy: Arc::new(AccessPolicy::default()),
//!     session_cookie: SessionCookie::new(false),
//! };
//!
//! let resources = Router::new().route("/api/drivers", get(|| async { "[]" }));
//! let app = create_router(state, resources);
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # CORS
//!
//! CORS is configured permissively for development. In production, configure
//! appropriate origins, methods, and headers.

pub mod admin;
pub mod auth;
pub mod cookie;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod request_id;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use drive_school::auth::{AccessPolicy, AuthManager};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use cookie::SessionCookie;

/// Application state shared across all HTTP handlers.
///
/// Cloned for each request (cheap due to Arc wrappers).
///
/// # Fields
///
/// - `auth_manager`: Registration, login, sessions
/// - `access_policy`: Path-scoped access table consulted by the middleware
/// - `session_cookie`: Cookie name and `Secure` flag
#[derive(Clone)]
pub struct AppState {
    pub auth_manager: Arc<AuthManager>,
    pub access_policy: Arc<AccessPolicy>,
    pub session_cookie: SessionCookie,
}

/// Create the complete router: auth endpoints, admin maintenance, health,
/// and the caller's resource routes, all behind the access middleware.
///
/// # Arguments
///
/// - `state`: Application state
/// - `resources`: Resource routes of the embedding application; they rely on
///   the middleware's gating and may take an
///   [`AuthUser`](extract::AuthUser) argument
///
/// # Endpoint Summary
///
/// ```text
/// GET  /health                            - Health check (public)
/// POST /api/auth/register                 - Register (public)
/// POST /api/auth/login                    - Login (public)
/// POST /api/auth/logout                   - Logout (public)
/// GET  /api/auth/session                  - Session introspection (public)
/// POST /api/users/admin/sessions/purge    - Purge expired sessions (admin)
/// ```
pub fn create_router(state: AppState, resources: Router<AppState>) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/session", get(auth::session));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/auth", auth_routes)
        .route(
            "/api/users/admin/sessions/purge",
            post(admin::purge_sessions),
        )
        .merge(resources)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::access_middleware,
        ))
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` when the credential store answers, `503 Service
/// Unavailable` otherwise.
///
/// ```bash
/// curl http://localhost:8080/health
/// # {"status":"healthy","version":"0.1.0","database":true,"timestamp":"2026-03-01T10:30:00Z"}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let db_healthy = match state.auth_manager.health_check().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            false
        }
    };

    let status_code = if db_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if db_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "database": db_healthy,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
