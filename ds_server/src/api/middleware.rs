//! Access middleware for gated path namespaces.
//!
//! Runs ahead of every route. The request path is looked up in the
//! [`AccessPolicy`](drive_school::auth::AccessPolicy) table; the first
//! matching rule decides what the caller must present. Paths matching no rule
//! pass straight through.
//!
//! # Usage
//!
//! ```rust,no_run
//! use axum::{Router, routing::get, middleware};
//! # use ds_server::api::middleware::access_middleware;
//! # use ds_server::api::AppState;
//! # async fn handler() {}
//! # let state: AppState = unimplemented!();
//!
//! let app: Router = Router::new()
//!     .route("/api/drivers", get(handler))
//!     .layer(middleware::from_fn_with_state(state.clone(), access_middleware))
//!     .with_state(state);
//! # let _ = app;
//! ```
//!
//! # Extracting the user
//!
//! On success the resolved [`AuthUser`] is stored in request extensions:
//!
//! ```rust,no_run
//! use ds_server::api::extract::AuthUser;
//!
//! async fn protected_handler(user: AuthUser) -> String {
//!     format!("Authenticated as {}", user.id)
//! }
//! # let _ = protected_handler;
//! ```

use axum::{
    extract::{OriginalUri, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use drive_school::auth::{AccessRule, DenyMode, Requirement, UserId};

use super::{AppState, error::ApiError, extract::AuthUser};
use crate::{logging::log_security_event, metrics};

/// Why a gated request was turned away
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Denial {
    NoSession,
    InvalidSession,
    InsufficientRole(UserId),
    Fault,
}

impl Denial {
    fn label(&self) -> &'static str {
        match self {
            Denial::NoSession => "no_session",
            Denial::InvalidSession => "invalid_session",
            Denial::InsufficientRole(_) => "insufficient_role",
            Denial::Fault => "fault",
        }
    }
}

/// Enforce the access table on the incoming request.
///
/// # Behavior
///
/// - **Ungated / public path**: forwarded unchanged
/// - **No cookie, unknown or expired token, deleted user**: denied
/// - **Role rule not satisfied**: denied; the handler never runs
/// - **Store fault**: denied with a generic "Verification failed"
/// - **Success**: [`AuthUser`] inserted into extensions, request forwarded
///
/// Denials on JSON rules answer `401 {"error": ...}`; denials on redirect
/// rules answer `307` to the rule's location.
pub async fn access_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request
        .extensions()
        .get::<OriginalUri>()
        .map(|uri| uri.path())
        .unwrap_or_else(|| request.uri().path())
        .to_string();
    let Some(rule) = state.access_policy.resolve(&path) else {
        return next.run(request).await;
    };
    if rule.requirement == Requirement::Public {
        return next.run(request).await;
    }

    let resolved = resolve_user(&state, request.headers(), rule).await;
    match resolved {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(denial) => deny(rule, denial, &path),
    }
}

async fn resolve_user(
    state: &AppState,
    headers: &HeaderMap,
    rule: &AccessRule,
) -> Result<AuthUser, Denial> {
    let token = state
        .session_cookie
        .read(headers)
        .ok_or(Denial::NoSession)?;

    let user = state
        .auth_manager
        .authenticate(&token)
        .await
        .map_err(|e| {
            if e.is_session_rejection() {
                Denial::InvalidSession
            } else {
                tracing::error!(rule = rule.name, "Session verification failed: {}", e);
                Denial::Fault
            }
        })?;

    if !rule.permits(&user.role) {
        return Err(Denial::InsufficientRole(user.id));
    }

    Ok(AuthUser::from(user))
}

fn deny(rule: &AccessRule, denial: Denial, path: &str) -> Response {
    metrics::access_denied_total(rule.name, denial.label());

    match denial {
        Denial::NoSession => {
            tracing::debug!(rule = rule.name, path = path, "No session cookie");
        }
        Denial::InvalidSession => {
            log_security_event("invalid_session", None, Some(path), "Unknown or expired session");
        }
        Denial::InsufficientRole(user_id) => {
            log_security_event(
                "insufficient_role",
                Some(user_id),
                Some(path),
                "Role does not satisfy access rule",
            );
        }
        Denial::Fault => {}
    }

    match rule.deny {
        // Page rules redirect on store faults too; only JSON rules report them
        DenyMode::Redirect(location) => Redirect::temporary(location).into_response(),
        DenyMode::Json => match denial {
            Denial::Fault => ApiError::VerificationFailed.into_response(),
            _ => ApiError::Unauthorized.into_response(),
        },
    }
}
