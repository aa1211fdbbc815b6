//! Admin-namespace session maintenance.
//!
//! Mounted under `/api/users/admin`, so the access table already requires the
//! `admin` role before these handlers run.

use axum::{Json, extract::State};
use serde::Serialize;

use super::{AppState, error::ApiError, extract::AuthUser, request_id::RequestId};
use crate::metrics;

#[derive(Debug, Serialize)]
pub struct PurgeResponse {
    pub success: bool,
    pub purged: u64,
}

/// Delete every expired session row now instead of waiting for the
/// background purger.
///
/// # Response
///
/// ```json
/// { "success": true, "purged": 12 }
/// ```
pub async fn purge_sessions(
    State(state): State<AppState>,
    admin: AuthUser,
    request_id: RequestId,
) -> Result<Json<PurgeResponse>, ApiError> {
    let purged = state
        .auth_manager
        .sessions()
        .purge_expired()
        .await
        .map_err(|e| {
            tracing::error!(request_id = %request_id.as_str(), "Session purge failed: {}", e);
            ApiError::from(e)
        })?;

    metrics::sessions_purged_total(purged);
    tracing::info!(
        request_id = %request_id.as_str(),
        admin_id = %admin.id,
        purged = purged,
        "Expired sessions purged"
    );

    Ok(Json(PurgeResponse {
        success: true,
        purged,
    }))
}
