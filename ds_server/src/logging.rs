//! Structured logging configuration.
//!
//! The server logs through `tracing`. The `drive_school` library logs through
//! the `log` facade; `tracing-subscriber` forwards those records into the
//! same subscriber, so both end up in one stream.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info,sqlx=warn,hyper=warn";

/// Initialize structured logging.
///
/// Log levels are configurable through the `RUST_LOG` env var.
///
/// # Example
///
/// ```no_run
/// use ds_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log security event with structured data
///
/// # Arguments
///
/// * `event_type` - Type of security event, e.g. `failed_login`
/// * `user_id` - User the event concerns, when known
/// * `path` - Request path, when relevant
/// * `message` - Event message
///
/// # Example
///
/// ```
/// use ds_server::logging::log_security_event;
///
/// log_security_event(
///     "insufficient_role",
///     None,
///     Some("/api/users/admin/list"),
///     "Role does not satisfy access rule",
/// );
/// ```
pub fn log_security_event(
    event_type: &str,
    user_id: Option<uuid::Uuid>,
    path: Option<&str>,
    message: &str,
) {
    let user_id = user_id.map(|id| id.to_string());
    tracing::warn!(
        event_type = event_type,
        user_id = user_id.as_deref(),
        path = path,
        "SECURITY: {}",
        message
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_security_event() {
        // Just ensure it doesn't panic
        log_security_event(
            "test_event",
            Some(uuid::Uuid::new_v4()),
            Some("/api/x"),
            "Test message",
        );
        log_security_event("test_event", None, None, "Test message");
    }
}
