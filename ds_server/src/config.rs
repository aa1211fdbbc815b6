//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use drive_school::db::DatabaseConfig;
use std::net::SocketAddr;

/// Default bind address
pub const DEFAULT_BIND: &str = "127.0.0.1:8080";

/// Minimum pepper length when one is configured
pub const MIN_PEPPER_LEN: usize = 16;

/// Longest accepted session lifetime in days
pub const MAX_SESSION_TTL_DAYS: i64 = 3650;

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Security configuration
    pub security: SecurityConfig,
    /// Session lifetime and maintenance
    pub session: SessionConfig,
    /// Prometheus exporter address, disabled when unset
    pub metrics_bind: Option<SocketAddr>,
}

/// Security-related configuration
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// Password hashing pepper, empty when not configured
    pub password_pepper: String,
    /// `APP_ENV=production`; turns on the `Secure` cookie attribute
    pub production: bool,
}

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Session lifetime in days
    pub ttl_days: i64,
    /// Seconds between expired-session purges, 0 disables the purger
    pub purge_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_days: drive_school::auth::DEFAULT_SESSION_TTL_DAYS,
            purge_interval_secs: 3600,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `database_url_override` - Optional database URL override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if a variable is set but cannot be parsed
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        database_url_override: Option<String>,
    ) -> Result<Self, ConfigError> {
        let bind = match bind_override {
            Some(bind) => bind,
            None => parse_env_required_or("SERVER_BIND", DEFAULT_BIND)?,
        };

        let defaults = DatabaseConfig::development();
        let database_url = database_url_override
            .or_else(|| std::env::var("DATABASE_URL").ok())
            .unwrap_or(defaults.database_url);

        let database = DatabaseConfig {
            database_url,
            max_connections: parse_env_or("DB_MAX_CONNECTIONS", defaults.max_connections),
            min_connections: parse_env_or("DB_MIN_CONNECTIONS", defaults.min_connections),
            connection_timeout_secs: parse_env_or(
                "DB_CONNECTION_TIMEOUT_SECS",
                defaults.connection_timeout_secs,
            ),
            idle_timeout_secs: parse_env_or("DB_IDLE_TIMEOUT_SECS", defaults.idle_timeout_secs),
            max_lifetime_secs: parse_env_or("DB_MAX_LIFETIME_SECS", defaults.max_lifetime_secs),
        };

        let security = SecurityConfig {
            password_pepper: std::env::var("PASSWORD_PEPPER").unwrap_or_default(),
            production: std::env::var("APP_ENV")
                .map(|env| env.eq_ignore_ascii_case("production"))
                .unwrap_or(false),
        };

        let session_defaults = SessionConfig::default();
        let session = SessionConfig {
            ttl_days: parse_env_or("SESSION_TTL_DAYS", session_defaults.ttl_days),
            purge_interval_secs: parse_env_or(
                "SESSION_PURGE_INTERVAL_SECS",
                session_defaults.purge_interval_secs,
            ),
        };

        let metrics_bind = match std::env::var("METRICS_BIND") {
            Ok(value) if !value.is_empty() => {
                Some(value.parse().map_err(|_| ConfigError::Invalid {
                    var: "METRICS_BIND".to_string(),
                    reason: format!("'{}' is not an IP:PORT address", value),
                })?)
            }
            _ => None,
        };

        Ok(ServerConfig {
            bind,
            database,
            security,
            session,
            metrics_bind,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        let pepper = &self.security.password_pepper;
        if !pepper.is_empty() && pepper.len() < MIN_PEPPER_LEN {
            return Err(ConfigError::Invalid {
                var: "PASSWORD_PEPPER".to_string(),
                reason: format!("Must be at least {} characters", MIN_PEPPER_LEN),
            });
        }

        if !(1..=MAX_SESSION_TTL_DAYS).contains(&self.session.ttl_days) {
            return Err(ConfigError::Invalid {
                var: "SESSION_TTL_DAYS".to_string(),
                reason: format!("Must be between 1 and {}", MAX_SESSION_TTL_DAYS),
            });
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid {
                var: "DB_MAX_CONNECTIONS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::Invalid {
                var: "DB_MIN_CONNECTIONS".to_string(),
                reason: format!(
                    "Cannot exceed max connections ({})",
                    self.database.max_connections
                ),
            });
        }

        Ok(())
    }

    /// Session lifetime as a chrono duration
    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.session.ttl_days)
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Like [`parse_env_or`], but a set-yet-unparsable value is an error
fn parse_env_required_or<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    let raw = std::env::var(key).unwrap_or_else(|_| default.to_string());
    raw.parse().map_err(|_| ConfigError::Invalid {
        var: key.to_string(),
        reason: format!("'{}' could not be parsed", raw),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ServerConfig {
        ServerConfig {
            bind: DEFAULT_BIND.parse().unwrap(),
            database: DatabaseConfig {
                database_url: "test".to_string(),
                max_connections: 10,
                min_connections: 1,
                connection_timeout_secs: 5,
                idle_timeout_secs: 300,
                max_lifetime_secs: 1800,
            },
            security: SecurityConfig {
                password_pepper: String::new(),
                production: false,
            },
            session: SessionConfig::default(),
            metrics_bind: None,
        }
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Invalid {
            var: "SESSION_TTL_DAYS".to_string(),
            reason: "Must be at least 1".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("SESSION_TTL_DAYS"));
        assert!(msg.contains("at least 1"));
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = config();
        assert!(config.validate().is_ok());
        assert_eq!(config.session_ttl(), chrono::Duration::days(7));
        assert_eq!(config.session.purge_interval_secs, 3600);
    }

    #[test]
    fn test_short_pepper_rejected() {
        let mut config = config();
        config.security.password_pepper = "short".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));

        config.security.password_pepper = "a".repeat(MIN_PEPPER_LEN);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let mut config = config();
        config.session.ttl_days = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("SESSION_TTL_DAYS"));
    }

    #[test]
    fn test_oversized_ttl_rejected() {
        let mut config = config();
        config.session.ttl_days = 100_000_000;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("SESSION_TTL_DAYS"));

        config.session.ttl_days = MAX_SESSION_TTL_DAYS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_pool_bounds() {
        let mut config = config();
        config.database.min_connections = 20;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("DB_MIN_CONNECTIONS"));
    }

    #[test]
    fn test_parse_env_or_falls_back() {
        let value: u32 = parse_env_or("DS_SERVER_TEST_SURELY_UNSET_VAR", 42);
        assert_eq!(value, 42);
    }

    #[test]
    fn test_parse_env_required_or_default() {
        let bind: SocketAddr =
            parse_env_required_or("DS_SERVER_TEST_SURELY_UNSET_BIND", DEFAULT_BIND).unwrap();
        assert_eq!(bind.port(), 8080);
    }
}
