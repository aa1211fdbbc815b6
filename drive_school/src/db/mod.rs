//! Database module providing PostgreSQL connection pooling and the
//! credential/session repositories.
//!
//! The pool is wrapped by [`Database`]; the auth core only ever talks to the
//! store through the [`UserRepository`] and [`SessionRepository`] traits.

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

pub mod config;
pub mod memory;
pub mod repository;

pub use config::DatabaseConfig;
pub use memory::{MemorySessionRepository, MemoryUserRepository};
pub use repository::{PgSessionRepository, PgUserRepository, SessionRepository, UserRepository};

/// Database connection pool wrapper
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool
    ///
    /// # Arguments
    ///
    /// * `config` - Database configuration
    ///
    /// # Returns
    ///
    /// * `Result<Database, sqlx::Error>` - Database instance or error
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use drive_school::db::{Database, DatabaseConfig};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), sqlx::Error> {
    ///     let config = DatabaseConfig::development();
    ///     let db = Database::new(&config).await?;
    ///     Ok(())
    /// }
    /// ```
    pub async fn new(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
            .connect(&config.database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Repositories backed by this pool
    pub fn repositories(&self) -> (PgUserRepository, PgSessionRepository) {
        (
            PgUserRepository::new(self.pool.clone()),
            PgSessionRepository::new(self.pool.clone()),
        )
    }

    /// Apply the SQL files under `migrations/`
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    /// Close the database connection pool
    pub async fn close(self) {
        self.pool.close().await;
    }
}
