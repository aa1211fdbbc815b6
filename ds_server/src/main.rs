//! Driving school auth server.
//!
//! Serves the session endpoints and the access middleware over PostgreSQL,
//! or over in-memory stores with `--memory` for local development.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Error};
use axum::Router;
use drive_school::{
    auth::{AccessPolicy, AuthManager},
    db::{
        Database, MemorySessionRepository, MemoryUserRepository, SessionRepository,
        UserRepository,
    },
};
use ds_server::{
    api::{self, AppState, cookie::SessionCookie},
    config::ServerConfig,
    logging, maintenance, metrics,
};
use pico_args::Arguments;

const HELP: &str = "\
Run the driving school auth server

USAGE:
  ds_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:8080]
  --db-url     URL         Database connection string  [default: env DATABASE_URL or postgres://postgres@localhost/drive_school]

FLAGS:
  --memory                 Keep users and sessions in memory instead of PostgreSQL
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND                  Server bind address (e.g., 0.0.0.0:8080)
  DATABASE_URL                 PostgreSQL connection string
  PASSWORD_PEPPER              Password hashing pepper (optional, >= 16 chars)
  APP_ENV                      'production' marks the session cookie Secure
  SESSION_TTL_DAYS             Session lifetime in days [default: 7]
  SESSION_PURGE_INTERVAL_SECS  Expired-session purge interval, 0 disables [default: 3600]
  METRICS_BIND                 Prometheus exporter address (optional)
  RUST_LOG                     Log filter [default: info,sqlx=warn,hyper=warn]
  (See .env file for all configuration options)
";

struct Args {
    bind: Option<SocketAddr>,
    database_url: Option<String>,
    memory: bool,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        bind: pargs.opt_value_from_str("--bind")?,
        database_url: pargs.opt_value_from_str("--db-url")?,
        memory: pargs.contains("--memory"),
    };

    logging::init();

    let config = ServerConfig::from_env(args.bind, args.database_url)?;
    config.validate()?;

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(Error::msg)?;
        tracing::info!("Prometheus exporter listening on {}", addr);
    }

    let mut database = None;
    let (users, sessions): (Arc<dyn UserRepository>, Arc<dyn SessionRepository>) = if args.memory
    {
        tracing::warn!("Using in-memory stores; all accounts vanish on restart");
        (
            Arc::new(MemoryUserRepository::new()),
            Arc::new(MemorySessionRepository::new()),
        )
    } else {
        tracing::info!("Connecting to database");
        let db = Database::new(&config.database)
            .await
            .context("Failed to connect to database")?;
        db.migrate().await.context("Failed to run migrations")?;
        tracing::info!("Database connected and migrated");

        let (users, sessions) = db.repositories();
        database = Some(db);
        (Arc::new(users), Arc::new(sessions))
    };

    if config.security.password_pepper.is_empty() {
        tracing::warn!("PASSWORD_PEPPER not set; hashing without a pepper");
    }

    let auth_manager = AuthManager::new(users, sessions, config.security.password_pepper.clone())
        .with_session_ttl(config.session_ttl());

    let purger = match config.session.purge_interval_secs {
        0 => {
            tracing::info!("Expired-session purger disabled");
            None
        }
        secs => Some(maintenance::spawn_session_purger(
            auth_manager.sessions().clone(),
            Duration::from_secs(secs),
        )),
    };

    let state = AppState {
        auth_manager: Arc::new(auth_manager),
        access_policy: Arc::new(AccessPolicy::default()),
        session_cookie: SessionCookie::new(config.security.production),
    };

    // Resource handlers are mounted by the scheduler application
    let app = api::create_router(state, Router::new());

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    tracing::info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Shutting down server...");

    if let Some(purger) = purger {
        purger.abort();
    }
    if let Some(db) = database {
        db.close().await;
    }

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install CTRL+C signal handler: {}", e);
        std::future::pending::<()>().await;
    }
}
