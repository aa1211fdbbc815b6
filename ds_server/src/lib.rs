//! HTTP server for the driving school scheduler.
//!
//! Wraps the [`drive_school`] auth core in an axum router: the session
//! endpoints, the access middleware gating `/api` and `/dashboard`, and the
//! ambient pieces (configuration, logging, metrics, background maintenance).

pub mod api;
pub mod config;
pub mod logging;
pub mod maintenance;
pub mod metrics;
