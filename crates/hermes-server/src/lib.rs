//! Hermes HTTP server.
//!
//! Wires the core library, the Postgres lead store, the webhook relay,
//! and the CAPTCHA gate into a running Axum service. Serves the lead
//! backup endpoint, read/update routes, and the database health check
//! under `/api/*`.

pub mod captcha;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod routes;
pub mod state;
pub mod webhook;
