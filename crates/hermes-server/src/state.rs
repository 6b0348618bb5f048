//! Shared application state for the Hermes server.
//!
//! A single [`AppState`] is constructed at startup and shared across all
//! Axum handlers via `Arc`. It holds the database pool, the webhook
//! relay, the CAPTCHA verifier, and the configuration the handlers need.

use sqlx::PgPool;

use crate::captcha::CaptchaVerifier;
use crate::config::{Environment, RetentionConfig};
use crate::webhook::WebhookRelay;

/// Shared application state passed to all HTTP handlers.
pub struct AppState {
    /// Pooled connections to the lead store.
    pub pool: PgPool,
    /// Relay to the automation webhook (and optional fallback channel).
    pub relay: WebhookRelay,
    /// Score-based bot-detection gate.
    pub captcha: CaptchaVerifier,
    /// Deployment environment.
    pub environment: Environment,
    /// GDPR retention settings (used by the background purge worker).
    pub retention: RetentionConfig,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}
