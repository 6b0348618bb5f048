//! HTTP route handlers, one module per concern.

pub mod health;
pub mod leads;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` application router.
#[must_use]
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", leads::router().merge(health::router()))
        .with_state(state)
}
