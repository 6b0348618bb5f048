//! Hermes server entry point.
//!
//! Bootstraps the lead store, webhook relay, and CAPTCHA gate, then
//! starts the Axum HTTP server with graceful shutdown. A background
//! retention worker purges leads past the GDPR window and is cancelled
//! on shutdown.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use axum::http::HeaderValue;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};

use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use hermes_server::captcha::CaptchaVerifier;
use hermes_server::config::ServerConfig;
use hermes_server::repository;
use hermes_server::routes;
use hermes_server::state::AppState;
use hermes_server::webhook::WebhookRelay;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from environment.
    let config = ServerConfig::from_env();

    // Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .json()
        .init();

    info!(environment = config.environment.as_str(), "Hermes starting");

    let pool = repository::connect(&config.database_url)
        .await
        .context("failed to connect to the lead store")?;

    let http_client = reqwest::Client::new();
    let state = Arc::new(AppState {
        pool,
        relay: WebhookRelay::new(http_client.clone(), &config),
        captcha: CaptchaVerifier::new(http_client, &config.captcha),
        environment: config.environment,
        retention: config.retention,
    });

    info!(webhook = state.relay.url(), "webhook relay configured");
    if !state.captcha.is_configured() {
        warn!("no CAPTCHA secret configured — submissions will not be verified");
    }

    // Shutdown signal channel.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Spawn the GDPR retention worker.
    let retention_handle = {
        let state = Arc::clone(&state);
        let mut rx = shutdown_rx;
        tokio::spawn(async move {
            retention_worker(&state, &mut rx).await;
        })
    };

    let app = layered(routes::app(Arc::clone(&state)));

    // Bind and serve.
    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.bind_addr))?;

    info!(addr = %config.bind_addr, "Hermes server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_tx))
        .await
        .context("server error")?;

    // Wait for the background worker to finish (with timeout).
    info!("waiting for background workers to stop");
    let _ = tokio::time::timeout(Duration::from_secs(10), retention_handle).await;

    info!("Hermes server stopped");
    Ok(())
}

/// Apply the HTTP middleware stack.
fn layered(app: Router) -> Router {
    // CORS — the marketing site and the API may live on different hosts.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PATCH,
        ])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    app.layer(TraceLayer::new_for_http())
        .layer(cors)
        // Bound concurrent requests: the submission endpoint is public.
        .layer(tower::limit::ConcurrencyLimitLayer::new(64))
        .layer(SetResponseHeaderLayer::overriding(
            axum::http::header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            axum::http::header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            axum::http::header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
}

/// Maximum purge retries per tick when the store is unreachable.
const PURGE_MAX_RETRIES: u32 = 3;

/// Background worker that periodically purges leads past the retention
/// window.
///
/// If the store is unreachable during a tick, the purge retries with
/// exponential backoff (1s, 2s, 4s) before giving up on that tick. A
/// consecutive-failure counter escalates log severity so operators
/// notice persistent issues without being spammed on transient blips.
async fn retention_worker(state: &AppState, shutdown: &mut watch::Receiver<bool>) {
    let mut interval =
        tokio::time::interval(Duration::from_secs(state.retention.scan_interval_secs));
    let mut consecutive_failures: u32 = 0;
    info!(
        window_days = state.retention.window_days,
        interval_secs = state.retention.scan_interval_secs,
        "retention worker started"
    );

    loop {
        tokio::select! {
            _ = interval.tick() => {
                match retry_purge(state, shutdown).await {
                    Ok(None) => {
                        info!("retention worker shutting down");
                        return;
                    }
                    Ok(Some(purged)) => {
                        consecutive_failures = 0;
                        if purged > 0 {
                            info!(purged, "retention purge complete");
                        }
                    }
                    Err(last_err) => {
                        consecutive_failures = consecutive_failures.saturating_add(1);
                        if consecutive_failures >= 5 {
                            tracing::error!(
                                error = %last_err,
                                consecutive_failures,
                                "retention purge persistently failing — store may be down"
                            );
                        } else {
                            warn!(
                                error = %last_err,
                                consecutive_failures,
                                retries = PURGE_MAX_RETRIES,
                                "retention purge failed after retries, will retry next tick"
                            );
                        }
                    }
                }
            }
            _ = shutdown.changed() => {
                info!("retention worker shutting down");
                return;
            }
        }
    }
}

/// Attempt the purge with exponential backoff. Returns:
/// - `Ok(Some(purged))` on success
/// - `Ok(None)` if shutdown was signalled during retry
/// - `Err(last_error)` if all retries exhausted
async fn retry_purge(
    state: &AppState,
    shutdown: &mut watch::Receiver<bool>,
) -> Result<Option<u64>, String> {
    let mut last_err = String::new();

    for attempt in 0..=PURGE_MAX_RETRIES {
        match repository::purge_expired(&state.pool, state.retention.window_days).await {
            Ok(purged) => return Ok(Some(purged)),
            Err(e) => {
                last_err = e.to_string();

                if attempt == PURGE_MAX_RETRIES {
                    break;
                }

                // Exponential backoff: 1s, 2s, 4s
                let backoff = Duration::from_secs(1u64 << attempt);
                tracing::debug!(
                    attempt = attempt.saturating_add(1),
                    backoff_ms = backoff.as_millis() as u64,
                    error = %e,
                    "retention purge failed, retrying"
                );

                // Wait for backoff OR shutdown, whichever comes first.
                tokio::select! {
                    () = tokio::time::sleep(backoff) => {}
                    _ = shutdown.changed() => {
                        return Ok(None);
                    }
                }
            }
        }
    }

    Err(last_err)
}

/// Wait for SIGINT or SIGTERM, then broadcast shutdown.
async fn shutdown_signal(shutdown_tx: watch::Sender<bool>) {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let terminate = async {
        if let Ok(mut sig) =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        {
            sig.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("shutdown signal received, stopping server");
    let _ = shutdown_tx.send(true);
}
