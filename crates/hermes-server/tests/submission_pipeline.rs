//! Integration tests for the lead submission API surface.
//!
//! These tests exercise the router without a live database: the pool is
//! built lazily and only the paths that never touch it (method and
//! validation rejections) or that surface store unreachability (health,
//! lead lookup) are asserted.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use hermes_server::captcha::CaptchaVerifier;
use hermes_server::config::{CaptchaConfig, Environment, RetentionConfig, ServerConfig};
use hermes_server::routes;
use hermes_server::state::AppState;
use hermes_server::webhook::WebhookRelay;

/// Build the app against an unreachable store. The lazy pool defers
/// connecting until a query actually runs.
fn test_app() -> Router {
    let config = ServerConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        database_url: "postgres://127.0.0.1:1/hermes".into(),
        environment: Environment::Development,
        log_level: "warn".into(),
        webhook: hermes_server::config::WebhookConfig {
            production_url: "http://127.0.0.1:1/webhook/lead-intake".into(),
            test_url: "http://127.0.0.1:1/webhook-test/lead-intake".into(),
            fallback_url: None,
        },
        captcha: CaptchaConfig {
            secret: None,
            verify_url: "http://127.0.0.1:1/siteverify".into(),
            min_score: 0.5,
        },
        retention: RetentionConfig {
            window_days: 730,
            scan_interval_secs: 86_400,
        },
    };

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(1)
        .connect_lazy(&config.database_url)
        .unwrap();

    let client = reqwest::Client::new();
    let state = Arc::new(AppState {
        pool,
        relay: WebhookRelay::new(client.clone(), &config),
        captcha: CaptchaVerifier::new(client, &config.captcha),
        environment: config.environment,
        retention: config.retention,
    });

    routes::app(state)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn backup_lead_rejects_get() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/backup-lead")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn backup_lead_lists_missing_fields() {
    let app = test_app();

    // Only two of the nine required fields present.
    let body = json!({
        "formData": {
            "firstName": "Ada",
            "email": "ada@example.com"
        }
    });

    let response = app
        .oneshot(json_request("POST", "/api/backup-lead", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = body_json(response).await;
    assert_eq!(payload["success"], json!(false));
    assert_eq!(payload["error"], json!("bad_request"));

    let message = payload["message"].as_str().unwrap();
    assert!(message.starts_with("Missing required fields:"));
    assert!(message.contains("lastName"));
    assert!(message.contains("phoneNumber"));
    assert!(message.contains("privacyConsent"));
    // Present fields are not listed.
    assert!(!message.contains("firstName"));
    assert!(!message.contains("email,"));
}

#[tokio::test]
async fn backup_lead_treats_false_consent_as_missing() {
    let app = test_app();

    let body = json!({
        "formData": {
            "firstName": "Ada",
            "lastName": "Lovelace",
            "email": "ada@example.com",
            "country": "GB",
            "phoneNumber": "+447700900123",
            "problemDescription": "Annual penetration test",
            "serviceUrgency": "soon",
            "agreeToTerms": true,
            "privacyConsent": false
        }
    });

    let response = app
        .oneshot(json_request("POST", "/api/backup-lead", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = body_json(response).await;
    let message = payload["message"].as_str().unwrap();
    assert!(message.contains("privacyConsent"));
}

#[tokio::test]
async fn backup_lead_rejects_invalid_phone() {
    let app = test_app();

    // All fields present but the phone number lacks the GB dial code.
    let body = json!({
        "formData": {
            "firstName": "Ada",
            "lastName": "Lovelace",
            "email": "ada@example.com",
            "country": "GB",
            "phoneNumber": "+15551234567",
            "problemDescription": "Annual penetration test",
            "serviceUrgency": "soon",
            "agreeToTerms": true,
            "privacyConsent": true
        }
    });

    let response = app
        .oneshot(json_request("POST", "/api/backup-lead", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = body_json(response).await;
    assert_eq!(payload["error"], json!("bad_request"));
}

#[tokio::test]
async fn update_lead_rejects_unknown_status() {
    let app = test_app();

    let response = app
        .oneshot(json_request(
            "PATCH",
            "/api/leads/HERMES-ABC123-XYZ789",
            json!({"status": "archived"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn get_lead_reports_store_unavailable() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/leads/42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let payload = body_json(response).await;
    assert_eq!(payload["success"], json!(false));
}

#[tokio::test]
async fn database_health_reports_unreachable_store() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/health/database")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let payload = body_json(response).await;
    assert_eq!(payload["status"], json!("unhealthy"));
    assert!(payload["error"].is_string());
}