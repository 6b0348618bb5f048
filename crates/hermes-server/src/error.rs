//! HTTP error types for the Hermes server.
//!
//! Maps domain and database errors into HTTP responses. Every variant
//! produces a JSON body with `success: false`, a machine-readable `error`
//! field, and a human-readable `message`. Database-unreachable is the
//! only hard failure (503); a failed webhook relay is never an error at
//! this layer — it is reported inside the 200 body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Application-level error returned from HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Client sent invalid input (missing fields, malformed values).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The CAPTCHA gate rejected the submission.
    #[error("security verification failed")]
    CaptchaRejected,

    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The lead store is unreachable — the caller should retry later.
    #[error("database unavailable: {0}")]
    DatabaseUnavailable(String),

    /// Unexpected internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            Self::CaptchaRejected => (
                StatusCode::BAD_REQUEST,
                "captcha_failed",
                "security verification failed".to_owned(),
            ),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            Self::DatabaseUnavailable(msg) => {
                tracing::error!(error = %msg, "lead store unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "database_unavailable",
                    "we could not save your request — please retry in a few minutes".to_owned(),
                )
            }
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "something went wrong — please retry".to_owned(),
                )
            }
        };

        let body = ErrorBody {
            success: false,
            error: error_type,
            message,
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => Self::NotFound("lead not found".to_owned()),
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed => Self::DatabaseUnavailable(err.to_string()),
            _ => Self::Internal(format!("database error: {err}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            AppError::BadRequest(String::new()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::CaptchaRejected.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::NotFound(String::new()).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::DatabaseUnavailable(String::new())
                .into_response()
                .status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::Internal(String::new()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn row_not_found_maps_to_404() {
        let err: AppError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn pool_exhaustion_maps_to_503() {
        let err: AppError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, AppError::DatabaseUnavailable(_)));
    }
}
