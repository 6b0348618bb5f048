//! Lead routes: backup endpoint, read, and workflow updates.
//!
//! The backup endpoint is the canonical submission pipeline: validate
//! the fixed required-field list, run the CAPTCHA gate, persist (the
//! only hard-failure step), then relay to the automation webhook and
//! record the outcome. The response reports `success: true` whenever
//! persistence succeeded — downstream delivery is reported only via the
//! nested `n8nResponse.success` flag.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::Value;
use tracing::{info, warn};

use hermes_core::lead::{LeadSubmission, REQUIRED_FIELDS};
use hermes_core::lead_id;

use crate::captcha::CaptchaError;
use crate::error::AppError;
use crate::models::{
    BackupLeadResponse, LeadRecord, LeadStatus, SubmissionMetadata, UpdateLeadRequest,
};
use crate::repository;
use crate::state::AppState;

/// CAPTCHA action tag for submissions arriving via the backup endpoint.
const CAPTCHA_ACTION: &str = "backup-lead";

/// Build the leads router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/backup-lead", post(backup_lead))
        .route("/leads/{id}", get(get_lead).patch(update_lead))
}

/// Required-field names missing or falsy in the form payload. The check
/// is truthiness, matching the wire contract: absent, `null`, `false`,
/// and whitespace-only strings all count as missing.
#[must_use]
pub fn missing_required_fields(form: &Value) -> Vec<&'static str> {
    REQUIRED_FIELDS
        .iter()
        .filter(|field| {
            !form
                .get(**field)
                .is_some_and(|v| match v {
                    Value::String(s) => !s.trim().is_empty(),
                    Value::Bool(b) => *b,
                    Value::Null => false,
                    _ => true,
                })
        })
        .copied()
        .collect()
}

/// `POST /api/backup-lead`
///
/// Body: `{formData: {...}, metadata?: {userAgent, ipAddress, timestamp,
/// captchaToken}}`.
async fn backup_lead(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<BackupLeadResponse>, AppError> {
    let form = body.get("formData").cloned().unwrap_or(Value::Null);

    let missing = missing_required_fields(&form);
    if !missing.is_empty() {
        return Err(AppError::BadRequest(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    }

    let submission: LeadSubmission = serde_json::from_value(form)
        .map_err(|e| AppError::BadRequest(format!("invalid form data: {e}")))?;
    submission
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let metadata: SubmissionMetadata = body
        .get("metadata")
        .cloned()
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| AppError::BadRequest(format!("invalid metadata: {e}")))?
        .unwrap_or_default();

    verify_captcha(&state, &submission, &metadata).await?;

    // Persistence is the only hard-failure step of the pipeline.
    let lead_id = lead_id::generate();
    let record = repository::create_lead(&state.pool, &lead_id, &submission, &metadata).await?;

    info!(lead_id = %lead_id, backup_id = record.id, "lead persisted");

    // Everything past this point is bookkeeping: the lead is durable, so
    // failures are logged, never surfaced as errors.
    if let Err(e) = repository::mark_webhook_sent(&state.pool, record.id).await {
        warn!(lead_id = %lead_id, error = %e, "failed to stamp webhook dispatch time");
    }

    let payload = crate::webhook::build_payload(
        &submission,
        &lead_id,
        state.environment,
        metadata.user_agent.as_deref(),
        metadata.ip_address.as_deref(),
    );
    let outcome = state.relay.dispatch(&lead_id, &payload).await;

    if let Err(e) = repository::record_webhook_outcome(
        &state.pool,
        record.id,
        outcome.success,
        outcome.body.as_ref(),
        outcome.error.as_deref(),
    )
    .await
    {
        warn!(lead_id = %lead_id, error = %e, "failed to record webhook outcome");
    }

    if !outcome.success {
        // Advisory counter for an external redispatch process; nothing
        // in-process retries.
        if let Err(e) = repository::increment_retry_count(&state.pool, record.id).await {
            warn!(lead_id = %lead_id, error = %e, "failed to increment retry counter");
        }
        state.relay.send_fallback(&lead_id, &submission).await;
    }

    Ok(Json(BackupLeadResponse {
        success: true,
        lead_id,
        backup_id: record.id,
        n8n_response: outcome,
        timestamp: Utc::now(),
        next_steps: vec![
            "Our team reviews every request within one business day.".to_owned(),
            "You will receive a confirmation email shortly.".to_owned(),
        ],
    }))
}

/// Run the CAPTCHA gate when it can run.
///
/// An unconfigured gate or an absent token skips verification (the
/// client-side gate already proved token acquisition where it applies);
/// a provider transport failure is logged and waved through so an outage
/// at the provider cannot drop leads. Only an actual rejection or an
/// empty token blocks the submission.
async fn verify_captcha(
    state: &AppState,
    submission: &LeadSubmission,
    metadata: &SubmissionMetadata,
) -> Result<(), AppError> {
    if !state.captcha.is_configured() {
        return Ok(());
    }
    let Some(token) = metadata
        .captcha_token
        .as_deref()
        .or(submission.captcha_token.as_deref())
    else {
        return Ok(());
    };

    match state.captcha.verify(token, CAPTCHA_ACTION).await {
        Ok(()) => Ok(()),
        Err(CaptchaError::Rejected { reason }) => {
            warn!(reason = %reason, "captcha rejected submission");
            Err(AppError::CaptchaRejected)
        }
        Err(CaptchaError::TokenGenerationFailed) => Err(AppError::CaptchaRejected),
        Err(e @ (CaptchaError::Transport(_) | CaptchaError::NotAvailable)) => {
            warn!(error = %e, "captcha verification unavailable, accepting submission");
            Ok(())
        }
    }
}

/// `GET /api/leads/{id}`
///
/// The id is tried as the numeric row id first, else as the string
/// `lead_id`. The CAPTCHA token is excluded from the projection.
async fn get_lead(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> Result<Json<LeadRecord>, AppError> {
    let raw_id = raw_id.trim();
    if raw_id.is_empty() {
        return Err(AppError::BadRequest("lead id is required".to_owned()));
    }

    let record = repository::get_lead(&state.pool, raw_id).await?;
    Ok(Json(record))
}

/// `PATCH /api/leads/{id}` — manual status/assignment updates.
async fn update_lead(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
    Json(update): Json<UpdateLeadRequest>,
) -> Result<Json<LeadRecord>, AppError> {
    if let Some(status) = &update.status {
        status
            .parse::<LeadStatus>()
            .map_err(AppError::BadRequest)?;
    }

    let record = repository::get_lead(&state.pool, raw_id.trim()).await?;
    let updated = repository::update_workflow(&state.pool, record.id, &update).await?;

    info!(lead_id = %updated.lead_id, status = %updated.status, "lead workflow updated");
    Ok(Json(updated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn complete_form_has_no_missing_fields() {
        let form = json!({
            "firstName": "Test", "lastName": "User", "email": "t@example.com",
            "country": "GB", "phoneNumber": "+447700900000",
            "problemDescription": "...", "serviceUrgency": "urgent",
            "agreeToTerms": true, "privacyConsent": true
        });
        assert!(missing_required_fields(&form).is_empty());
    }

    #[test]
    fn absent_and_falsy_fields_are_reported() {
        let form = json!({
            "firstName": "Test", "lastName": "  ", "email": null,
            "country": "GB", "phoneNumber": "+447700900000",
            "problemDescription": "...", "serviceUrgency": "urgent",
            "agreeToTerms": false, "privacyConsent": true
        });
        let missing = missing_required_fields(&form);
        assert_eq!(missing, vec!["lastName", "email", "agreeToTerms"]);
    }

    #[test]
    fn null_form_reports_every_required_field() {
        let missing = missing_required_fields(&Value::Null);
        assert_eq!(missing.len(), REQUIRED_FIELDS.len());
    }
}
