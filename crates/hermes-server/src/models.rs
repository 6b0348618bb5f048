//! Server data models.
//!
//! Persisted lead records, the backup endpoint request/response shapes,
//! and health statistics. The wire format is camelCase; the CAPTCHA
//! token is stored for audit but never serialized outward.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::webhook::WebhookOutcome;

// ── Leads ────────────────────────────────────────────────────────────

/// Workflow status of a persisted lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
    New,
    Contacted,
    Qualified,
    Converted,
    Closed,
}

impl std::fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::New => write!(f, "new"),
            Self::Contacted => write!(f, "contacted"),
            Self::Qualified => write!(f, "qualified"),
            Self::Converted => write!(f, "converted"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

impl std::str::FromStr for LeadStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "new" => Ok(Self::New),
            "contacted" => Ok(Self::Contacted),
            "qualified" => Ok(Self::Qualified),
            "converted" => Ok(Self::Converted),
            "closed" => Ok(Self::Closed),
            other => Err(format!("unknown lead status: {other}")),
        }
    }
}

/// A persisted lead. Superset of the client submission plus the opaque
/// `lead_id`, webhook-dispatch bookkeeping, and workflow fields.
///
/// Created once on first successful persistence; mutated by webhook
/// outcome updates and manual workflow updates; deleted only by the
/// retention purge.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LeadRecord {
    pub id: i64,
    pub lead_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub country: String,
    pub phone_number: String,
    #[serde(rename = "role")]
    pub contact_role: Option<String>,
    pub problem_description: String,
    pub company_name: Option<String>,
    pub company_size: Option<String>,
    pub service_urgency: String,
    pub agree_to_terms: bool,
    pub privacy_consent: bool,
    pub marketing_opt_in: bool,
    #[serde(skip)]
    pub captcha_token: Option<String>,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub n8n_success: Option<bool>,
    pub n8n_retry_count: i32,
    pub n8n_response: Option<serde_json::Value>,
    pub n8n_error: Option<String>,
    pub webhook_sent_at: Option<DateTime<Utc>>,
    pub webhook_response_at: Option<DateTime<Utc>>,
    pub status: String,
    pub assigned_to: Option<String>,
    pub notes: Option<String>,
    pub lead_score: Option<i32>,
    pub priority: Option<i32>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ── Backup endpoint wire shapes ──────────────────────────────────────

/// Client-supplied metadata accompanying a submission.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionMetadata {
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub captcha_token: Option<String>,
}

/// Response body for a successful backup. `success` reflects persistence
/// only — callers must inspect `n8nResponse.success` to learn whether
/// downstream delivery happened.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupLeadResponse {
    pub success: bool,
    pub lead_id: String,
    pub backup_id: i64,
    pub n8n_response: WebhookOutcome,
    pub timestamp: DateTime<Utc>,
    pub next_steps: Vec<String>,
}

/// Body for `PATCH /api/leads/{id}` — manual workflow updates. Absent
/// fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLeadRequest {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub lead_score: Option<i32>,
    #[serde(default)]
    pub priority: Option<i32>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

// ── Health ───────────────────────────────────────────────────────────

/// Aggregate lead statistics for the health endpoint.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadStats {
    pub total_leads: i64,
    pub new_leads: i64,
    pub failed_webhooks: i64,
    /// Webhook delivery success rate in percent; 100 when nothing has
    /// been dispatched yet.
    pub webhook_success_rate: f64,
}

/// Body of `GET /api/health/database`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub response_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<LeadStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Degradation rule: more than 10 failed webhooks, or a success rate
/// under 90% with at least one lead, degrades the service.
#[must_use]
pub fn classify_health(stats: &LeadStats) -> &'static str {
    if stats.failed_webhooks > 10
        || (stats.total_leads >= 1 && stats.webhook_success_rate < 90.0)
    {
        "degraded"
    } else {
        "healthy"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn stats(total: i64, failed: i64, rate: f64) -> LeadStats {
        LeadStats {
            total_leads: total,
            new_leads: 0,
            failed_webhooks: failed,
            webhook_success_rate: rate,
        }
    }

    #[test]
    fn healthy_with_no_leads() {
        assert_eq!(classify_health(&stats(0, 0, 100.0)), "healthy");
    }

    #[test]
    fn degraded_when_failed_webhooks_exceed_ten() {
        assert_eq!(classify_health(&stats(100, 11, 99.0)), "degraded");
        assert_eq!(classify_health(&stats(100, 10, 99.0)), "healthy");
    }

    #[test]
    fn degraded_when_success_rate_low_with_leads() {
        assert_eq!(classify_health(&stats(1, 0, 89.9)), "degraded");
        assert_eq!(classify_health(&stats(0, 0, 0.0)), "healthy");
        assert_eq!(classify_health(&stats(5, 0, 90.0)), "healthy");
    }

    #[test]
    fn lead_status_round_trips() {
        for s in [
            LeadStatus::New,
            LeadStatus::Contacted,
            LeadStatus::Qualified,
            LeadStatus::Converted,
            LeadStatus::Closed,
        ] {
            assert_eq!(s.to_string().parse::<LeadStatus>().unwrap(), s);
        }
        assert!("archived".parse::<LeadStatus>().is_err());
    }

    #[test]
    fn captcha_token_never_serialized() {
        let record = LeadRecord {
            id: 1,
            lead_id: "HERMES-1-ABCDEF".to_owned(),
            first_name: "Test".to_owned(),
            last_name: "User".to_owned(),
            email: "t@example.com".to_owned(),
            country: "GB".to_owned(),
            phone_number: "+447700900000".to_owned(),
            contact_role: None,
            problem_description: "...".to_owned(),
            company_name: None,
            company_size: None,
            service_urgency: "urgent".to_owned(),
            agree_to_terms: true,
            privacy_consent: true,
            marketing_opt_in: false,
            captcha_token: Some("sensitive".to_owned()),
            user_agent: None,
            ip_address: None,
            n8n_success: None,
            n8n_retry_count: 0,
            n8n_response: None,
            n8n_error: None,
            webhook_sent_at: None,
            webhook_response_at: None,
            status: "new".to_owned(),
            assigned_to: None,
            notes: None,
            lead_score: None,
            priority: None,
            tags: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("sensitive"));
        assert!(!json.contains("captchaToken"));
        assert!(json.contains("leadId"));
    }
}
