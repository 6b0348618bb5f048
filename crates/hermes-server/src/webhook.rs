//! Automation webhook relay.
//!
//! POSTs persisted leads to the environment-selected workflow-automation
//! webhook, with identifying headers and the generated lead id duplicated
//! under legacy alias keys for backward compatibility. Response parsing
//! is lenient: the outer HTTP status is authoritative, the body is not —
//! an empty or non-JSON 2xx body still counts as delivered.
//!
//! When the primary relay fails and a fallback URL is configured, a
//! formatted notification is POSTed there instead, carrying a priority
//! derived from the submission's urgency and a generated message id, so
//! the operations inbox still receives the lead.

use std::time::{SystemTime, UNIX_EPOCH};

use reqwest::StatusCode;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{info, warn};
use uuid::Uuid;

use hermes_core::lead::LeadSubmission;

use crate::config::{API_VERSION, Environment, ServerConfig};

/// Outcome of one webhook dispatch attempt. Persisted onto the lead row
/// and nested into the backup response as `n8nResponse`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WebhookOutcome {
    fn failure(error: String) -> Self {
        Self {
            success: false,
            message_id: None,
            body: None,
            error: Some(error),
        }
    }
}

/// Relay client. One instance lives in the shared app state; reqwest
/// pools connections internally.
#[derive(Debug, Clone)]
pub struct WebhookRelay {
    client: reqwest::Client,
    url: String,
    fallback_url: Option<String>,
    environment: Environment,
}

impl WebhookRelay {
    #[must_use]
    pub fn new(client: reqwest::Client, config: &ServerConfig) -> Self {
        Self {
            client,
            url: config.webhook.url_for(config.environment).to_owned(),
            fallback_url: config.webhook.fallback_url.clone(),
            environment: config.environment,
        }
    }

    /// The selected primary webhook URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Dispatch a lead payload to the primary webhook.
    ///
    /// Never returns an error — delivery failure is data, captured in
    /// the outcome and recorded on the lead row by the caller.
    pub async fn dispatch(&self, lead_id: &str, payload: &Value) -> WebhookOutcome {
        let result = self
            .client
            .post(&self.url)
            .header("x-hermes-source", "backup-endpoint")
            .header("x-hermes-lead-id", lead_id)
            .header("x-hermes-environment", self.environment.as_str())
            .header("x-hermes-api-version", API_VERSION)
            .json(payload)
            .send()
            .await;

        match result {
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                let outcome = parse_webhook_response(status, &body);
                if outcome.success {
                    info!(lead_id = %lead_id, status = %status, "webhook relay delivered");
                } else {
                    warn!(lead_id = %lead_id, status = %status, "webhook relay rejected");
                }
                outcome
            }
            Err(e) => {
                warn!(lead_id = %lead_id, error = %e, "webhook relay unreachable");
                WebhookOutcome::failure(format!("webhook request failed: {e}"))
            }
        }
    }

    /// POST a notification about a failed relay to the fallback channel.
    ///
    /// Returns whether the fallback accepted it. A missing fallback URL
    /// is not an error — the behavior is optional.
    pub async fn send_fallback(&self, lead_id: &str, submission: &LeadSubmission) -> bool {
        let Some(url) = &self.fallback_url else {
            return false;
        };

        let priority = submission.service_urgency.priority();
        let message_id = format!("<{}@hermessecurity.io>", Uuid::new_v4());
        let subject = format!(
            "New lead {lead_id} ({}) — webhook relay failed",
            submission.service_urgency
        );
        let text_body = format!(
            "{} {} <{}>\nCompany: {}\nCountry: {}, phone {}\n\n{}",
            submission.first_name,
            submission.last_name,
            submission.email,
            submission.company_name.as_deref().unwrap_or("-"),
            submission.country,
            submission.phone_number,
            submission.problem_description,
        );

        let notification = json!({
            "messageId": message_id,
            "subject": subject,
            "priority": priority,
            "importance": if priority == 1 { "high" } else { "normal" },
            "leadId": lead_id,
            "textBody": text_body,
        });

        match self.client.post(url).json(&notification).send().await {
            Ok(response) if response.status().is_success() => {
                info!(lead_id = %lead_id, priority, "fallback notification sent");
                true
            }
            Ok(response) => {
                warn!(lead_id = %lead_id, status = %response.status(), "fallback notification rejected");
                false
            }
            Err(e) => {
                warn!(lead_id = %lead_id, error = %e, "fallback notification unreachable");
                false
            }
        }
    }
}

/// Build the relay payload: the full form payload plus the generated lead
/// id duplicated under legacy alias keys, submission metadata, and the
/// source environment.
#[must_use]
pub fn build_payload(
    submission: &LeadSubmission,
    lead_id: &str,
    environment: Environment,
    user_agent: Option<&str>,
    ip_address: Option<&str>,
) -> Value {
    let mut payload = serde_json::to_value(submission).unwrap_or_else(|_| json!({}));

    if let Some(map) = payload.as_object_mut() {
        // The CAPTCHA token is consumed here, never forwarded.
        map.remove("captchaToken");

        // Legacy consumers read the id under different keys.
        map.insert("leadId".to_owned(), json!(lead_id));
        map.insert("lead_id".to_owned(), json!(lead_id));
        map.insert("backupLeadId".to_owned(), json!(lead_id));

        map.insert("environment".to_owned(), json!(environment.as_str()));
        map.insert("apiVersion".to_owned(), json!(API_VERSION));
        if let Some(ua) = user_agent {
            map.insert("userAgent".to_owned(), json!(ua));
        }
        if let Some(ip) = ip_address {
            map.insert("ipAddress".to_owned(), json!(ip));
        }
    }

    payload
}

/// Interpret a webhook HTTP response.
///
/// Non-2xx is a failure regardless of the body. For 2xx: an empty body
/// becomes a success with a timestamp-derived synthetic message id; a
/// non-JSON body is treated the same after a logged warning; a JSON body
/// is forwarded as-is with `success` forced true — the outer status, not
/// the body, is authoritative.
#[must_use]
pub fn parse_webhook_response(status: StatusCode, body: &str) -> WebhookOutcome {
    if !status.is_success() {
        let detail = body.trim();
        return WebhookOutcome::failure(if detail.is_empty() {
            format!("webhook returned {status}")
        } else {
            format!("webhook returned {status}: {detail}")
        });
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return WebhookOutcome {
            success: true,
            message_id: Some(synthetic_message_id()),
            body: None,
            error: None,
        };
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(parsed) => {
            let message_id = parsed
                .get("messageId")
                .and_then(Value::as_str)
                .map(str::to_owned)
                .or_else(|| Some(synthetic_message_id()));
            WebhookOutcome {
                success: true,
                message_id,
                body: Some(parsed),
                error: None,
            }
        }
        Err(e) => {
            warn!(error = %e, "webhook returned non-JSON body, treating as delivered");
            WebhookOutcome {
                success: true,
                message_id: Some(synthetic_message_id()),
                body: None,
                error: None,
            }
        }
    }
}

fn synthetic_message_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    format!("n8n-{millis}")
}
