//! CAPTCHA verification gate.
//!
//! Verifies a client-acquired bot-detection token against the provider's
//! siteverify endpoint just before a submission is accepted. The score
//! threshold comes from configuration and is stricter in production.
//! When no provider secret is configured the gate reports "not
//! available" and callers decide whether to proceed without it.

use serde::Deserialize;
use tracing::debug;

use crate::config::CaptchaConfig;

/// Why the gate refused a submission.
#[derive(Debug, thiserror::Error)]
pub enum CaptchaError {
    /// No provider secret configured — verification cannot run.
    #[error("security verification not available")]
    NotAvailable,

    /// The client handed us an empty token.
    #[error("security verification token generation failed")]
    TokenGenerationFailed,

    /// The provider rejected the token or the score was too low.
    #[error("security verification failed: {reason}")]
    Rejected { reason: String },

    /// The provider could not be reached.
    #[error("security verification request failed: {0}")]
    Transport(String),
}

/// Provider siteverify response.
#[derive(Debug, Deserialize)]
struct VerifyResponse {
    success: bool,
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    action: Option<String>,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

/// Score-based verification gate.
#[derive(Debug, Clone)]
pub struct CaptchaVerifier {
    client: reqwest::Client,
    verify_url: String,
    secret: Option<String>,
    min_score: f64,
}

impl CaptchaVerifier {
    #[must_use]
    pub fn new(client: reqwest::Client, config: &CaptchaConfig) -> Self {
        Self {
            client,
            verify_url: config.verify_url.clone(),
            secret: config.secret.clone(),
            min_score: config.min_score,
        }
    }

    /// Whether a provider secret is configured.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.secret.is_some()
    }

    /// Verify a token for a named action (the action tag distinguishes
    /// contact-form submissions from wizard submissions).
    ///
    /// # Errors
    ///
    /// - [`CaptchaError::NotAvailable`] when no secret is configured
    /// - [`CaptchaError::TokenGenerationFailed`] for an empty token
    /// - [`CaptchaError::Rejected`] when the provider says no, the score
    ///   is below the threshold, or the action tag does not match
    /// - [`CaptchaError::Transport`] when the provider is unreachable
    pub async fn verify(&self, token: &str, action: &str) -> Result<(), CaptchaError> {
        let Some(secret) = &self.secret else {
            return Err(CaptchaError::NotAvailable);
        };
        if token.trim().is_empty() {
            return Err(CaptchaError::TokenGenerationFailed);
        }

        let response = self
            .client
            .post(&self.verify_url)
            .form(&[("secret", secret.as_str()), ("response", token)])
            .send()
            .await
            .map_err(|e| CaptchaError::Transport(e.to_string()))?;

        let body: VerifyResponse = response
            .json()
            .await
            .map_err(|e| CaptchaError::Transport(format!("unreadable verify response: {e}")))?;

        if !body.success {
            return Err(CaptchaError::Rejected {
                reason: if body.error_codes.is_empty() {
                    "provider rejected token".to_owned()
                } else {
                    body.error_codes.join(", ")
                },
            });
        }

        if let Some(score) = body.score {
            if score < self.min_score {
                return Err(CaptchaError::Rejected {
                    reason: format!("score {score} below threshold {}", self.min_score),
                });
            }
        }

        if let Some(reported) = &body.action {
            if reported != action {
                return Err(CaptchaError::Rejected {
                    reason: format!("action mismatch: expected {action}, got {reported}"),
                });
            }
        }

        debug!(action, "captcha token verified");
        Ok(())
    }
}
