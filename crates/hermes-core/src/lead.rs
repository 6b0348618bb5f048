//! Lead submission model and validation.
//!
//! A [`LeadSubmission`] is the client-constructed payload gathered by the
//! contact form or a wizard. [`LeadSubmission::validate`] enforces the
//! submission invariants: required fields non-empty, mandatory consents
//! ticked, known country, and an E.164 phone number whose national part
//! matches the country's configured digit range.

use serde::{Deserialize, Serialize};

use crate::country;
use crate::error::ValidationError;

/// Field names the backup endpoint requires to be truthy, in the casing
/// the wire format uses. A request missing any of these is rejected with
/// HTTP 400 before anything is persisted.
pub const REQUIRED_FIELDS: &[&str] = &[
    "firstName",
    "lastName",
    "email",
    "country",
    "phoneNumber",
    "problemDescription",
    "serviceUrgency",
    "agreeToTerms",
    "privacyConsent",
];

/// How soon the prospect needs the engagement to start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    /// Active incident or hard deadline.
    Urgent,
    /// Within the next quarter.
    Soon,
    /// Budgeting or comparing vendors.
    Exploring,
}

impl Urgency {
    /// Notification priority derived from the tier: 1 is highest.
    ///
    /// Used for the `X-Priority` style header on fallback notifications.
    #[must_use]
    pub const fn priority(self) -> u8 {
        match self {
            Self::Urgent => 1,
            Self::Soon => 2,
            Self::Exploring => 3,
        }
    }
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Urgent => write!(f, "urgent"),
            Self::Soon => write!(f, "soon"),
            Self::Exploring => write!(f, "exploring"),
        }
    }
}

impl std::str::FromStr for Urgency {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "urgent" => Ok(Self::Urgent),
            "soon" => Ok(Self::Soon),
            "exploring" => Ok(Self::Exploring),
            other => Err(ValidationError::UnknownUrgency {
                value: other.to_owned(),
            }),
        }
    }
}

/// A fully-filled lead inquiry, as captured by the contact form or the
/// needs-assessment wizard. Transient — exists only until submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadSubmission {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// ISO 3166-1 alpha-2 code.
    pub country: String,
    /// E.164 phone number (`+<countrycode><digits>`).
    pub phone_number: String,
    #[serde(default)]
    pub role: Option<String>,
    pub problem_description: String,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub company_size: Option<String>,
    pub service_urgency: Urgency,
    pub agree_to_terms: bool,
    pub privacy_consent: bool,
    #[serde(default)]
    pub marketing_opt_in: bool,
    /// Short-lived bot-detection token. Never surfaced back to callers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captcha_token: Option<String>,
}

impl LeadSubmission {
    /// Validate the submission invariants.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant: a missing field, malformed
    /// email, unknown country, out-of-shape phone number, or an unticked
    /// mandatory consent.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("firstName", &self.first_name)?;
        require("lastName", &self.last_name)?;
        require("email", &self.email)?;
        require("country", &self.country)?;
        require("phoneNumber", &self.phone_number)?;
        require("problemDescription", &self.problem_description)?;

        validate_email(&self.email)?;

        let info = country::lookup(&self.country).ok_or_else(|| {
            ValidationError::UnknownCountry {
                code: self.country.clone(),
            }
        })?;

        country::validate_e164(info, self.phone_number.trim())
            .map_err(|reason| ValidationError::InvalidPhone { reason })?;

        if !self.agree_to_terms {
            return Err(ValidationError::ConsentRequired {
                field: "agreeToTerms",
            });
        }
        if !self.privacy_consent {
            return Err(ValidationError::ConsentRequired {
                field: "privacyConsent",
            });
        }

        Ok(())
    }
}

fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField { field });
    }
    Ok(())
}

/// Structural email check: one `@`, non-empty local part, and a domain
/// containing a dot. Deliverability is the webhook consumer's problem.
fn validate_email(email: &str) -> Result<(), ValidationError> {
    let invalid = || ValidationError::InvalidEmail {
        value: email.to_owned(),
    };

    let (local, domain) = email.trim().split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err(invalid());
    }
    if domain.starts_with('.') || domain.ends_with('.') {
        return Err(invalid());
    }

    Ok(())
}
