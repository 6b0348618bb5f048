//! Error types for `hermes-core`.
//!
//! Each variant carries enough context to diagnose the problem without a
//! debugger. Validation errors name the offending field so callers can
//! surface per-field messages.

/// Errors from validating a lead submission.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// A required field is empty or missing.
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    /// The email address is structurally invalid.
    #[error("invalid email address: {value}")]
    InvalidEmail { value: String },

    /// The country code is not in the reference table.
    #[error("unknown country code: {code}")]
    UnknownCountry { code: String },

    /// The phone number is not valid E.164 for the selected country.
    #[error("invalid phone number: {reason}")]
    InvalidPhone { reason: String },

    /// A mandatory consent checkbox was not ticked.
    #[error("consent required: {field}")]
    ConsentRequired { field: &'static str },

    /// The urgency tier string was not recognized.
    #[error("unknown urgency tier: {value}")]
    UnknownUrgency { value: String },
}

/// Errors from wizard navigation operations.
#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    /// The step index is outside the step table.
    #[error("step index {index} out of range (table has {len} steps)")]
    OutOfRange { index: usize, len: usize },

    /// Edit mode can only be entered from the summary step.
    #[error("edit mode is only available from the summary step")]
    NotOnSummary,

    /// Only completed sections can be edited from the summary.
    #[error("step {index} has not been completed")]
    StepNotCompleted { index: usize },

    /// The target step is disabled by its service condition.
    #[error("step {index} is disabled by its service condition")]
    StepDisabled { index: usize },
}
