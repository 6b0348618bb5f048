//! Core library for Hermes.
//!
//! Contains the lead submission model and validation, country/dial-code
//! reference data, lead id generation, the wizard step state machine, and
//! asset catalog resolution. This crate performs no I/O and knows nothing
//! about HTTP, the database, or the automation webhook.

pub mod assets;
pub mod country;
pub mod error;
pub mod lead;
pub mod lead_id;
pub mod wizard;
