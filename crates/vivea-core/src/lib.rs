//! Core logic for Vivéa lead submissions
//!
//! This crate provides the pieces shared by the site client and the
//! submit-form function:
//! - `validate` - shape checks on name, phone and email
//! - `tracking` - `VIV-...` tracking identifiers
//! - `format` - display helpers (phone numbers, status labels, fr-CA dates)
//! - `delivery` - the `DeliveryProvider` trait and the sequential fallback chain
//! - `error` - error taxonomy
//! - `http` - reqwest helpers shared by every outgoing call

pub mod delivery;
pub mod error;
pub mod format;
pub mod http;
pub mod tracking;
pub mod validate;

pub use delivery::{
    AttemptRecord, ChainReport, ChainState, Delivery, DeliveryProvider, FallbackChain,
    ServiceTier, DEFAULT_ATTEMPT_TIMEOUT,
};
pub use error::{DeliveryError, PersistenceError, ValidationError};
pub use format::{
    format_created_at, format_date_short, format_display, format_long_date, format_long_datetime,
    format_phone_number, status_label, DisplayLead,
};
pub use tracking::{generate_tracking_id, is_tracking_id, to_base36};
pub use validate::{is_valid_email, validate_lead, validate_submission, Validation};
