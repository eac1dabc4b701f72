//! Shape-only validation of contact form fields
//!
//! Nothing is normalized here: a value either has the expected shape or an
//! error message is added, in field order (name, phone, email).

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use vivea_api::FormSubmission;

use crate::error::ValidationError;

pub const NAME_ERROR: &str = "Le nom doit contenir au moins 2 caractères";
pub const PHONE_ERROR: &str = "Veuillez saisir un numéro de téléphone valide";
pub const EMAIL_ERROR: &str = "Veuillez saisir une adresse email valide";

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+]?[0-9\s\-().]{10,}$").expect("phone pattern is valid"));

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Validation {
    #[serde(rename = "isValid")]
    pub is_valid: bool,
    pub errors: Vec<String>,
}

impl Validation {
    pub fn into_result(self) -> Result<(), ValidationError> {
        if self.is_valid {
            Ok(())
        } else {
            Err(ValidationError {
                errors: self.errors,
            })
        }
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}

pub fn validate_lead(name: &str, phone: &str, email: &str) -> Validation {
    let mut errors = Vec::new();

    if name.trim().chars().count() < 2 {
        errors.push(NAME_ERROR.to_string());
    }
    if !is_valid_phone(phone) {
        errors.push(PHONE_ERROR.to_string());
    }
    if !is_valid_email(email) {
        errors.push(EMAIL_ERROR.to_string());
    }

    Validation {
        is_valid: errors.is_empty(),
        errors,
    }
}

pub fn validate_submission(submission: &FormSubmission) -> Validation {
    validate_lead(&submission.name, &submission.phone, &submission.email)
}
