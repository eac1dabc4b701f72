//! Wire types shared by the Vivéa site client and the submit-form function
//!
//! Field names on the wire follow the table API's French column names; the
//! Rust side uses English names with serde renames.

use serde::{Deserialize, Serialize};

pub mod catalog;
mod columns;
pub mod lead;
pub mod submission;
pub mod table;

pub use catalog::{Product, Statistic, Testimonial};
pub use lead::{
    LeadRequest, LeadStatus, ACQUISITION_SOURCE_WEBSITE, DEFAULT_PREFERRED_SLOT,
    DEFAULT_PRODUCT_OF_INTEREST,
};
pub use submission::{BackupStatus, FormSubmission, SubmitFormResponse, TrackingRecord};
pub use table::{Collection, Page};

/// Default recipient for lead notifications
pub const DEFAULT_CONTACT_EMAIL: &str = "contact@vivea.ca";

/// Phone number shown to visitors when every delivery path failed
pub const DEFAULT_CONTACT_PHONE: &str = "1-800-VIVEA-1";

/// Subject line used by every client-side delivery channel
pub const LEAD_SUBJECT: &str = "Nouvelle demande de test d'eau Vivéa";

/// Structured errors returned by the submit-form function.
///
/// `Display` yields the short `error` field of the JSON body; `message()`
/// yields the longer text shown to the visitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum ApiError {
    #[error("Données manquantes")]
    MissingFields,

    #[error("Email invalide")]
    InvalidEmail,

    #[error("Erreur serveur")]
    Internal,
}

impl ApiError {
    pub fn message(&self) -> &'static str {
        match self {
            ApiError::MissingFields => "Nom, email et téléphone sont requis",
            ApiError::InvalidEmail => "Veuillez saisir une adresse email valide",
            ApiError::Internal => "Une erreur technique est survenue. Veuillez réessayer.",
        }
    }

    /// HTTP status code the function answers with
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::MissingFields | ApiError::InvalidEmail => 400,
            ApiError::Internal => 500,
        }
    }

    pub fn to_response(&self) -> SubmitFormResponse {
        SubmitFormResponse {
            success: false,
            error: Some(self.to_string()),
            message: Some(self.message().to_string()),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_response_shape() {
        let body = serde_json::to_value(ApiError::MissingFields.to_response()).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Données manquantes");
        assert_eq!(body["message"], "Nom, email et téléphone sont requis");
        assert!(body.get("trackingId").is_none());
    }

    #[test]
    fn test_api_error_status_codes() {
        assert_eq!(ApiError::MissingFields.status_code(), 400);
        assert_eq!(ApiError::InvalidEmail.status_code(), 400);
        assert_eq!(ApiError::Internal.status_code(), 500);
    }
}
