use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Contact form payload as posted by the site and received by the function
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormSubmission {
    #[serde(rename = "nom", default)]
    pub name: String,

    #[serde(rename = "telephone", default)]
    pub phone: String,

    #[serde(default)]
    pub email: String,

    #[serde(rename = "adresse", default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(rename = "trackingId", default, skip_serializing_if = "Option::is_none")]
    pub tracking_id: Option<String>,
}

impl FormSubmission {
    pub fn new(name: impl Into<String>, phone: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
            email: email.into(),
            ..Default::default()
        }
    }

    pub fn with_tracking_id(mut self, tracking_id: impl Into<String>) -> Self {
        self.tracking_id = Some(tracking_id.into());
        self
    }

    /// Address if present and not blank
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref().filter(|s| !s.trim().is_empty())
    }

    /// Notes if present and not blank
    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref().filter(|s| !s.trim().is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackupStatus {
    PendingSync,
}

/// Entry of the local backup log, one per submission attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingRecord {
    pub id: String,
    #[serde(flatten)]
    pub submission: FormSubmission,
    pub timestamp: DateTime<Utc>,
    pub status: BackupStatus,
}

impl TrackingRecord {
    pub fn pending(tracking_id: impl Into<String>, submission: FormSubmission) -> Self {
        Self {
            id: tracking_id.into(),
            submission,
            timestamp: Utc::now(),
            status: BackupStatus::PendingSync,
        }
    }
}

/// JSON body answered by `/functions/submit-form`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitFormResponse {
    pub success: bool,

    #[serde(rename = "trackingId", default, skip_serializing_if = "Option::is_none")]
    pub tracking_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(rename = "emailSent", default, skip_serializing_if = "Option::is_none")]
    pub email_sent: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_fields_decode_as_empty() {
        let submission: FormSubmission =
            serde_json::from_value(json!({"email": "x@x.com"})).unwrap();
        assert_eq!(submission.name, "");
        assert_eq!(submission.phone, "");
        assert_eq!(submission.tracking_id, None);
    }

    #[test]
    fn test_tracking_record_flattens_form_fields() {
        let submission = FormSubmission::new("Ana Smith", "514-555-1234", "ana@example.com")
            .with_tracking_id("VIV-ABC-12345");
        let record = TrackingRecord::pending("VIV-ABC-12345", submission.clone());
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["id"], "VIV-ABC-12345");
        assert_eq!(value["nom"], "Ana Smith");
        assert_eq!(value["trackingId"], "VIV-ABC-12345");
        assert_eq!(value["status"], "pending_sync");

        let decoded: TrackingRecord = serde_json::from_value(value).unwrap();
        assert_eq!(decoded.submission, submission);
    }

    #[test]
    fn test_blank_optional_fields_are_ignored() {
        let mut submission = FormSubmission::new("Ana", "5145551234", "ana@example.com");
        submission.address = Some("   ".to_string());
        submission.notes = Some("Eau calcaire".to_string());
        assert_eq!(submission.address(), None);
        assert_eq!(submission.notes(), Some("Eau calcaire"));
    }
}
