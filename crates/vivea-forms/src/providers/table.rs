use async_trait::async_trait;
use chrono::{Duration, Utc};
use vivea_api::{FormSubmission, LeadRequest};
use vivea_core::{Delivery, DeliveryError, DeliveryProvider, ServiceTier};
use vivea_tables::{LeadDatabase, TableError};

pub const TABLE_SERVICE: &str = "table-api";
pub const CONTACT_FORM_NOTE: &str = "Demande via formulaire de contact du site web";

/// Development stage: write the lead straight into `test_requests`
pub struct TableApiProvider {
    database: LeadDatabase,
}

impl TableApiProvider {
    pub fn new(database: LeadDatabase) -> Self {
        Self { database }
    }

    /// Lead row for a contact-form submission, preferred date set to tomorrow
    pub fn lead_from(submission: &FormSubmission) -> LeadRequest {
        let mut lead = LeadRequest::new(&submission.name, &submission.phone, &submission.email);
        lead.address = submission.address().unwrap_or_default().to_string();
        lead.preferred_date = Some(Utc::now() + Duration::hours(24));
        lead.notes = match submission.notes() {
            Some(notes) => format!("{}\n{}", CONTACT_FORM_NOTE, notes),
            None => CONTACT_FORM_NOTE.to_string(),
        };
        lead
    }
}

fn delivery_error(e: TableError) -> DeliveryError {
    match e {
        TableError::Http { status, .. } => DeliveryError::Http {
            provider: TABLE_SERVICE.to_string(),
            status,
        },
        TableError::Transport(message) | TableError::Client(message) => {
            DeliveryError::Transport {
                provider: TABLE_SERVICE.to_string(),
                message,
            }
        }
        TableError::Decode { message, .. } => DeliveryError::Provider {
            provider: TABLE_SERVICE.to_string(),
            message,
        },
    }
}

#[async_trait]
impl DeliveryProvider for TableApiProvider {
    fn name(&self) -> &str {
        TABLE_SERVICE
    }

    fn tier(&self) -> ServiceTier {
        ServiceTier::Development
    }

    async fn deliver(&self, submission: &FormSubmission) -> Result<Delivery, DeliveryError> {
        let created = self
            .database
            .create_test_request(&Self::lead_from(submission))
            .await
            .map_err(delivery_error)?;

        let mut delivery = Delivery::new(TABLE_SERVICE, ServiceTier::Development)
            .with_tracking_id(submission.tracking_id.clone());
        if let Some(id) = created.id {
            delivery = delivery.with_message(format!("Demande enregistrée ({})", id));
        }
        Ok(delivery)
    }
}
