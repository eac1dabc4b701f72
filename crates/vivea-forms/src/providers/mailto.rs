use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tracing::info;
use vivea_api::{FormSubmission, LEAD_SUBJECT};
use vivea_core::{Delivery, DeliveryError, DeliveryProvider, ServiceTier};

use crate::message::mailto_body_now;

pub const MAILTO_SERVICE: &str = "mailto";
pub const MAILTO_GUIDANCE: &str =
    "Votre client email va s'ouvrir avec les informations pré-remplies.";

/// Characters left as-is by URI component encoding
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

/// `mailto:` link with an encoded subject and body
pub fn mailto_link(to: &str, subject: &str, body: &str) -> String {
    format!(
        "mailto:{}?subject={}&body={}",
        to,
        encode_component(subject),
        encode_component(body)
    )
}

/// Tertiary stage: hand the lead to the visitor's mail client
///
/// Nothing is sent from here, so this stage never fails. The link is carried
/// in the delivery for the caller to open.
pub struct MailtoProvider {
    contact_email: String,
}

impl MailtoProvider {
    pub fn new(contact_email: impl Into<String>) -> Self {
        Self {
            contact_email: contact_email.into(),
        }
    }

    pub fn link_for(&self, submission: &FormSubmission) -> String {
        mailto_link(&self.contact_email, LEAD_SUBJECT, &mailto_body_now(submission))
    }
}

#[async_trait]
impl DeliveryProvider for MailtoProvider {
    fn name(&self) -> &str {
        MAILTO_SERVICE
    }

    fn tier(&self) -> ServiceTier {
        ServiceTier::Tertiary
    }

    async fn deliver(&self, submission: &FormSubmission) -> Result<Delivery, DeliveryError> {
        info!("[MailtoProvider] Handing off to mail client for {}", self.contact_email);
        Ok(Delivery::new(MAILTO_SERVICE, ServiceTier::Tertiary)
            .with_tracking_id(submission.tracking_id.clone())
            .with_message(MAILTO_GUIDANCE)
            .with_handoff_url(self.link_for(submission)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_encoding() {
        assert_eq!(encode_component("a b&c=d"), "a%20b%26c%3Dd");
        assert_eq!(encode_component("l'eau (test)!"), "l'eau%20(test)!");
        assert_eq!(encode_component("Vivéa"), "Viv%C3%A9a");
        assert_eq!(encode_component("ligne\nsuivante"), "ligne%0Asuivante");
    }

    #[test]
    fn test_mailto_link() {
        let link = mailto_link("contact@vivea.ca", "Sujet d'essai", "Nom: Ana");
        assert_eq!(
            link,
            "mailto:contact@vivea.ca?subject=Sujet%20d'essai&body=Nom%3A%20Ana"
        );
    }

    #[tokio::test]
    async fn test_mailto_always_succeeds() {
        let provider = MailtoProvider::new("contact@vivea.ca");
        let submission = FormSubmission::new("Ana Smith", "514-555-1234", "ana@example.com")
            .with_tracking_id("VIV-LOYW3V28-ABCDE");

        let delivery = provider.deliver(&submission).await.unwrap();

        assert_eq!(delivery.service, "mailto");
        assert_eq!(delivery.tracking_id.as_deref(), Some("VIV-LOYW3V28-ABCDE"));
        assert_eq!(delivery.message.as_deref(), Some(MAILTO_GUIDANCE));
        let url = delivery.handoff_url.unwrap();
        assert!(url.starts_with("mailto:contact@vivea.ca?subject=Nouvelle%20demande"));
        assert!(url.contains("Ana%20Smith"));
    }
}
