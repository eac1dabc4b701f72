use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};
use vivea_api::{FormSubmission, LEAD_SUBJECT};
use vivea_core::http::{build_client, snippet, traced_headers};
use vivea_core::{Delivery, DeliveryError, DeliveryProvider, ServiceTier};

use super::transport_error;
use crate::message::relay_message_now;

pub const RELAY_SERVICE: &str = "formspree";

/// Form fields accepted by the relay
#[derive(Debug, Clone, Serialize)]
pub struct RelayPayload<'a> {
    pub name: &'a str,
    pub phone: &'a str,
    pub email: &'a str,
    pub subject: &'a str,
    pub message: String,
}

impl<'a> RelayPayload<'a> {
    pub fn from_submission(submission: &'a FormSubmission) -> Self {
        Self {
            name: &submission.name,
            phone: &submission.phone,
            email: &submission.email,
            subject: LEAD_SUBJECT,
            message: relay_message_now(submission),
        }
    }
}

/// Secondary stage: third-party form-to-email relay, success on any 2xx
pub struct RelayProvider {
    endpoint: String,
    client: reqwest::Client,
    default_headers: HeaderMap,
}

impl RelayProvider {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> reqwest::Result<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        Ok(Self {
            endpoint: endpoint.into(),
            client: build_client(timeout)?,
            default_headers,
        })
    }
}

#[async_trait]
impl DeliveryProvider for RelayProvider {
    fn name(&self) -> &str {
        RELAY_SERVICE
    }

    fn tier(&self) -> ServiceTier {
        ServiceTier::Secondary
    }

    async fn deliver(&self, submission: &FormSubmission) -> Result<Delivery, DeliveryError> {
        debug!("[RelayProvider] POST {}", self.endpoint);
        let response = self
            .client
            .post(&self.endpoint)
            .headers(traced_headers(&self.default_headers))
            .json(&RelayPayload::from_submission(submission))
            .send()
            .await
            .map_err(|e| transport_error(RELAY_SERVICE, &e, &self.endpoint))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                "[RelayProvider] HTTP {} from relay: {}",
                status,
                snippet(&body, 200)
            );
            return Err(DeliveryError::Http {
                provider: RELAY_SERVICE.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(Delivery::new(RELAY_SERVICE, ServiceTier::Secondary)
            .with_tracking_id(submission.tracking_id.clone()))
    }
}
