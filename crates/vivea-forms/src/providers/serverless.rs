use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use std::time::Duration;
use tracing::{debug, warn};
use vivea_api::{FormSubmission, SubmitFormResponse};
use vivea_core::http::{build_client, snippet, traced_headers};
use vivea_core::{Delivery, DeliveryError, DeliveryProvider, ServiceTier};

use super::transport_error;

pub const SERVERLESS_SERVICE: &str = "cloudflare-pages";

/// Primary stage: POST the form to the site's own submit-form function
///
/// Success needs both a 2xx status and `success: true` in the body.
pub struct ServerlessProvider {
    url: String,
    client: reqwest::Client,
    default_headers: HeaderMap,
}

impl ServerlessProvider {
    pub fn new(url: impl Into<String>, timeout: Duration) -> reqwest::Result<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        Ok(Self {
            url: url.into(),
            client: build_client(timeout)?,
            default_headers,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl DeliveryProvider for ServerlessProvider {
    fn name(&self) -> &str {
        SERVERLESS_SERVICE
    }

    fn tier(&self) -> ServiceTier {
        ServiceTier::Primary
    }

    async fn deliver(&self, submission: &FormSubmission) -> Result<Delivery, DeliveryError> {
        debug!("[ServerlessProvider] POST {}", self.url);
        let response = self
            .client
            .post(&self.url)
            .headers(traced_headers(&self.default_headers))
            .json(submission)
            .send()
            .await
            .map_err(|e| transport_error(SERVERLESS_SERVICE, &e, &self.url))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(SERVERLESS_SERVICE, &e, &self.url))?;

        if !status.is_success() {
            warn!(
                "[ServerlessProvider] HTTP {} from {}: {}",
                status,
                self.url,
                snippet(&body, 200)
            );
            return Err(DeliveryError::Http {
                provider: SERVERLESS_SERVICE.to_string(),
                status: status.as_u16(),
            });
        }

        let answer: SubmitFormResponse =
            serde_json::from_str(&body).map_err(|e| DeliveryError::Provider {
                provider: SERVERLESS_SERVICE.to_string(),
                message: format!("unreadable response: {}", e),
            })?;

        if !answer.success {
            return Err(DeliveryError::Provider {
                provider: SERVERLESS_SERVICE.to_string(),
                message: answer
                    .error
                    .or(answer.message)
                    .unwrap_or_else(|| "success flag not set".to_string()),
            });
        }

        if answer.tracking_id.is_some() && answer.tracking_id != submission.tracking_id {
            warn!(
                "[ServerlessProvider] Function answered tracking id {:?}, submitted {:?}",
                answer.tracking_id, submission.tracking_id
            );
        }

        let mut delivery = Delivery::new(SERVERLESS_SERVICE, ServiceTier::Primary)
            .with_tracking_id(answer.tracking_id.or_else(|| submission.tracking_id.clone()));
        if let Some(message) = answer.message {
            delivery = delivery.with_message(message);
        }
        Ok(delivery)
    }
}
