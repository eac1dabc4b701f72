use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;
use vivea_core::http::{describe_reqwest_error, traced_headers};

use super::{json_bearer_headers, provider_client, EmailError, EmailMessage, EmailSender};

const PROVIDER: &str = "resend";

#[derive(Serialize)]
struct ResendEmail<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    text: &'a str,
}

pub struct ResendSender {
    url: String,
    client: reqwest::Client,
    default_headers: HeaderMap,
}

impl ResendSender {
    pub fn new(api_key: String, url: String, timeout: Duration) -> Result<Self, EmailError> {
        Ok(Self {
            url,
            client: provider_client(PROVIDER, timeout)?,
            default_headers: json_bearer_headers(PROVIDER, &api_key)?,
        })
    }
}

#[async_trait]
impl EmailSender for ResendSender {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError> {
        let body = ResendEmail {
            from: &message.from,
            to: [&message.to],
            subject: &message.subject,
            html: &message.html,
            text: &message.text,
        };
        debug!("[ResendSender] POST {} to {}", self.url, message.to);

        let response = self
            .client
            .post(&self.url)
            .headers(traced_headers(&self.default_headers))
            .json(&body)
            .send()
            .await
            .map_err(|e| EmailError::Transport {
                provider: PROVIDER.to_string(),
                message: describe_reqwest_error(&e, &self.url, "send email"),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(EmailError::Http {
                provider: PROVIDER.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}
