use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;
use vivea_core::http::{describe_reqwest_error, traced_headers};

use super::{json_bearer_headers, provider_client, EmailError, EmailMessage, EmailSender};

const PROVIDER: &str = "sendgrid";

#[derive(Serialize)]
struct Address<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct Personalization<'a> {
    to: [Address<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    value: &'a str,
}

#[derive(Serialize)]
struct MailSend<'a> {
    personalizations: [Personalization<'a>; 1],
    from: Address<'a>,
    subject: &'a str,
    content: [Content<'a>; 2],
}

impl<'a> MailSend<'a> {
    fn from_message(message: &'a EmailMessage) -> Self {
        Self {
            personalizations: [Personalization {
                to: [Address { email: &message.to }],
            }],
            from: Address {
                email: &message.from,
            },
            subject: &message.subject,
            // text/plain has to come first
            content: [
                Content {
                    kind: "text/plain",
                    value: &message.text,
                },
                Content {
                    kind: "text/html",
                    value: &message.html,
                },
            ],
        }
    }
}

pub struct SendGridSender {
    url: String,
    client: reqwest::Client,
    default_headers: HeaderMap,
}

impl SendGridSender {
    pub fn new(api_key: String, url: String, timeout: Duration) -> Result<Self, EmailError> {
        Ok(Self {
            url,
            client: provider_client(PROVIDER, timeout)?,
            default_headers: json_bearer_headers(PROVIDER, &api_key)?,
        })
    }
}

#[async_trait]
impl EmailSender for SendGridSender {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError> {
        debug!("[SendGridSender] POST {} to {}", self.url, message.to);

        let response = self
            .client
            .post(&self.url)
            .headers(traced_headers(&self.default_headers))
            .json(&MailSend::from_message(message))
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mail_send_payload_shape() {
        let message = EmailMessage {
            to: "contact@vivea.ca".into(),
            from: "noreply@vivea.ca".into(),
            subject: "Sujet".into(),
            html: "<p>x</p>".into(),
            text: "x".into(),
        };

        let value = serde_json::to_value(MailSend::from_message(&message)).unwrap();

        assert_eq!(value["personalizations"][0]["to"][0]["email"], "contact@vivea.ca");
        assert_eq!(value["from"]["email"], "noreply@vivea.ca");
        assert_eq!(value["content"][0]["type"], "text/plain");
        assert_eq!(value["content"][1]["value"], "<p>x</p>");
    }
}
