//! Lead notification email: rendering and the provider senders
//!
//! Exactly one sender is used per request. Resend wins when both
//! credentials are configured.

pub mod render;
pub mod resend;
pub mod sendgrid;

pub use resend::ResendSender;
pub use sendgrid::SendGridSender;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Serialize;
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use vivea_api::FormSubmission;
use vivea_core::http::build_client;

use crate::config::FunctionConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailMessage {
    pub to: String,
    pub from: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

impl EmailMessage {
    pub fn for_lead<Tz: TimeZone>(
        submission: &FormSubmission,
        tracking_id: &str,
        to: &str,
        from: &str,
        received_at: &DateTime<Tz>,
    ) -> Self
    where
        Tz::Offset: Display,
    {
        Self {
            to: to.to_string(),
            from: from.to_string(),
            subject: render::subject(tracking_id),
            html: render::render_html(submission, tracking_id, received_at),
            text: render::render_text(submission, tracking_id, received_at),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmailError {
    #[error("{provider}: {message}")]
    Transport { provider: String, message: String },

    #[error("{provider} API error: {status}")]
    Http { provider: String, status: u16 },

    #[error("{provider}: API key is not a valid header value")]
    InvalidCredential { provider: String },

    #[error("{provider}: failed to build HTTP client: {message}")]
    Client { provider: String, message: String },
}

/// Default headers shared by both providers
fn json_bearer_headers(provider: &str, api_key: &str) -> Result<HeaderMap, EmailError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    let auth = HeaderValue::from_str(&format!("Bearer {}", api_key)).map_err(|_| {
        EmailError::InvalidCredential {
            provider: provider.to_string(),
        }
    })?;
    headers.insert(AUTHORIZATION, auth);
    Ok(headers)
}

fn provider_client(provider: &str, timeout: Duration) -> Result<reqwest::Client, EmailError> {
    build_client(timeout).map_err(|e| EmailError::Client {
        provider: provider.to_string(),
        message: e.to_string(),
    })
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    fn name(&self) -> &str;

    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError>;
}

/// Sender for the configured credential, Resend first, then SendGrid
pub fn select_sender(config: &FunctionConfig) -> Result<Option<Arc<dyn EmailSender>>, EmailError> {
    if let Some(key) = &config.resend_api_key {
        let sender =
            ResendSender::new(key.clone(), config.resend_url.clone(), config.provider_timeout)?;
        return Ok(Some(Arc::new(sender)));
    }
    if let Some(key) = &config.sendgrid_api_key {
        let sender =
            SendGridSender::new(key.clone(), config.sendgrid_url.clone(), config.provider_timeout)?;
        return Ok(Some(Arc::new(sender)));
    }
    Ok(None)
}
