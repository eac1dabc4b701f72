//! `/functions/submit-form`
//!
//! - `OPTIONS` - CORS preflight
//! - `POST` - validate, email the lead, snapshot it to KV, answer with the
//!   tracking id
//!
//! Email dispatch and KV persistence never fail the request; their errors are
//! logged and reported through `emailSent` only.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
};
use axum::http::{HeaderMap, HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use chrono::{Local, Utc};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use vivea_api::{ApiError, FormSubmission, SubmitFormResponse};
use vivea_core::{generate_tracking_id, is_tracking_id, is_valid_email};

use crate::config::FunctionConfig;
use crate::email::{select_sender, EmailMessage, EmailSender};
use crate::kv::{put_snapshot, CloudflareKv, KvStore, RequestSnapshot, UNKNOWN_COUNTRY};

pub const SUBMIT_FORM_PATH: &str = "/functions/submit-form";
pub const FUNCTION_SERVICE: &str = "cloudflare-pages";
pub const SUCCESS_MESSAGE: &str = "Votre demande a été envoyée avec succès";

const CLIENT_IP_HEADER: &str = "cf-connecting-ip";
const COUNTRY_HEADER: &str = "cf-ipcountry";

#[derive(Clone)]
pub struct FunctionState {
    pub contact_email: String,
    pub from_email: String,
    pub email: Option<Arc<dyn EmailSender>>,
    pub kv: Option<Arc<dyn KvStore>>,
}

impl FunctionState {
    pub fn new(contact_email: impl Into<String>, from_email: impl Into<String>) -> Self {
        Self {
            contact_email: contact_email.into(),
            from_email: from_email.into(),
            email: None,
            kv: None,
        }
    }

    pub fn from_config(config: &FunctionConfig) -> anyhow::Result<Self> {
        let mut state = Self::new(config.contact_email.clone(), config.from_email.clone());
        state.email = select_sender(config)?;
        if let Some(kv) = &config.kv {
            state.kv = Some(Arc::new(CloudflareKv::new(kv, config.provider_timeout)?));
        }
        Ok(state)
    }

    pub fn with_email_sender(mut self, sender: Arc<dyn EmailSender>) -> Self {
        self.email = Some(sender);
        self
    }

    pub fn with_kv_store(mut self, store: Arc<dyn KvStore>) -> Self {
        self.kv = Some(store);
        self
    }
}

pub fn create_submit_form_router(state: FunctionState) -> Router {
    Router::new()
        .route(SUBMIT_FORM_PATH, post(submit_form).options(preflight))
        .with_state(state)
}

fn cors_headers() -> [(HeaderName, &'static str); 3] {
    [
        (ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
        (ACCESS_CONTROL_ALLOW_METHODS, "GET, POST, OPTIONS"),
        (ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
    ]
}

fn json_response(status: StatusCode, body: SubmitFormResponse) -> Response {
    (status, cors_headers(), Json(body)).into_response()
}

async fn preflight() -> Response {
    (StatusCode::OK, cors_headers()).into_response()
}

#[tracing::instrument(name = "function.submit_form", skip_all)]
async fn submit_form(
    State(state): State<FunctionState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    match accept(&state, &headers, &body).await {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(e) => {
            let status =
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            json_response(status, e.to_response())
        }
    }
}

/// String form of a JSON field. Falsy values (missing, null, empty string,
/// `false`, `0`) count as absent.
fn text_field(payload: &Value, key: &str) -> Option<String> {
    match payload.get(key)? {
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Null | Value::Bool(false) => None,
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(other.to_string()),
    }
}

/// Form fields out of an arbitrary JSON payload
pub fn parse_submission(payload: &Value) -> Result<FormSubmission, ApiError> {
    let (Some(name), Some(phone), Some(email)) = (
        text_field(payload, "nom"),
        text_field(payload, "telephone"),
        text_field(payload, "email"),
    ) else {
        return Err(ApiError::MissingFields);
    };
    Ok(FormSubmission {
        name,
        phone,
        email,
        address: text_field(payload, "adresse"),
        notes: text_field(payload, "notes"),
        tracking_id: text_field(payload, "trackingId"),
    })
}

fn header_text(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn accept(
    state: &FunctionState,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<SubmitFormResponse, ApiError> {
    let payload: Value = serde_json::from_slice(body).map_err(|e| {
        error!("[SubmitForm] Unreadable request body: {}", e);
        ApiError::Internal
    })?;

    let submission = parse_submission(&payload)?;
    if !is_valid_email(&submission.email) {
        return Err(ApiError::InvalidEmail);
    }

    let tracking_id = match submission.tracking_id.as_deref() {
        Some(id) if is_tracking_id(id) => id.to_string(),
        Some(id) => {
            warn!("[SubmitForm] Ignoring malformed client tracking id '{}'", id);
            generate_tracking_id()
        }
        None => generate_tracking_id(),
    };
    info!("[SubmitForm] Accepted request {}", tracking_id);

    let email_sent = match &state.email {
        Some(sender) => {
            let message = EmailMessage::for_lead(
                &submission,
                &tracking_id,
                &state.contact_email,
                &state.from_email,
                &Local::now(),
            );
            match sender.send(&message).await {
                Ok(()) => {
                    info!(
                        "[SubmitForm] Notification for {} sent via {}",
                        tracking_id,
                        sender.name()
                    );
                    true
                }
                Err(e) => {
                    error!("[SubmitForm] Email dispatch failed for {}: {}", tracking_id, e);
                    false
                }
            }
        }
        None => {
            debug!("[SubmitForm] No email provider configured");
            false
        }
    };

    if let Some(kv) = &state.kv {
        let snapshot = RequestSnapshot {
            id: tracking_id.clone(),
            submission,
            timestamp: Utc::now(),
            ip: header_text(headers, CLIENT_IP_HEADER),
            country: header_text(headers, COUNTRY_HEADER)
                .unwrap_or_else(|| UNKNOWN_COUNTRY.to_string()),
        };
        if let Err(e) = put_snapshot(kv.as_ref(), &snapshot).await {
            error!("[SubmitForm] KV write failed for {}: {}", tracking_id, e);
        }
    }

    Ok(SubmitFormResponse {
        success: true,
        tracking_id: Some(tracking_id),
        message: Some(SUCCESS_MESSAGE.to_string()),
        email_sent: Some(email_sent),
        service: Some(FUNCTION_SERVICE.to_string()),
        error: None,
    })
}
