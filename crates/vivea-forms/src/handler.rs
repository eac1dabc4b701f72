//! Client-side submission flow
//!
//! validate -> tracking id -> fallback chain -> one backup record -> outcome.
//! Validation failures stop before any network call or backup write.

use anyhow::{Context, Result};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};
use vivea_api::{FormSubmission, TrackingRecord};
use vivea_core::{
    generate_tracking_id, validate_submission, ChainReport, Delivery, DeliveryProvider,
    FallbackChain, PersistenceError, ValidationError,
};
use vivea_tables::{LeadDatabase, TableClient, TableConfig};

use crate::backup::{BackupStore, JsonFileBackup};
use crate::config::{Environment, SiteConfig};
use crate::providers::{MailtoProvider, RelayProvider, ServerlessProvider, TableApiProvider};

pub const SAVED_LOCALLY_MESSAGE: &str =
    "Votre demande a été sauvegardée. Nous vous contacterons bientôt !";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// A provider accepted the lead
    Delivered,
    /// Every provider failed but the backup record was written
    SavedLocally,
    /// Every provider failed and so did the backup
    Failed,
}

#[derive(Debug)]
pub struct SubmissionResult {
    pub tracking_id: String,
    pub report: ChainReport,
    pub backup: Result<(), PersistenceError>,
    contact_phone: String,
}

impl SubmissionResult {
    pub fn outcome(&self) -> Outcome {
        match (&self.report.delivery, &self.backup) {
            (Some(_), _) => Outcome::Delivered,
            (None, Ok(())) => Outcome::SavedLocally,
            (None, Err(_)) => Outcome::Failed,
        }
    }

    pub fn delivery(&self) -> Option<&Delivery> {
        self.report.delivery.as_ref()
    }

    pub fn is_success(&self) -> bool {
        self.outcome() != Outcome::Failed
    }

    /// Text shown to the visitor
    pub fn user_message(&self) -> String {
        match self.outcome() {
            Outcome::Delivered => {
                let confirmation =
                    format!("Demande envoyée ! Numéro de suivi : {}", self.tracking_id);
                match self.delivery().and_then(|d| d.message.as_deref()) {
                    Some(extra) => format!("{} {}", confirmation, extra),
                    None => confirmation,
                }
            }
            Outcome::SavedLocally => SAVED_LOCALLY_MESSAGE.to_string(),
            Outcome::Failed => format!(
                "Erreur technique. Veuillez nous appeler directement au {}",
                self.contact_phone
            ),
        }
    }

    pub fn summary(&self) -> SubmissionSummary {
        SubmissionSummary {
            success: self.is_success(),
            outcome: self.outcome(),
            tracking_id: self.tracking_id.clone(),
            service: self.delivery().map(|d| d.service.clone()),
            message: self.user_message(),
            handoff_url: self.delivery().and_then(|d| d.handoff_url.clone()),
            backed_up: self.backup.is_ok(),
        }
    }
}

/// Serializable view of a `SubmissionResult`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionSummary {
    pub success: bool,
    pub outcome: Outcome,
    pub tracking_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handoff_url: Option<String>,
    pub backed_up: bool,
}

pub struct FormHandler {
    chain: FallbackChain,
    backup: Arc<dyn BackupStore>,
    contact_phone: String,
}

impl FormHandler {
    pub fn new(
        chain: FallbackChain,
        backup: Arc<dyn BackupStore>,
        contact_phone: impl Into<String>,
    ) -> Self {
        Self {
            chain,
            backup,
            contact_phone: contact_phone.into(),
        }
    }

    /// Standard chain for `config`: table API (development only), serverless
    /// function, relay (when configured), mailto
    pub fn from_config(config: &SiteConfig) -> Result<Self> {
        let timeout = config.attempt_timeout();
        let mut providers: Vec<Arc<dyn DeliveryProvider>> = Vec::new();

        if config.environment == Environment::Development {
            let client = TableClient::new(
                &TableConfig::new(config.base_url.clone()).with_timeout(timeout),
            )
            .context("Failed to build table API client")?;
            providers.push(Arc::new(TableApiProvider::new(LeadDatabase::new(client))));
        }

        providers.push(Arc::new(
            ServerlessProvider::new(config.function_url(), timeout)
                .context("Failed to build serverless function client")?,
        ));

        if let Some(endpoint) = &config.relay_endpoint {
            providers.push(Arc::new(
                RelayProvider::new(endpoint.clone(), timeout)
                    .context("Failed to build relay client")?,
            ));
        }

        providers.push(Arc::new(MailtoProvider::new(config.contact_email.clone())));

        let chain = FallbackChain::new(providers).with_attempt_timeout(timeout);
        info!(
            "[FormHandler] Chain: {}",
            chain.providers().collect::<Vec<_>>().join(" -> ")
        );

        Ok(Self::new(
            chain,
            Arc::new(JsonFileBackup::new(config.backup_path.clone())),
            config.contact_phone.clone(),
        ))
    }

    pub fn chain(&self) -> &FallbackChain {
        &self.chain
    }

    #[tracing::instrument(name = "form.submit", skip(self, form))]
    pub async fn submit(&self, form: FormSubmission) -> Result<SubmissionResult, ValidationError> {
        validate_submission(&form).into_result()?;

        let tracking_id = generate_tracking_id();
        let submission = FormSubmission {
            tracking_id: Some(tracking_id.clone()),
            ..form
        };
        info!("[FormHandler] Submitting {}", tracking_id);

        let report = self.chain.deliver(&submission).await;

        let record = TrackingRecord::pending(tracking_id.clone(), submission);
        let backup = self.backup.append(&record).await;
        match (&backup, report.is_delivered()) {
            (Err(e), false) => error!(
                "[FormHandler] {} not delivered and backup failed: {}",
                tracking_id, e
            ),
            (Err(e), true) => warn!("[FormHandler] Backup of {} failed: {}", tracking_id, e),
            (Ok(()), _) => {}
        }

        Ok(SubmissionResult {
            tracking_id,
            report,
            backup,
            contact_phone: self.contact_phone.clone(),
        })
    }

    /// Locally backed-up requests, empty when the backup is unreadable
    pub async fn pending_requests(&self) -> Vec<TrackingRecord> {
        self.backup.pending().await
    }
}
