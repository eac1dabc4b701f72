//! Sequential fallback chain over delivery providers
//!
//! Providers are tried in list order, one attempt each, never in parallel.
//! The first success ends the chain; every failure (transport, HTTP,
//! rejection, timeout) moves on to the next provider. When the list is
//! exhausted the chain ends in `ChainState::Fallback` and the caller relies
//! on its local backup.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use vivea_api::FormSubmission;

use crate::error::DeliveryError;

pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(10);

/// Position of a provider in the preference order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceTier {
    /// Direct write to the table API, only tried in development
    Development,
    /// Same-origin serverless function
    Primary,
    /// External email relay
    Secondary,
    /// Mail-client handoff
    Tertiary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ChainState {
    Idle,
    Attempting(ServiceTier),
    /// Every provider failed
    Fallback,
    Done,
}

/// Receipt of a successful delivery
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Delivery {
    /// Provider name, e.g. `cloudflare-pages`, `formspree`, `mailto`
    pub service: String,
    pub tier: ServiceTier,
    #[serde(rename = "trackingId", skip_serializing_if = "Option::is_none")]
    pub tracking_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Link the visitor has to open to finish the handoff (mailto)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handoff_url: Option<String>,
}

impl Delivery {
    pub fn new(service: impl Into<String>, tier: ServiceTier) -> Self {
        Self {
            service: service.into(),
            tier,
            tracking_id: None,
            message: None,
            handoff_url: None,
        }
    }

    pub fn with_tracking_id(mut self, tracking_id: Option<String>) -> Self {
        self.tracking_id = tracking_id;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_handoff_url(mut self, url: impl Into<String>) -> Self {
        self.handoff_url = Some(url.into());
        self
    }
}

/// One way of getting a lead to the business
#[async_trait]
pub trait DeliveryProvider: Send + Sync {
    fn name(&self) -> &str;

    fn tier(&self) -> ServiceTier;

    async fn deliver(&self, submission: &FormSubmission) -> Result<Delivery, DeliveryError>;
}

#[derive(Debug, Clone)]
pub struct AttemptRecord {
    pub provider: String,
    pub tier: ServiceTier,
    pub outcome: Result<(), DeliveryError>,
}

#[derive(Debug, Clone)]
pub struct ChainReport {
    pub delivery: Option<Delivery>,
    pub attempts: Vec<AttemptRecord>,
    /// Every state the chain went through, starting with `Idle`
    pub states: Vec<ChainState>,
}

impl ChainReport {
    pub fn final_state(&self) -> &ChainState {
        self.states.last().unwrap_or(&ChainState::Idle)
    }

    pub fn is_delivered(&self) -> bool {
        self.delivery.is_some()
    }

    pub fn failures(&self) -> impl Iterator<Item = &DeliveryError> {
        self.attempts.iter().filter_map(|a| a.outcome.as_ref().err())
    }
}

/// Ordered provider list plus the per-attempt timeout
#[derive(Clone)]
pub struct FallbackChain {
    providers: Vec<Arc<dyn DeliveryProvider>>,
    attempt_timeout: Duration,
}

impl FallbackChain {
    pub fn new(providers: Vec<Arc<dyn DeliveryProvider>>) -> Self {
        Self {
            providers,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
        }
    }

    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    pub fn providers(&self) -> impl Iterator<Item = &str> {
        self.providers.iter().map(|p| p.name())
    }

    #[tracing::instrument(
        name = "chain.deliver",
        skip(self, submission),
        fields(tracking_id = submission.tracking_id.as_deref().unwrap_or(""))
    )]
    pub async fn deliver(&self, submission: &FormSubmission) -> ChainReport {
        let mut report = ChainReport {
            delivery: None,
            attempts: Vec::with_capacity(self.providers.len()),
            states: vec![ChainState::Idle],
        };

        for provider in &self.providers {
            let name = provider.name().to_string();
            let tier = provider.tier();
            report.states.push(ChainState::Attempting(tier));
            debug!("[FallbackChain] Attempting {} ({:?})", name, tier);

            let outcome =
                match tokio::time::timeout(self.attempt_timeout, provider.deliver(submission))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(DeliveryError::Timeout {
                        provider: name.clone(),
                        after: self.attempt_timeout,
                    }),
                };

            match outcome {
                Ok(delivery) => {
                    info!("[FallbackChain] Delivered via {}", delivery.service);
                    report.attempts.push(AttemptRecord {
                        provider: name,
                        tier,
                        outcome: Ok(()),
                    });
                    report.delivery = Some(delivery);
                    report.states.push(ChainState::Done);
                    return report;
                }
                Err(e) => {
                    warn!("[FallbackChain] {} failed, falling through: {}", name, e);
                    report.attempts.push(AttemptRecord {
                        provider: name,
                        tier,
                        outcome: Err(e),
                    });
                }
            }
        }

        warn!(
            "[FallbackChain] All {} providers failed",
            report.attempts.len()
        );
        report.states.push(ChainState::Fallback);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Behavior {
        Succeed,
        Fail(DeliveryError),
        Hang,
    }

    struct ScriptedProvider {
        name: &'static str,
        tier: ServiceTier,
        behavior: Behavior,
        calls: AtomicUsize,
    }

    impl ScriptedProvider {
        fn new(name: &'static str, tier: ServiceTier, behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                name,
                tier,
                behavior,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DeliveryProvider for ScriptedProvider {
        fn name(&self) -> &str {
            self.name
        }

        fn tier(&self) -> ServiceTier {
            self.tier
        }

        async fn deliver(&self, submission: &FormSubmission) -> Result<Delivery, DeliveryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.behavior {
                Behavior::Succeed => Ok(Delivery::new(self.name, self.tier)
                    .with_tracking_id(submission.tracking_id.clone())),
                Behavior::Fail(e) => Err(e.clone()),
                Behavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    unreachable!("attempt should have timed out")
                }
            }
        }
    }

    fn http_500(provider: &str) -> DeliveryError {
        DeliveryError::Http {
            provider: provider.to_string(),
            status: 500,
        }
    }

    fn chain_of(providers: &[&Arc<ScriptedProvider>]) -> FallbackChain {
        FallbackChain::new(
            providers
                .iter()
                .map(|p| Arc::clone(p) as Arc<dyn DeliveryProvider>)
                .collect(),
        )
    }

    fn submission() -> FormSubmission {
        FormSubmission::new("Ana Smith", "514-555-1234", "ana@example.com")
            .with_tracking_id("VIV-LOYW3V28-ABCDE")
    }

    #[tokio::test]
    async fn test_first_success_wins() {
        let primary = ScriptedProvider::new("primary", ServiceTier::Primary, Behavior::Succeed);
        let secondary =
            ScriptedProvider::new("secondary", ServiceTier::Secondary, Behavior::Succeed);
        let chain = chain_of(&[&primary, &secondary]);

        let report = chain.deliver(&submission()).await;

        let delivery = report.delivery.clone().unwrap();
        assert_eq!(delivery.service, "primary");
        assert_eq!(delivery.tracking_id.as_deref(), Some("VIV-LOYW3V28-ABCDE"));
        assert_eq!(primary.calls(), 1);
        assert_eq!(secondary.calls(), 0);
        assert_eq!(
            report.states,
            vec![
                ChainState::Idle,
                ChainState::Attempting(ServiceTier::Primary),
                ChainState::Done
            ]
        );
    }

    #[tokio::test]
    async fn test_primary_500_invokes_secondary_exactly_once() {
        let primary = ScriptedProvider::new(
            "primary",
            ServiceTier::Primary,
            Behavior::Fail(http_500("primary")),
        );
        let secondary =
            ScriptedProvider::new("secondary", ServiceTier::Secondary, Behavior::Succeed);
        let tertiary = ScriptedProvider::new("tertiary", ServiceTier::Tertiary, Behavior::Succeed);
        let chain = chain_of(&[&primary, &secondary, &tertiary]);

        let report = chain.deliver(&submission()).await;

        assert_eq!(report.delivery.as_ref().unwrap().tier, ServiceTier::Secondary);
        assert_eq!(primary.calls(), 1);
        assert_eq!(secondary.calls(), 1);
        assert_eq!(tertiary.calls(), 0);
        assert_eq!(report.failures().count(), 1);
    }

    #[tokio::test]
    async fn test_reaches_tertiary_when_remote_stages_fail() {
        let primary = ScriptedProvider::new(
            "primary",
            ServiceTier::Primary,
            Behavior::Fail(DeliveryError::Transport {
                provider: "primary".into(),
                message: "connection refused".into(),
            }),
        );
        let secondary = ScriptedProvider::new(
            "secondary",
            ServiceTier::Secondary,
            Behavior::Fail(DeliveryError::Provider {
                provider: "secondary".into(),
                message: "form disabled".into(),
            }),
        );
        let tertiary = ScriptedProvider::new("tertiary", ServiceTier::Tertiary, Behavior::Succeed);
        let chain = chain_of(&[&primary, &secondary, &tertiary]);

        let report = chain.deliver(&submission()).await;

        assert!(report.is_delivered());
        assert_eq!(report.delivery.as_ref().unwrap().tier, ServiceTier::Tertiary);
        assert_eq!(tertiary.calls(), 1);
        assert_eq!(report.final_state(), &ChainState::Done);
    }

    #[tokio::test]
    async fn test_exhausted_chain_ends_in_fallback() {
        let primary = ScriptedProvider::new(
            "primary",
            ServiceTier::Primary,
            Behavior::Fail(http_500("primary")),
        );
        let chain = chain_of(&[&primary]);

        let report = chain.deliver(&submission()).await;

        assert!(!report.is_delivered());
        assert_eq!(report.final_state(), &ChainState::Fallback);
        assert!(report.failures().all(|e| e.is_transport()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_provider_times_out() {
        let primary = ScriptedProvider::new("primary", ServiceTier::Primary, Behavior::Hang);
        let secondary =
            ScriptedProvider::new("secondary", ServiceTier::Secondary, Behavior::Succeed);
        let chain = chain_of(&[&primary, &secondary])
            .with_attempt_timeout(Duration::from_secs(2));

        let report = chain.deliver(&submission()).await;

        assert_eq!(report.delivery.unwrap().service, "secondary");
        let first = report.attempts[0].outcome.clone().unwrap_err();
        assert_eq!(
            first,
            DeliveryError::Timeout {
                provider: "primary".into(),
                after: Duration::from_secs(2)
            }
        );
    }

    #[tokio::test]
    async fn test_empty_chain() {
        let report = FallbackChain::new(Vec::new()).deliver(&submission()).await;
        assert_eq!(report.states, vec![ChainState::Idle, ChainState::Fallback]);
    }
}
