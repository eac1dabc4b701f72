//! Key-value persistence of accepted requests
//!
//! Entries are `request:<trackingId>` snapshots kept for 90 days.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::debug;
use vivea_api::FormSubmission;
use vivea_core::http::{build_client, describe_reqwest_error, traced_headers};

use crate::config::KvConfig;

pub const REQUEST_TTL: Duration = Duration::from_secs(60 * 60 * 24 * 90);
pub const UNKNOWN_COUNTRY: &str = "Unknown";

pub fn request_key(tracking_id: &str) -> String {
    format!("request:{}", tracking_id)
}

/// What the function knows about an accepted request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestSnapshot {
    pub id: String,
    #[serde(flatten)]
    pub submission: FormSubmission,
    pub timestamp: DateTime<Utc>,
    pub ip: Option<String>,
    pub country: String,
}

#[derive(Debug, Error)]
pub enum KvError {
    #[error("KV transport error: {0}")]
    Transport(String),

    #[error("KV HTTP {status}")]
    Http { status: u16 },

    #[error("KV serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("KV store unavailable: {0}")]
    Unavailable(String),

    #[error("KV API token is not a valid header value")]
    InvalidCredential,
}

#[async_trait]
pub trait KvStore: Send + Sync {
    async fn put(&self, key: &str, value: String, ttl: Duration) -> Result<(), KvError>;

    async fn get(&self, key: &str) -> Result<Option<String>, KvError>;
}

/// Store a snapshot under its request key
pub async fn put_snapshot(store: &dyn KvStore, snapshot: &RequestSnapshot) -> Result<(), KvError> {
    let value = serde_json::to_string(snapshot)?;
    store.put(&request_key(&snapshot.id), value, REQUEST_TTL).await
}

/// In-process store honoring TTLs on read
#[derive(Default)]
pub struct MemoryKv {
    entries: Mutex<HashMap<String, (String, Instant)>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .map(|entries| entries.values().filter(|(_, expiry)| *expiry > now).count())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KvStore for MemoryKv {
    async fn put(&self, key: &str, value: String, ttl: Duration) -> Result<(), KvError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| KvError::Unavailable("lock poisoned".to_string()))?;
        entries.insert(key.to_string(), (value, Instant::now() + ttl));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| KvError::Unavailable("lock poisoned".to_string()))?;
        match entries.get(key) {
            Some((_, expiry)) if *expiry <= Instant::now() => {
                entries.remove(key);
                Ok(None)
            }
            Some((value, _)) => Ok(Some(value.clone())),
            None => Ok(None),
        }
    }
}

/// Cloudflare Workers KV over the REST API
pub struct CloudflareKv {
    values_url: String,
    client: reqwest::Client,
    default_headers: HeaderMap,
}

impl CloudflareKv {
    pub fn new(config: &KvConfig, timeout: Duration) -> Result<Self, KvError> {
        let auth = HeaderValue::from_str(&format!("Bearer {}", config.api_token))
            .map_err(|_| KvError::InvalidCredential)?;
        let mut default_headers = HeaderMap::new();
        default_headers.insert(AUTHORIZATION, auth);
        Ok(Self {
            values_url: format!(
                "{}/accounts/{}/storage/kv/namespaces/{}/values",
                config.api_base.trim_end_matches('/'),
                config.account_id,
                config.namespace_id
            ),
            client: build_client(timeout).map_err(|e| KvError::Transport(e.to_string()))?,
            default_headers,
        })
    }

    fn value_url(&self, key: &str) -> String {
        format!("{}/{}", self.values_url, key)
    }
}

#[async_trait]
impl KvStore for CloudflareKv {
    async fn put(&self, key: &str, value: String, ttl: Duration) -> Result<(), KvError> {
        let url = self.value_url(key);
        debug!("[CloudflareKv] PUT {}", url);
        let mut headers = traced_headers(&self.default_headers);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));

        let response = self
            .client
            .put(&url)
            .headers(headers)
            .query(&[("expiration_ttl", ttl.as_secs())])
            .body(value)
            .send()
            .await
            .map_err(|e| KvError::Transport(describe_reqwest_error(&e, &url, "write KV value")))?;

        if !response.status().is_success() {
            return Err(KvError::Http {
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        let url = self.value_url(key);
        let response = self
            .client
            .get(&url)
            .headers(traced_headers(&self.default_headers))
            .send()
            .await
            .map_err(|e| KvError::Transport(describe_reqwest_error(&e, &url, "read KV value")))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(KvError::Http {
                status: status.as_u16(),
            });
        }
        let body = response
            .text()
            .await
            .map_err(|e| KvError::Transport(describe_reqwest_error(&e, &url, "read KV value")))?;
        Ok(Some(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> RequestSnapshot {
        RequestSnapshot {
            id: "VIV-LOYW3V28-ABCDE".into(),
            submission: FormSubmission::new("Ana Smith", "514-555-1234", "ana@example.com"),
            timestamp: Utc::now(),
            ip: Some("203.0.113.7".into()),
            country: "CA".into(),
        }
    }

    #[test]
    fn test_cloudflare_token_must_be_a_header_value() {
        let config = KvConfig {
            account_id: "acc".into(),
            namespace_id: "ns".into(),
            api_token: "tok\nen".into(),
            api_base: "http://127.0.0.1:9".into(),
        };
        assert!(matches!(
            CloudflareKv::new(&config, Duration::from_secs(1)),
            Err(KvError::InvalidCredential)
        ));

        let config = KvConfig {
            api_token: "token".into(),
            ..config
        };
        assert!(CloudflareKv::new(&config, Duration::from_secs(1)).is_ok());
    }

    #[tokio::test]
    async fn test_snapshot_stored_under_request_key() {
        let store = MemoryKv::new();
        put_snapshot(&store, &snapshot()).await.unwrap();

        let raw = store.get("request:VIV-LOYW3V28-ABCDE").await.unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["id"], "VIV-LOYW3V28-ABCDE");
        assert_eq!(value["nom"], "Ana Smith");
        assert_eq!(value["ip"], "203.0.113.7");
        assert_eq!(value["country"], "CA");
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire_after_ttl() {
        let store = MemoryKv::new();
        put_snapshot(&store, &snapshot()).await.unwrap();
        assert_eq!(store.len(), 1);

        tokio::time::advance(REQUEST_TTL - Duration::from_secs(1)).await;
        assert!(store.get("request:VIV-LOYW3V28-ABCDE").await.unwrap().is_some());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(store.get("request:VIV-LOYW3V28-ABCDE").await.unwrap().is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_ttl_is_ninety_days() {
        assert_eq!(REQUEST_TTL.as_secs(), 7_776_000);
    }
}
