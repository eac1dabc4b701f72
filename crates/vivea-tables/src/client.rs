use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error, info};
use vivea_api::Page;
use vivea_core::http::{build_client, describe_reqwest_error, snippet, traced_headers};

use crate::error::{Result, TableError};
use crate::query::ListQuery;

/// Where the table API lives and how long to wait for it
#[derive(Clone, Debug)]
pub struct TableConfig {
    /// Site origin, e.g. `https://vivea.ca`; collections live under `/tables`
    pub base_url: String,
    pub timeout: Duration,
}

impl TableConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Generic CRUD client for `/tables/{collection}`
#[derive(Clone)]
pub struct TableClient {
    base_url: String,
    default_headers: HeaderMap,
    client: reqwest::Client,
}

impl TableClient {
    pub fn new(config: &TableConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = build_client(config.timeout).map_err(|e| TableError::Client(e.to_string()))?;

        Ok(Self {
            base_url: format!("{}/tables", config.base_url.trim_end_matches('/')),
            default_headers: headers,
            client,
        })
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/{}", self.base_url, collection)
    }

    fn record_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}/{}", self.base_url, collection, id)
    }

    /// Send a request and return the body of a 2xx response
    async fn execute(
        &self,
        request: reqwest::RequestBuilder,
        url: &str,
        operation: &str,
    ) -> Result<String> {
        let response = request
            .headers(traced_headers(&self.default_headers))
            .send()
            .await
            .map_err(|e| {
                let message = describe_reqwest_error(&e, url, operation);
                error!("[TableClient] {}", message);
                TableError::Transport(message)
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            TableError::Transport(format!("Failed to read response body from {}: {}", url, e))
        })?;

        if !status.is_success() {
            error!("[TableClient] HTTP {} from {}", status.as_u16(), url);
            return Err(TableError::Http {
                status: status.as_u16(),
                url: url.to_string(),
                body: snippet(&body, 500),
            });
        }

        debug!(
            "[TableClient] {} {} -> {} ({} bytes)",
            operation,
            url,
            status.as_u16(),
            body.len()
        );
        Ok(body)
    }

    fn decode<R: DeserializeOwned>(body: &str, url: &str) -> Result<R> {
        serde_json::from_str(body).map_err(|e| {
            error!(
                "[TableClient] Failed to decode response from {}: {} - Response: {}",
                url,
                e,
                snippet(body, 200)
            );
            TableError::Decode {
                url: url.to_string(),
                message: e.to_string(),
            }
        })
    }

    pub async fn create<T, R>(&self, collection: &str, record: &T) -> Result<R>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.collection_url(collection);
        let request = self.client.request(Method::POST, &url).json(record);
        let body = self.execute(request, &url, "create record").await?;
        info!("[TableClient] Created record in {}", collection);
        Self::decode(&body, &url)
    }

    pub async fn get<R: DeserializeOwned>(&self, collection: &str, id: &str) -> Result<R> {
        let url = self.record_url(collection, id);
        let request = self.client.request(Method::GET, &url);
        let body = self.execute(request, &url, "get record").await?;
        Self::decode(&body, &url)
    }

    pub async fn list<R: DeserializeOwned>(
        &self,
        collection: &str,
        query: &ListQuery,
    ) -> Result<Page<R>> {
        let url = self.collection_url(collection);
        let request = self
            .client
            .request(Method::GET, &url)
            .query(&query.to_query_pairs());
        let body = self.execute(request, &url, "list records").await?;
        Self::decode(&body, &url)
    }

    /// `list`, but failures are logged and yield an empty page
    pub async fn list_or_empty<R: DeserializeOwned>(
        &self,
        collection: &str,
        query: &ListQuery,
    ) -> Page<R> {
        match self.list(collection, query).await {
            Ok(page) => page,
            Err(e) => {
                error!(
                    "[TableClient] Listing {} failed, showing nothing: {}",
                    collection, e
                );
                Page::empty()
            }
        }
    }

    pub async fn update<T, R>(&self, collection: &str, id: &str, patch: &T) -> Result<R>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.record_url(collection, id);
        let request = self.client.request(Method::PATCH, &url).json(patch);
        let body = self.execute(request, &url, "update record").await?;
        info!("[TableClient] Updated {}/{}", collection, id);
        Self::decode(&body, &url)
    }
}
