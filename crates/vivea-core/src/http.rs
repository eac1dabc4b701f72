//! Shared reqwest plumbing: client construction, trace propagation, error text

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::time::Duration;

/// Build an HTTP client whose requests give up after `timeout`
pub fn build_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder().timeout(timeout).build()
}

/// Copy of `base` with the current OpenTelemetry context injected
pub fn traced_headers(base: &HeaderMap) -> HeaderMap {
    use opentelemetry::global;
    use opentelemetry::Context;

    struct HeaderInjector {
        headers: HeaderMap,
    }

    impl opentelemetry::propagation::Injector for HeaderInjector {
        fn set(&mut self, key: &str, value: String) {
            if let Ok(name) = HeaderName::from_bytes(key.as_bytes()) {
                if let Ok(value) = HeaderValue::from_str(&value) {
                    self.headers.insert(name, value);
                }
            }
        }
    }

    let mut injector = HeaderInjector {
        headers: base.clone(),
    };
    global::get_text_map_propagator(|propagator| {
        propagator.inject_context(&Context::current(), &mut injector);
    });
    injector.headers
}

/// Human-readable description of a failed request
pub fn describe_reqwest_error(e: &reqwest::Error, url: &str, operation: &str) -> String {
    if e.is_timeout() {
        format!("Failed to {} for {}: timeout - request took too long", operation, url)
    } else if e.is_connect() {
        format!(
            "Failed to {} for {}: connection error - check network connectivity and DNS. Error: {}",
            operation, url, e
        )
    } else if e.is_request() {
        format!(
            "Failed to {} for {}: request error - invalid URL or malformed request. Error: {}",
            operation, url, e
        )
    } else if e.is_decode() {
        format!(
            "Failed to {} for {}: decode error - unexpected response format. Error: {}",
            operation, url, e
        )
    } else {
        format!("Failed to {} for {}: {}", operation, url, e)
    }
}

/// Truncate a response body for error messages and logs
pub fn snippet(body: &str, max_chars: usize) -> String {
    if body.chars().count() > max_chars {
        format!(
            "{}... (truncated)",
            body.chars().take(max_chars).collect::<String>()
        )
    } else {
        body.to_string()
    }
}
