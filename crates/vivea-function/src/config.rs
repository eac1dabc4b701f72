use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::time::Duration;
use vivea_api::DEFAULT_CONTACT_EMAIL;

pub const DEFAULT_FROM_EMAIL: &str = "noreply@vivea.ca";
pub const DEFAULT_BIND: &str = "0.0.0.0:8788";
pub const RESEND_API_URL: &str = "https://api.resend.com/emails";
pub const SENDGRID_API_URL: &str = "https://api.sendgrid.com/v3/mail/send";
pub const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Cloudflare KV namespace reached through the REST API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvConfig {
    pub account_id: String,
    pub namespace_id: String,
    pub api_token: String,
    pub api_base: String,
}

/// Function settings, read from the environment like Pages bindings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionConfig {
    pub contact_email: String,
    pub from_email: String,
    pub resend_api_key: Option<String>,
    pub sendgrid_api_key: Option<String>,
    pub resend_url: String,
    pub sendgrid_url: String,
    /// KV persistence is skipped when unset
    pub kv: Option<KvConfig>,
    pub bind: SocketAddr,
    pub provider_timeout: Duration,
}

impl FunctionConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Empty values count as unset
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let kv = match (
            get("VIVEA_KV_ACCOUNT_ID"),
            get("VIVEA_KV_NAMESPACE_ID"),
            get("VIVEA_KV_API_TOKEN"),
        ) {
            (Some(account_id), Some(namespace_id), Some(api_token)) => Some(KvConfig {
                account_id,
                namespace_id,
                api_token,
                api_base: get("VIVEA_KV_API_BASE")
                    .unwrap_or_else(|| CLOUDFLARE_API_BASE.to_string()),
            }),
            (None, None, None) => None,
            _ => anyhow::bail!(
                "VIVEA_KV_ACCOUNT_ID, VIVEA_KV_NAMESPACE_ID and VIVEA_KV_API_TOKEN must be set together"
            ),
        };

        let bind_value = get("VIVEA_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_value
            .parse()
            .with_context(|| format!("Invalid VIVEA_BIND address '{}'", bind_value))?;

        let provider_timeout = match get("VIVEA_PROVIDER_TIMEOUT_SECS") {
            Some(value) => Duration::from_secs(
                value
                    .parse()
                    .with_context(|| format!("Invalid VIVEA_PROVIDER_TIMEOUT_SECS '{}'", value))?,
            ),
            None => Duration::from_secs(10),
        };

        Ok(Self {
            contact_email: get("CONTACT_EMAIL").unwrap_or_else(|| DEFAULT_CONTACT_EMAIL.to_string()),
            from_email: get("FROM_EMAIL").unwrap_or_else(|| DEFAULT_FROM_EMAIL.to_string()),
            resend_api_key: get("RESEND_API_KEY"),
            sendgrid_api_key: get("SENDGRID_API_KEY"),
            resend_url: get("RESEND_API_URL").unwrap_or_else(|| RESEND_API_URL.to_string()),
            sendgrid_url: get("SENDGRID_API_URL").unwrap_or_else(|| SENDGRID_API_URL.to_string()),
            kv,
            bind,
            provider_timeout,
        })
    }
}

impl Default for FunctionConfig {
    fn default() -> Self {
        Self {
            contact_email: DEFAULT_CONTACT_EMAIL.to_string(),
            from_email: DEFAULT_FROM_EMAIL.to_string(),
            resend_api_key: None,
            sendgrid_api_key: None,
            resend_url: RESEND_API_URL.to_string(),
            sendgrid_url: SENDGRID_API_URL.to_string(),
            kv: None,
            bind: SocketAddr::from(([0, 0, 0, 0], 8788)),
            provider_timeout: Duration::from_secs(10),
        }
    }
}
