//! Site configuration: optional YAML file, then `VIVEA_*` environment overrides
//!
//! Everything has a default, so an empty file (or none at all) yields a
//! working production setup that falls back to mailto.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use vivea_api::{DEFAULT_CONTACT_EMAIL, DEFAULT_CONTACT_PHONE};

pub const DEFAULT_FUNCTION_PATH: &str = "/functions/submit-form";
pub const BACKUP_FILE_NAME: &str = "vivea_requests.json";

/// Resolved once at startup; development adds a direct table API attempt
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Production,
    Development,
}

impl Environment {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Some(Environment::Production),
            "development" | "dev" => Some(Environment::Development),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub environment: Environment,
    /// Site origin hosting `/functions` and `/tables`
    pub base_url: String,
    pub function_path: String,
    /// Email relay form endpoint; the relay stage is skipped when unset
    pub relay_endpoint: Option<String>,
    pub contact_email: String,
    pub contact_phone: String,
    pub backup_path: PathBuf,
    pub attempt_timeout_secs: u64,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Production,
            base_url: "http://localhost:8788".to_string(),
            function_path: DEFAULT_FUNCTION_PATH.to_string(),
            relay_endpoint: None,
            contact_email: DEFAULT_CONTACT_EMAIL.to_string(),
            contact_phone: DEFAULT_CONTACT_PHONE.to_string(),
            backup_path: default_backup_path(),
            attempt_timeout_secs: 10,
        }
    }
}

fn default_backup_path() -> PathBuf {
    directories::ProjectDirs::from("ca", "Vivea", "vivea")
        .map(|dirs| dirs.data_dir().join(BACKUP_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(BACKUP_FILE_NAME))
}

impl SiteConfig {
    /// Load from `path` (if any), then apply the process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read site config {}", path.display()))?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse site config YAML {}", path.display()))
    }

    /// Override fields from `VIVEA_*` variables looked up through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("VIVEA_ENVIRONMENT") {
            self.environment = Environment::parse(&value)
                .with_context(|| format!("Unknown VIVEA_ENVIRONMENT '{}'", value))?;
        }
        if let Some(value) = lookup("VIVEA_BASE_URL") {
            self.base_url = value;
        }
        if let Some(value) = lookup("VIVEA_FUNCTION_PATH") {
            self.function_path = value;
        }
        if let Some(value) = lookup("VIVEA_RELAY_ENDPOINT") {
            self.relay_endpoint = Some(value).filter(|v| !v.trim().is_empty());
        }
        if let Some(value) = lookup("VIVEA_CONTACT_EMAIL") {
            self.contact_email = value;
        }
        if let Some(value) = lookup("VIVEA_CONTACT_PHONE") {
            self.contact_phone = value;
        }
        if let Some(value) = lookup("VIVEA_BACKUP_PATH") {
            self.backup_path = PathBuf::from(value);
        }
        if let Some(value) = lookup("VIVEA_ATTEMPT_TIMEOUT_SECS") {
            self.attempt_timeout_secs = value
                .parse()
                .with_context(|| format!("Invalid VIVEA_ATTEMPT_TIMEOUT_SECS '{}'", value))?;
        }
        Ok(())
    }

    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_secs(self.attempt_timeout_secs.max(1))
    }

    pub fn function_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.function_path.trim_start_matches('/')
        )
    }
}
