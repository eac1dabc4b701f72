use std::time::Duration;
use thiserror::Error;

/// User-correctable form errors; never reaches the network layer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid form: {}", errors.join("; "))]
pub struct ValidationError {
    pub errors: Vec<String>,
}

impl ValidationError {
    /// First message, the one shown inline next to the form
    pub fn first(&self) -> Option<&str> {
        self.errors.first().map(String::as_str)
    }
}

/// Failure of a single delivery stage. Every variant makes the chain move on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    #[error("{provider}: transport error: {message}")]
    Transport { provider: String, message: String },

    #[error("{provider}: HTTP {status}")]
    Http { provider: String, status: u16 },

    #[error("{provider}: rejected: {message}")]
    Provider { provider: String, message: String },

    #[error("{provider}: no answer after {after:?}")]
    Timeout { provider: String, after: Duration },
}

impl DeliveryError {
    pub fn provider(&self) -> &str {
        match self {
            DeliveryError::Transport { provider, .. }
            | DeliveryError::Http { provider, .. }
            | DeliveryError::Provider { provider, .. }
            | DeliveryError::Timeout { provider, .. } => provider,
        }
    }

    /// True for network, HTTP and timeout failures, false for well-formed rejections
    pub fn is_transport(&self) -> bool {
        !matches!(self, DeliveryError::Provider { .. })
    }
}

/// Local backup write or read failure
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Backup store unavailable: {0}")]
    Unavailable(String),
}
