use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("HTTP {status} error from {url}: {body}")]
    Http {
        status: u16,
        url: String,
        body: String,
    },

    #[error("{0}")]
    Transport(String),

    #[error("Failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

impl TableError {
    /// HTTP status for server-side failures
    pub fn status(&self) -> Option<u16> {
        match self {
            TableError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TableError>;
