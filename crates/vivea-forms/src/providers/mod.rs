//! Delivery providers, in chain order
//!
//! - `table` - direct write to the table API (development only)
//! - `serverless` - same-origin submit-form function
//! - `relay` - external email relay form
//! - `mailto` - mail-client handoff, always succeeds

pub mod mailto;
pub mod relay;
pub mod serverless;
pub mod table;

pub use mailto::MailtoProvider;
pub use relay::RelayProvider;
pub use serverless::ServerlessProvider;
pub use table::TableApiProvider;

use vivea_core::http::describe_reqwest_error;
use vivea_core::DeliveryError;

pub(crate) fn transport_error(provider: &str, e: &reqwest::Error, url: &str) -> DeliveryError {
    DeliveryError::Transport {
        provider: provider.to_string(),
        message: describe_reqwest_error(e, url, "submit lead"),
    }
}
