//! Vivéa submit-form function
//!
//! HTTP endpoint receiving contact-form submissions: validates them, emails
//! the lead through Resend or SendGrid and keeps a 90-day KV snapshot.

pub mod config;
pub mod email;
pub mod kv;
pub mod routes;

pub use config::{FunctionConfig, KvConfig};
pub use email::{EmailError, EmailMessage, EmailSender, ResendSender, SendGridSender};
pub use kv::{CloudflareKv, KvError, KvStore, MemoryKv, RequestSnapshot};
pub use routes::{create_submit_form_router, FunctionState, SUBMIT_FORM_PATH};
