//! Vivéa contact-form submission
//!
//! Sends a lead through the fallback chain (serverless function, email relay,
//! mailto handoff) and keeps a local backup record of every attempt.

pub mod backup;
pub mod config;
pub mod handler;
pub mod message;
pub mod providers;

pub use backup::{BackupStore, JsonFileBackup, MemoryBackup};
pub use config::{Environment, SiteConfig};
pub use handler::{FormHandler, Outcome, SubmissionResult, SubmissionSummary};
