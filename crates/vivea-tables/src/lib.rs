//! Client for the Vivéa table API
//!
//! - `client` - TableClient, generic CRUD over `/tables/{collection}`
//! - `query` - list filters (search predicates, paging, sort)
//! - `database` - LeadDatabase, the site's view of its collections
//! - `fake` - in-process table API for tests (feature `test-helpers`)

pub mod client;
pub mod database;
pub mod error;
pub mod query;

#[cfg(feature = "test-helpers")]
pub mod fake;

pub use client::{TableClient, TableConfig};
pub use database::{LeadDatabase, LeadFilters, PerformanceStats};
pub use error::{Result, TableError};
pub use query::{ListQuery, SortKey};

#[cfg(feature = "test-helpers")]
pub use fake::FakeTableServer;
