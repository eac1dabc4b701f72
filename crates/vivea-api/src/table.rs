use serde::{Deserialize, Serialize};
use std::fmt;

/// Collections exposed by the table API under `/tables/{name}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    TestRequests,
    Products,
    Testimonials,
    Statistics,
}

impl Collection {
    pub fn name(&self) -> &'static str {
        match self {
            Collection::TestRequests => "test_requests",
            Collection::Products => "produits",
            Collection::Testimonials => "testimonials",
            Collection::Statistics => "statistiques",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One page of rows as returned by `GET /tables/{collection}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub limit: u32,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            data: Vec::new(),
            total: 0,
            page: 0,
            limit: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self::empty()
    }
}
