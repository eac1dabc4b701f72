//! The site's view of its collections: test requests, products,
//! testimonials and statistics.
//!
//! Read paths used for display never fail: they log and return nothing.
//! Writes propagate their errors to the caller.

use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, info};
use vivea_api::{
    Collection, LeadRequest, LeadStatus, Page, Product, Statistic, Testimonial,
    ACQUISITION_SOURCE_WEBSITE,
};

use crate::client::TableClient;
use crate::error::Result;
use crate::query::ListQuery;

const PERFORMANCE_SAMPLE: u32 = 1000;

/// Filters for the test request listing
#[derive(Debug, Clone, Default)]
pub struct LeadFilters {
    pub status: Option<LeadStatus>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// Raw sort expression, e.g. `-created_at`
    pub sort: Option<String>,
}

impl LeadFilters {
    fn to_query(&self) -> ListQuery {
        let mut query = ListQuery::new();
        if let Some(status) = &self.status {
            query = query.search("statut", status.code());
        }
        if let Some(page) = self.page {
            query = query.page(page);
        }
        if let Some(limit) = self.limit {
            query = query.limit(limit);
        }
        if let Some(sort) = &self.sort {
            for key in sort.split(',').map(str::trim).filter(|k| !k.is_empty()) {
                query = match key.strip_prefix('-') {
                    Some(field) => query.sort_by_desc(field),
                    None => query.sort_by(key),
                };
            }
        }
        query
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceStats {
    pub total_requests: u64,
    pub completed_requests: u64,
    /// Percentage of completed requests, one decimal
    pub conversion_rate: f64,
    /// Mean satisfaction score, one decimal
    pub avg_satisfaction: f64,
    pub total_testimonials: usize,
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

impl PerformanceStats {
    pub fn compute(requests: &Page<LeadRequest>, testimonials: &[Testimonial]) -> Self {
        let total_requests = requests.total;
        let completed_requests = requests
            .data
            .iter()
            .filter(|r| r.status == LeadStatus::Completed)
            .count() as u64;

        let conversion_rate = if total_requests > 0 {
            round1(completed_requests as f64 / total_requests as f64 * 100.0)
        } else {
            0.0
        };

        let avg_satisfaction = if testimonials.is_empty() {
            0.0
        } else {
            let sum: f64 = testimonials.iter().map(|t| t.satisfaction.unwrap_or(0.0)).sum();
            round1(sum / testimonials.len() as f64)
        };

        Self {
            total_requests,
            completed_requests,
            conversion_rate,
            avg_satisfaction,
            total_testimonials: testimonials.len(),
        }
    }
}

/// Typed access to the Vivéa collections over a `TableClient`
#[derive(Clone)]
pub struct LeadDatabase {
    client: TableClient,
}

impl LeadDatabase {
    pub fn new(client: TableClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &TableClient {
        &self.client
    }

    /// New requests always start as `nouveau` from the website
    pub async fn create_test_request(&self, request: &LeadRequest) -> Result<LeadRequest> {
        let mut record = request.clone();
        record.id = None;
        record.created_at = None;
        record.status = LeadStatus::New;
        record.acquisition_source = ACQUISITION_SOURCE_WEBSITE.to_string();

        self.client
            .create(Collection::TestRequests.name(), &record)
            .await
            .inspect_err(|e| error!("[LeadDatabase] Failed to create test request: {}", e))
    }

    pub async fn list_test_requests(&self, filters: &LeadFilters) -> Page<LeadRequest> {
        self.client
            .list_or_empty(Collection::TestRequests.name(), &filters.to_query())
            .await
    }

    pub async fn update_test_request_status(
        &self,
        request_id: &str,
        status: LeadStatus,
    ) -> Result<LeadRequest> {
        let updated = self
            .client
            .update(
                Collection::TestRequests.name(),
                request_id,
                &json!({ "statut": &status }),
            )
            .await
            .inspect_err(|e| error!("[LeadDatabase] Failed to update status: {}", e))?;
        info!(
            "[LeadDatabase] Request {} is now {}",
            request_id,
            status.code()
        );
        Ok(updated)
    }

    pub async fn get_products(&self) -> Vec<Product> {
        let query = ListQuery::new().sort_by("populaire").sort_by("type");
        self.client
            .list_or_empty(Collection::Products.name(), &query)
            .await
            .data
    }

    pub async fn get_product(&self, product_id: &str) -> Result<Product> {
        self.client
            .get(Collection::Products.name(), product_id)
            .await
            .inspect_err(|e| {
                error!("[LeadDatabase] Failed to load product {}: {}", product_id, e)
            })
    }

    /// Published testimonials, newest first
    pub async fn get_testimonials(&self, limit: u32) -> Vec<Testimonial> {
        let query = ListQuery::new()
            .search("publie", true)
            .sort_by_desc("date_temoignage")
            .limit(limit);
        self.client
            .list_or_empty(Collection::Testimonials.name(), &query)
            .await
            .data
    }

    pub async fn get_featured_testimonials(&self) -> Vec<Testimonial> {
        let query = ListQuery::new()
            .search("featured", true)
            .search("publie", true)
            .limit(3);
        self.client
            .list_or_empty(Collection::Testimonials.name(), &query)
            .await
            .data
    }

    pub async fn get_home_statistics(&self) -> Vec<Statistic> {
        let query = ListQuery::new()
            .search("affiche_accueil", true)
            .sort_by("ordre_affichage");
        self.client
            .list_or_empty(Collection::Statistics.name(), &query)
            .await
            .data
    }

    pub async fn update_statistic(&self, stat_id: &str, value: f64) -> Result<Statistic> {
        let patch: Value = json!({
            "valeur": value,
            "date_mise_a_jour": Utc::now().to_rfc3339(),
        });
        self.client
            .update(Collection::Statistics.name(), stat_id, &patch)
            .await
            .inspect_err(|e| {
                error!("[LeadDatabase] Failed to update statistic {}: {}", stat_id, e)
            })
    }

    pub async fn performance_stats(&self) -> PerformanceStats {
        let filters = LeadFilters {
            limit: Some(PERFORMANCE_SAMPLE),
            ..Default::default()
        };
        let (requests, testimonials) = tokio::join!(
            self.list_test_requests(&filters),
            self.get_testimonials(PERFORMANCE_SAMPLE)
        );
        PerformanceStats::compute(&requests, &testimonials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn testimonial(score: Option<f64>) -> Testimonial {
        Testimonial {
            id: "t".into(),
            client_name: String::new(),
            text: String::new(),
            satisfaction: score,
            published: true,
            featured: false,
            date: None,
            extra: Map::new(),
        }
    }

    fn lead(status: LeadStatus) -> LeadRequest {
        let mut lead = LeadRequest::new("Ana", "5145551234", "ana@example.com");
        lead.status = status;
        lead
    }

    #[test]
    fn test_lead_filters_to_query() {
        let filters = LeadFilters {
            status: Some(LeadStatus::Scheduled),
            page: Some(1),
            limit: Some(20),
            sort: Some("-created_at, nom".into()),
        };
        assert_eq!(
            filters.to_query().to_query_pairs(),
            vec![
                ("search", "statut:planifie".to_string()),
                ("page", "1".to_string()),
                ("limit", "20".to_string()),
                ("sort", "-created_at,nom".to_string()),
            ]
        );
    }

    #[test]
    fn test_performance_stats() {
        let requests = Page {
            data: vec![
                lead(LeadStatus::Completed),
                lead(LeadStatus::New),
                lead(LeadStatus::Completed),
            ],
            total: 3,
            page: 1,
            limit: 1000,
        };
        let testimonials = vec![testimonial(Some(5.0)), testimonial(Some(4.0)), testimonial(None)];

        let stats = PerformanceStats::compute(&requests, &testimonials);
        assert_eq!(stats.total_requests, 3);
        assert_eq!(stats.completed_requests, 2);
        assert_eq!(stats.conversion_rate, 66.7);
        assert_eq!(stats.avg_satisfaction, 3.0);
        assert_eq!(stats.total_testimonials, 3);
    }

    #[test]
    fn test_performance_stats_on_empty_data() {
        let stats = PerformanceStats::compute(&Page::empty(), &[]);
        assert_eq!(stats, PerformanceStats::default());
    }
}
