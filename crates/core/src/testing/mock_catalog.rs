//! Mock catalog for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::catalog::{BoundingBox, Catalog, CatalogError, ProductRef, TimeWindow};

/// A recorded search call.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedSearch {
    pub window: TimeWindow,
    pub region: BoundingBox,
}

/// Mock implementation of the Catalog trait.
///
/// Responses are consumed in the order they were pushed; once the queue is
/// empty every search returns an empty list.
///
/// # Example
///
/// ```rust,ignore
/// use meteoloop_core::testing::MockCatalog;
///
/// let catalog = MockCatalog::new();
/// catalog.push_response(Ok(vec![])).await;
/// catalog.push_response(Err(CatalogError::Auth("expired".into()))).await;
///
/// // ... run the search ...
///
/// assert_eq!(catalog.search_count().await, 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockCatalog {
    responses: Arc<RwLock<VecDeque<Result<Vec<ProductRef>, CatalogError>>>>,
    searches: Arc<RwLock<Vec<RecordedSearch>>>,
}

impl MockCatalog {
    /// Create a new mock catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the result of the next unanswered search.
    pub async fn push_response(&self, response: Result<Vec<ProductRef>, CatalogError>) {
        self.responses.write().await.push_back(response);
    }

    /// Get all recorded searches.
    pub async fn recorded_searches(&self) -> Vec<RecordedSearch> {
        self.searches.read().await.clone()
    }

    /// Get the number of searches performed.
    pub async fn search_count(&self) -> usize {
        self.searches.read().await.len()
    }
}

#[async_trait]
impl Catalog for MockCatalog {
    fn name(&self) -> &str {
        "mock"
    }

    async fn search(
        &self,
        window: &TimeWindow,
        region: &BoundingBox,
    ) -> Result<Vec<ProductRef>, CatalogError> {
        self.searches.write().await.push(RecordedSearch {
            window: *window,
            region: *region,
        });
        self.responses
            .write()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}
