//! Time-shifting fallback around a catalog.
//!
//! Providers publish with some latency, so an empty answer for the nominal
//! window is retried on windows moved one, two, ... hours back. Only empty
//! results trigger a fallback; credential and transport failures end the
//! search immediately.

use std::sync::Arc;

use tracing::{info, warn};

use crate::metrics;

use super::types::{
    sort_by_acquisition, BoundingBox, Catalog, CatalogError, SearchAttempt, SearchOutcome,
    TimeWindow,
};

/// Runs a bounded sequence of catalog searches.
pub struct FallbackSearch {
    catalog: Arc<dyn Catalog>,
    max_attempts: u32,
}

impl FallbackSearch {
    /// `max_attempts` counts fallbacks, so up to `max_attempts + 1` calls are made.
    pub fn new(catalog: Arc<dyn Catalog>, max_attempts: u32) -> Self {
        Self {
            catalog,
            max_attempts,
        }
    }

    /// The attempts that would be issued for `nominal`, in order.
    pub fn attempts(&self, nominal: &TimeWindow) -> impl Iterator<Item = SearchAttempt> + '_ {
        let nominal = *nominal;
        (0..=self.max_attempts).map(move |k| SearchAttempt {
            window: nominal.shifted_back(k),
            attempt_index: k,
        })
    }

    /// Searches `nominal`, then earlier windows while results are empty.
    pub async fn search(
        &self,
        nominal: &TimeWindow,
        region: &BoundingBox,
    ) -> Result<SearchOutcome, CatalogError> {
        let mut attempts_used = 0;

        for attempt in self.attempts(nominal) {
            attempts_used += 1;
            info!(
                catalog = self.catalog.name(),
                attempt = attempt.attempt_index,
                window = %attempt.window,
                bbox = %region.to_query_param(),
                "Searching catalog"
            );

            let mut products = self.catalog.search(&attempt.window, region).await?;

            if !products.is_empty() {
                metrics::SEARCH_ATTEMPTS.with_label_values(&["hit"]).inc();
                info!(
                    products = products.len(),
                    window = %attempt.window,
                    "Using products from window"
                );
                sort_by_acquisition(&mut products);
                return Ok(SearchOutcome {
                    products,
                    attempts_used,
                    matched_window: Some(attempt.window),
                });
            }

            metrics::SEARCH_ATTEMPTS.with_label_values(&["empty"]).inc();
            if attempt.attempt_index < self.max_attempts {
                warn!(
                    window = %attempt.window,
                    "No products found, retrying with an additional one-hour offset"
                );
            } else {
                warn!(
                    window = %attempt.window,
                    attempts = attempts_used,
                    "No products found in any window"
                );
            }
        }

        Ok(SearchOutcome {
            products: Vec::new(),
            attempts_used,
            matched_window: None,
        })
    }
}
