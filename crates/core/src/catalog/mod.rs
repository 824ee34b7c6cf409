//! Satellite product catalog.
//!
//! This module provides the `Catalog` trait for listing products by time
//! window and region, the EUMETSAT Data Store backend, and the
//! `FallbackSearch` controller that retries empty searches on earlier
//! windows.

mod config;
mod eumetsat;
mod fallback;
mod types;

pub use config::{CatalogConfig, WindowConfig, MAX_FALLBACK_ATTEMPTS_LIMIT};
pub use eumetsat::EumetsatClient;
pub use fallback::FallbackSearch;
pub use types::*;
