//! Testing utilities and mock implementations.
//!
//! Every collaborator trait of the daily run has a mock here, so the whole
//! pipeline can be exercised without network access, external commands or
//! (with [`MemoryFs`]) even a disk.
//!
//! # Example
//!
//! ```rust,ignore
//! use meteoloop_core::testing::{MockCatalog, MockPublisher};
//!
//! let catalog = MockCatalog::new();
//! catalog.push_response(Ok(fixtures::hourly_products(12))).await;
//!
//! let publisher = MockPublisher::new();
//! // ... run ...
//! assert_eq!(publisher.recorded_posts().await.len(), 1);
//! ```

mod memory_fs;
mod mock_acquisition;
mod mock_animator;
mod mock_catalog;
mod mock_publisher;
mod mock_renderer;

pub use memory_fs::{FsOp, FsSnapshot, MemoryFs};
pub use mock_acquisition::{MockDownloader, MockExtractor, RecordedExtraction};
pub use mock_animator::{MockAnimator, RecordedAssembly};
pub use mock_catalog::{MockCatalog, RecordedSearch};
pub use mock_publisher::{MockPublisher, PublishedPost};
pub use mock_renderer::MockRenderer;

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::{DateTime, TimeDelta, TimeZone, Utc};

    use crate::catalog::{BoundingBox, ProductRef, TimeWindow};

    /// The broad Europe region imaged by the daily job.
    pub fn europe() -> BoundingBox {
        BoundingBox::new(-25.0, 33.0, 45.0, 72.0)
    }

    /// A fixed run instant: 2024-03-02 06:00 UTC.
    pub fn run_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 2, 6, 0, 0).unwrap()
    }

    /// The nominal window for [`run_time`]: all of 2024-03-01.
    pub fn nominal_window() -> TimeWindow {
        TimeWindow::for_day(run_time(), 1, 24).unwrap()
    }

    /// Create a product with a SEVIRI-like id sensed at `sensing_start`.
    pub fn product(sensing_start: DateTime<Utc>) -> ProductRef {
        ProductRef::new(
            format!(
                "MSG4-SEVI-MSG15-0100-NA-{}.000000000Z-NA",
                sensing_start.format("%Y%m%d%H%M%S")
            ),
            sensing_start,
        )
    }

    /// `count` products sensed hourly from the start of the nominal window.
    pub fn hourly_products(count: usize) -> Vec<ProductRef> {
        let start = nominal_window().start();
        (0..count)
            .map(|i| product(start + TimeDelta::hours(i as i64)))
            .collect()
    }
}
