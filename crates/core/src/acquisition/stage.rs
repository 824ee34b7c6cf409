//! Sequential download, extract and consume loop.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use crate::catalog::ProductRef;
use crate::metrics;
use crate::workspace::{sanitize_component, Workspace, WorkspaceManager};

use super::config::{AcquisitionConfig, DecodeErrorPolicy};
use super::error::AcquireError;
use super::traits::{Downloader, Extractor};

/// File name under which a product archive is stored in `archives/`.
pub fn archive_file_name(product_id: &str) -> String {
    format!("{}.zip", sanitize_component(product_id))
}

/// Keeps every `step`-th product, starting with the first.
pub fn sample_products(products: &[ProductRef], step: usize) -> Vec<ProductRef> {
    products.iter().step_by(step.max(1)).cloned().collect()
}

/// A product whose raw files are ready for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct AcquiredProduct {
    pub product: ProductRef,
    /// Raw files in rendering order.
    pub raw_files: Vec<PathBuf>,
}

/// Downloads and unpacks products one archive at a time.
///
/// At most one archive exists on disk at any moment: each archive is
/// consumed right after its extraction, before the next download starts.
pub struct AcquisitionStage {
    downloader: Arc<dyn Downloader>,
    extractor: Arc<dyn Extractor>,
    sample_step: usize,
    policy: DecodeErrorPolicy,
}

impl AcquisitionStage {
    pub fn new(
        downloader: Arc<dyn Downloader>,
        extractor: Arc<dyn Extractor>,
        config: &AcquisitionConfig,
    ) -> Self {
        Self {
            downloader,
            extractor,
            sample_step: config.sample_step.max(1),
            policy: config.on_decode_error,
        }
    }

    /// Acquires the sampled subset of `products`, preserving their order.
    ///
    /// Transport and auth errors abort immediately. Decode errors abort
    /// unless the policy is [`DecodeErrorPolicy::Skip`], in which case the
    /// product is dropped. The archive is consumed whether extraction
    /// succeeded or not.
    pub async fn acquire(
        &self,
        products: &[ProductRef],
        workspace: &Workspace,
        manager: &WorkspaceManager,
    ) -> Result<Vec<AcquiredProduct>, AcquireError> {
        let selected = sample_products(products, self.sample_step);
        if self.sample_step > 1 {
            info!(
                step = self.sample_step,
                selected = selected.len(),
                total = products.len(),
                "Processing every {}th product",
                self.sample_step
            );
        }

        let total = selected.len();
        let mut acquired = Vec::with_capacity(total);

        for (index, product) in selected.into_iter().enumerate() {
            info!(
                product_id = %product.id,
                sensing_start = %product.sensing_start,
                downloader = self.downloader.name(),
                "[{}/{}] Downloading product",
                index + 1,
                total
            );

            let archive = self.downloader.download(&product, workspace.archives()).await?;
            let extracted = self
                .extractor
                .extract(&archive, &workspace.product_dir(&product.id))
                .await;
            manager.consume_archive(workspace, &archive).await?;

            match extracted {
                Ok(raw_files) => {
                    info!(
                        product_id = %product.id,
                        files = raw_files.len(),
                        "[{}/{}] Extracted product",
                        index + 1,
                        total
                    );
                    metrics::PRODUCTS_ACQUIRED.inc();
                    acquired.push(AcquiredProduct { product, raw_files });
                }
                Err(e) if e.is_decode() && self.policy == DecodeErrorPolicy::Skip => {
                    warn!(product_id = %product.id, error = %e, "Skipping undecodable product");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(acquired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockDownloader, MockExtractor};
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn products(n: usize) -> Vec<ProductRef> {
        (0..n)
            .map(|i| {
                ProductRef::new(
                    format!("MSG4-SEVI-{i:02}"),
                    Utc.with_ymd_and_hms(2024, 3, 1, i as u32, 0, 0).unwrap(),
                )
            })
            .collect()
    }

    struct Fixture {
        _temp: TempDir,
        workspace: Workspace,
        manager: WorkspaceManager,
        downloader: Arc<MockDownloader>,
        extractor: Arc<MockExtractor>,
    }

    impl Fixture {
        async fn new() -> Self {
            let temp = TempDir::new().unwrap();
            let manager = WorkspaceManager::local(Workspace::new(temp.path(), "out.gif"));
            let workspace = manager.prepare().await.unwrap();
            Self {
                _temp: temp,
                workspace,
                manager,
                downloader: Arc::new(MockDownloader::new()),
                extractor: Arc::new(MockExtractor::new()),
            }
        }

        fn stage(&self, config: &AcquisitionConfig) -> AcquisitionStage {
            AcquisitionStage::new(self.downloader.clone(), self.extractor.clone(), config)
        }
    }

    #[test]
    fn test_archive_file_name() {
        assert_eq!(archive_file_name("MSG4/SEVI 01"), "MSG4_SEVI_01.zip");
    }

    #[test]
    fn test_sample_products() {
        let all = products(7);
        let ids: Vec<_> = sample_products(&all, 3).into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["MSG4-SEVI-00", "MSG4-SEVI-03", "MSG4-SEVI-06"]);
        assert_eq!(sample_products(&all, 0).len(), 7);
        assert_eq!(sample_products(&all, 1).len(), 7);
    }

    #[tokio::test]
    async fn test_acquire_keeps_order_and_consumes_archives() {
        let fx = Fixture::new().await;
        let acquired = fx
            .stage(&AcquisitionConfig::default())
            .acquire(&products(3), &fx.workspace, &fx.manager)
            .await
            .unwrap();

        let ids: Vec<_> = acquired.iter().map(|a| a.product.id.as_str()).collect();
        assert_eq!(ids, vec!["MSG4-SEVI-00", "MSG4-SEVI-01", "MSG4-SEVI-02"]);
        for item in &acquired {
            assert!(item.raw_files.iter().all(|f| f.exists()));
        }
        assert_eq!(std::fs::read_dir(fx.workspace.archives()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_previous_archive_is_gone_before_next_extraction() {
        let fx = Fixture::new().await;
        fx.stage(&AcquisitionConfig::default())
            .acquire(&products(4), &fx.workspace, &fx.manager)
            .await
            .unwrap();

        let calls = fx.extractor.recorded_extractions().await;
        assert_eq!(calls.len(), 4);
        for call in &calls {
            assert_eq!(call.archives_present, vec![call.archive.clone()]);
        }
    }

    #[tokio::test]
    async fn test_transport_error_stops_the_loop() {
        let fx = Fixture::new().await;
        fx.downloader
            .fail_on_call(2, AcquireError::Transport("connection reset".into()))
            .await;

        let err = fx
            .stage(&AcquisitionConfig::default())
            .acquire(&products(5), &fx.workspace, &fx.manager)
            .await
            .unwrap_err();

        assert!(matches!(err, AcquireError::Transport(_)));
        assert_eq!(fx.downloader.download_count().await, 2);
        assert_eq!(fx.extractor.recorded_extractions().await.len(), 1);
    }

    #[tokio::test]
    async fn test_decode_error_aborts_by_default() {
        let fx = Fixture::new().await;
        fx.extractor.fail_product("MSG4-SEVI-01").await;

        let err = fx
            .stage(&AcquisitionConfig::default())
            .acquire(&products(3), &fx.workspace, &fx.manager)
            .await
            .unwrap_err();

        assert!(err.is_decode());
        assert_eq!(fx.downloader.download_count().await, 2);
        assert_eq!(std::fs::read_dir(fx.workspace.archives()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_decode_error_skipped_when_configured() {
        let fx = Fixture::new().await;
        fx.extractor.fail_product("MSG4-SEVI-01").await;
        let config = AcquisitionConfig {
            on_decode_error: DecodeErrorPolicy::Skip,
            ..Default::default()
        };

        let acquired = fx
            .stage(&config)
            .acquire(&products(3), &fx.workspace, &fx.manager)
            .await
            .unwrap();

        let ids: Vec<_> = acquired.iter().map(|a| a.product.id.as_str()).collect();
        assert_eq!(ids, vec!["MSG4-SEVI-00", "MSG4-SEVI-02"]);
    }

    #[tokio::test]
    async fn test_sampling_limits_downloads() {
        let fx = Fixture::new().await;
        let config = AcquisitionConfig {
            sample_step: 2,
            ..Default::default()
        };

        let acquired = fx
            .stage(&config)
            .acquire(&products(5), &fx.workspace, &fx.manager)
            .await
            .unwrap();

        assert_eq!(acquired.len(), 3);
        assert_eq!(fx.downloader.download_count().await, 3);
    }
}
