use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::acquisition::AcquisitionConfig;
use crate::animation::AnimationConfig;
use crate::catalog::{BoundingBox, CatalogConfig, WindowConfig};
use crate::compositor::CompositorConfig;
use crate::publisher::{PublisherBackend, PublisherConfig};
use crate::workspace::WorkspaceConfig;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Region to image (required).
    pub region: BoundingBox,
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub workspace: WorkspaceConfig,
    #[serde(default)]
    pub acquisition: AcquisitionConfig,
    #[serde(default)]
    pub compositor: CompositorConfig,
    #[serde(default)]
    pub animation: AnimationConfig,
    #[serde(default)]
    pub publisher: PublisherConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Metrics export configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// node_exporter textfile written after each run. Disabled when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub textfile_path: Option<PathBuf>,
}

/// Sanitized config for logging (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub region: BoundingBox,
    pub window: WindowConfig,
    pub catalog: SanitizedCatalogConfig,
    pub workspace: WorkspaceConfig,
    pub acquisition: AcquisitionConfig,
    pub compositor: CompositorConfig,
    pub animation: AnimationConfig,
    pub publisher: SanitizedPublisherConfig,
    pub metrics: MetricsConfig,
}

/// Sanitized catalog config (credentials hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedCatalogConfig {
    pub url: String,
    pub collection: String,
    pub credentials_configured: bool,
    pub timeout_secs: u64,
    pub download_timeout_secs: u64,
    pub page_size: u32,
}

/// Sanitized publisher config (access token hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedPublisherConfig {
    pub backend: String,
    pub caption: String,
    pub fallback_message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<SanitizedXConfig>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedXConfig {
    pub api_url: String,
    pub upload_url: String,
    pub access_token_configured: bool,
    pub timeout_secs: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            region: config.region,
            window: config.window.clone(),
            catalog: SanitizedCatalogConfig {
                url: config.catalog.url.clone(),
                collection: config.catalog.collection.clone(),
                credentials_configured: !config.catalog.consumer_key.is_empty()
                    && !config.catalog.consumer_secret.is_empty(),
                timeout_secs: config.catalog.timeout_secs,
                download_timeout_secs: config.catalog.download_timeout_secs,
                page_size: config.catalog.page_size,
            },
            workspace: config.workspace.clone(),
            acquisition: config.acquisition.clone(),
            compositor: config.compositor.clone(),
            animation: config.animation.clone(),
            publisher: SanitizedPublisherConfig {
                backend: match config.publisher.backend {
                    PublisherBackend::X => "x".to_string(),
                    PublisherBackend::DryRun => "dry_run".to_string(),
                },
                caption: config.publisher.caption.clone(),
                fallback_message: config.publisher.fallback_message.clone(),
                x: config.publisher.x.as_ref().map(|x| SanitizedXConfig {
                    api_url: x.api_url.clone(),
                    upload_url: x.upload_url.clone(),
                    access_token_configured: !x.access_token.is_empty(),
                    timeout_secs: x.timeout_secs,
                }),
            },
            metrics: config.metrics.clone(),
        }
    }
}
