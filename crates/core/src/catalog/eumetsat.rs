//! EUMETSAT Data Store backend.
//!
//! Implements both the catalog search (OpenSearch endpoint) and product
//! download, sharing one OAuth2 client-credentials token.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::debug;

use crate::acquisition::{archive_file_name, AcquireError, Downloader};

use super::config::CatalogConfig;
use super::types::{BoundingBox, Catalog, CatalogError, ProductRef, TimeWindow};

/// Tokens are refreshed this long before they expire.
const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: DateTime<Utc>,
}

/// EUMETSAT Data Store client.
pub struct EumetsatClient {
    client: Client,
    config: CatalogConfig,
    token: RwLock<Option<AccessToken>>,
}

impl EumetsatClient {
    /// Create a new client with the given configuration.
    pub fn new(config: CatalogConfig) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CatalogError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            token: RwLock::new(None),
        })
    }

    fn base_url(&self) -> &str {
        self.config.url.trim_end_matches('/')
    }

    /// Returns a cached token or requests a fresh one.
    async fn access_token(&self) -> Result<String, CatalogError> {
        {
            let token = self.token.read().await;
            if let Some(t) = token.as_ref() {
                if t.expires_at > Utc::now() + TimeDelta::seconds(TOKEN_EXPIRY_MARGIN_SECS) {
                    return Ok(t.value.clone());
                }
            }
        }

        let url = format!("{}/token", self.base_url());
        debug!(url = %url, "Requesting catalog access token");

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.consumer_key, Some(&self.config.consumer_secret))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body("grant_type=client_credentials")
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        if matches!(
            status,
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Auth(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }
        if !status.is_success() {
            return Err(CatalogError::Api(format!("token endpoint returned HTTP {}", status)));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| CatalogError::Api(format!("Failed to parse token response: {}", e)))?;

        let value = token.access_token.clone();
        *self.token.write().await = Some(AccessToken {
            value: token.access_token,
            expires_at: Utc::now() + TimeDelta::seconds(token.expires_in),
        });
        Ok(value)
    }

    /// Build the OpenSearch URL for one result page.
    fn build_search_url(&self, window: &TimeWindow, region: &BoundingBox, start_index: u64) -> String {
        format!(
            "{}/data/search-products/1.0.0/os?format=json&pi={}&dtstart={}&dtend={}&bbox={}&sort={}&c={}&si={}",
            self.base_url(),
            urlencoding::encode(&self.config.collection),
            urlencoding::encode(&window.start().to_rfc3339_opts(SecondsFormat::Secs, true)),
            urlencoding::encode(&window.end().to_rfc3339_opts(SecondsFormat::Secs, true)),
            urlencoding::encode(&region.to_query_param()),
            urlencoding::encode("start,time,1"),
            self.config.page_size,
            start_index
        )
    }

    fn build_download_url(&self, product: &ProductRef) -> String {
        format!(
            "{}/data/download/1.0.0/collections/{}/products/{}",
            self.base_url(),
            urlencoding::encode(&self.config.collection),
            urlencoding::encode(&product.id)
        )
    }

    async fn fetch_page(
        &self,
        token: &str,
        window: &TimeWindow,
        region: &BoundingBox,
        start_index: u64,
    ) -> Result<SearchResponse, CatalogError> {
        let url = self.build_search_url(window, region, start_index);
        debug!(start_index, "Fetching catalog page");

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Err(CatalogError::Auth(format!("search returned HTTP {}", status)));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Api(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| CatalogError::Api(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl Catalog for EumetsatClient {
    fn name(&self) -> &str {
        "eumetsat"
    }

    async fn search(
        &self,
        window: &TimeWindow,
        region: &BoundingBox,
    ) -> Result<Vec<ProductRef>, CatalogError> {
        let token = self.access_token().await?;
        let page_size = u64::from(self.config.page_size.max(1));

        let mut products = Vec::new();
        let mut start_index = 0u64;
        loop {
            let page = self.fetch_page(&token, window, region, start_index).await?;
            let total = page.properties.as_ref().map(|p| p.total_results);
            let fetched = page.features.len() as u64;

            for feature in page.features {
                products.push(feature.into_product()?);
            }

            start_index += fetched;
            if fetched == 0 || fetched < page_size || total.is_some_and(|t| start_index >= t) {
                break;
            }
        }

        debug!(products = products.len(), window = %window, "Catalog search complete");
        Ok(products)
    }
}

#[async_trait]
impl Downloader for EumetsatClient {
    fn name(&self) -> &str {
        "eumetsat"
    }

    async fn download(&self, product: &ProductRef, dest_dir: &Path) -> Result<PathBuf, AcquireError> {
        let token = self.access_token().await?;
        let url = self.build_download_url(product);

        let mut response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .timeout(Duration::from_secs(self.config.download_timeout_secs))
            .send()
            .await
            .map_err(map_download_error)?;

        let status = response.status();
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Err(AcquireError::Auth(format!(
                "download of {} returned HTTP {}",
                product.id, status
            )));
        }
        if !status.is_success() {
            return Err(AcquireError::Transport(format!(
                "download of {} returned HTTP {}",
                product.id, status
            )));
        }

        let path = dest_dir.join(archive_file_name(&product.id));
        let mut file = File::create(&path).await?;
        let mut total_bytes = 0u64;
        while let Some(chunk) = response.chunk().await.map_err(map_download_error)? {
            file.write_all(&chunk).await?;
            total_bytes += chunk.len() as u64;
        }
        file.flush().await?;

        debug!(product = %product.id, bytes = total_bytes, path = %path.display(), "Archive downloaded");
        Ok(path)
    }
}

fn map_request_error(e: reqwest::Error) -> CatalogError {
    if e.is_timeout() {
        CatalogError::Timeout
    } else {
        CatalogError::Transport(e.to_string())
    }
}

fn map_download_error(e: reqwest::Error) -> AcquireError {
    if e.is_timeout() {
        AcquireError::Timeout
    } else {
        AcquireError::Transport(e.to_string())
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    features: Vec<Feature>,
    #[serde(default)]
    properties: Option<SearchProperties>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchProperties {
    total_results: u64,
}

#[derive(Debug, Deserialize)]
struct Feature {
    id: String,
    properties: FeatureProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeatureProperties {
    /// `start/end` in RFC 3339.
    date: String,
    #[serde(default)]
    product_information: Option<ProductInformation>,
}

#[derive(Debug, Deserialize)]
struct ProductInformation {
    /// Kilobytes.
    #[serde(default)]
    size: Option<u64>,
}

impl Feature {
    fn into_product(self) -> Result<ProductRef, CatalogError> {
        let (start, end) = match self.properties.date.split_once('/') {
            Some((start, end)) => (start, Some(end)),
            None => (self.properties.date.as_str(), None),
        };
        let sensing_start = parse_instant(start)
            .ok_or_else(|| CatalogError::Api(format!("invalid date for product {}", self.id)))?;
        let sensing_end = end.and_then(parse_instant);
        let size_bytes = self
            .properties
            .product_information
            .and_then(|info| info.size)
            .map(|kb| kb * 1024);

        Ok(ProductRef {
            id: self.id,
            sensing_start,
            sensing_end,
            footprint: None,
            size_bytes,
        })
    }
}

fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s.trim())
        .ok()
        .map(|d| d.with_timezone(&Utc))
}
