//! Configuration for the catalog and the search window.

use serde::{Deserialize, Serialize};

/// EUMETSAT Data Store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// API base URL.
    #[serde(default = "default_url")]
    pub url: String,

    /// Collection identifier searched and downloaded from.
    #[serde(default = "default_collection")]
    pub collection: String,

    /// OAuth2 client id.
    #[serde(default)]
    pub consumer_key: String,

    /// OAuth2 client secret.
    #[serde(default)]
    pub consumer_secret: String,

    /// Timeout for token and search requests in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Timeout for a single product download in seconds.
    #[serde(default = "default_download_timeout")]
    pub download_timeout_secs: u64,

    /// Results per search page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_url() -> String {
    "https://api.eumetsat.int".to_string()
}

fn default_collection() -> String {
    "EO:EUM:DAT:MSG:HRSEVIRI".to_string()
}

fn default_timeout() -> u64 {
    60
}

fn default_download_timeout() -> u64 {
    600
}

fn default_page_size() -> u32 {
    100
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            collection: default_collection(),
            consumer_key: String::new(),
            consumer_secret: String::new(),
            timeout_secs: default_timeout(),
            download_timeout_secs: default_download_timeout(),
            page_size: default_page_size(),
        }
    }
}

/// Which past window a run targets and how far it may fall back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Days between the run date and the target day.
    #[serde(default = "default_offset_days")]
    pub offset_days: u32,

    /// Length of the nominal window in hours.
    #[serde(default = "default_length_hours")]
    pub length_hours: u32,

    /// Extra searches, each one hour further back, after an empty result.
    #[serde(default = "default_max_fallback_attempts")]
    pub max_fallback_attempts: u32,
}

/// Upper bound on `max_fallback_attempts`: a full day of hourly shifts.
pub const MAX_FALLBACK_ATTEMPTS_LIMIT: u32 = 24;

fn default_offset_days() -> u32 {
    1
}

fn default_length_hours() -> u32 {
    24
}

fn default_max_fallback_attempts() -> u32 {
    2
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            offset_days: default_offset_days(),
            length_hours: default_length_hours(),
            max_fallback_attempts: default_max_fallback_attempts(),
        }
    }
}
