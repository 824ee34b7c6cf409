//! Configuration for the publisher module.

use serde::{Deserialize, Serialize};

/// Which publisher implementation to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublisherBackend {
    /// Post to X.
    #[default]
    X,
    /// Log the post instead of sending it.
    DryRun,
}

/// Publisher configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublisherConfig {
    #[serde(default)]
    pub backend: PublisherBackend,

    /// Text of the post carrying the animation.
    #[serde(default = "default_caption")]
    pub caption: String,

    /// Text posted when no imagery could be found.
    #[serde(default = "default_fallback_message")]
    pub fallback_message: String,

    /// X API settings, required by the `x` backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<XConfig>,
}

fn default_caption() -> String {
    "Meteosat SEVIRI view over Europe\nData (c) EUMETSAT\n#Meteosat #EUMETSAT #EarthObservation"
        .to_string()
}

fn default_fallback_message() -> String {
    "Meteosat Europe update: no new SEVIRI imagery available today. \
     We will be back with fresh data soon. #Meteosat #EUMETSAT"
        .to_string()
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            backend: PublisherBackend::default(),
            caption: default_caption(),
            fallback_message: default_fallback_message(),
            x: None,
        }
    }
}

/// X API v2 configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_upload_url")]
    pub upload_url: String,

    /// OAuth 2.0 user-context access token.
    #[serde(default)]
    pub access_token: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_api_url() -> String {
    "https://api.x.com".to_string()
}

fn default_upload_url() -> String {
    "https://api.x.com/2/media/upload".to_string()
}

fn default_timeout() -> u64 {
    60
}

impl Default for XConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            upload_url: default_upload_url(),
            access_token: String::new(),
            timeout_secs: default_timeout(),
        }
    }
}
