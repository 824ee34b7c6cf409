//! Configuration for the compositor module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Placeholder replaced by the raw product path.
pub const INPUT_PLACEHOLDER: &str = "{input}";
/// Placeholder replaced by the frame path.
pub const OUTPUT_PLACEHOLDER: &str = "{output}";

/// Compositor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositorConfig {
    /// Program that renders one raw product into an image.
    #[serde(default = "default_command")]
    pub command: PathBuf,

    /// Arguments, with `{input}` and `{output}` placeholders.
    #[serde(default = "default_args")]
    pub args: Vec<String>,

    /// Extension of rendered frames.
    #[serde(default = "default_frame_extension")]
    pub frame_extension: String,

    /// Per-frame timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_command() -> PathBuf {
    PathBuf::from("meteoloop-render")
}

fn default_args() -> Vec<String> {
    vec![
        "--composite".to_string(),
        "natural_color".to_string(),
        INPUT_PLACEHOLDER.to_string(),
        OUTPUT_PLACEHOLDER.to_string(),
    ]
}

fn default_frame_extension() -> String {
    "png".to_string()
}

fn default_timeout() -> u64 {
    300
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            command: default_command(),
            args: default_args(),
            frame_extension: default_frame_extension(),
            timeout_secs: default_timeout(),
        }
    }
}
