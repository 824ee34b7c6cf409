//! Configuration for the acquisition stage.

use serde::{Deserialize, Serialize};

/// What to do when a single product cannot be decoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodeErrorPolicy {
    /// Fail the run; a partial animation is worse than none.
    #[default]
    Abort,
    /// Drop the product and continue with fewer frames.
    Skip,
}

/// Acquisition stage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquisitionConfig {
    /// Keep one product every `sample_step` (1 = all).
    #[serde(default = "default_sample_step")]
    pub sample_step: usize,

    /// Extension of the raw product files inside an archive.
    #[serde(default = "default_raw_extension")]
    pub raw_extension: String,

    #[serde(default)]
    pub on_decode_error: DecodeErrorPolicy,
}

fn default_sample_step() -> usize {
    1
}

fn default_raw_extension() -> String {
    "nat".to_string()
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            sample_step: default_sample_step(),
            raw_extension: default_raw_extension(),
            on_decode_error: DecodeErrorPolicy::default(),
        }
    }
}
