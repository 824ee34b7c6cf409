//! Error types for the animation module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while assembling the animation.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// FFmpeg binary not found.
    #[error("FFmpeg not found at path: {path}")]
    FfmpegNotFound { path: PathBuf },

    /// Nothing to animate.
    #[error("No frames to animate")]
    NoFrames,

    /// Encoder process failed.
    #[error("Animation encoding failed: {reason}")]
    Failed {
        reason: String,
        stderr: Option<String>,
    },

    /// Encoding timed out.
    #[error("Animation encoding timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// The encoder exited successfully without writing the output.
    #[error("Animation not created: {path}")]
    OutputMissing { path: PathBuf },

    /// I/O error while writing the frame list or reading the output.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EncodeError {
    pub fn failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
            stderr,
        }
    }
}
