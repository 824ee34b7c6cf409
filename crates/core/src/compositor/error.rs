//! Error types for the compositor module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while rendering a composite frame.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Rendering command not found.
    #[error("Render command not found: {path}")]
    CommandNotFound { path: PathBuf },

    /// The raw product could not be rendered.
    #[error("Rendering failed: {reason}")]
    Failed {
        reason: String,
        stderr: Option<String>,
    },

    /// Rendering timed out.
    #[error("Rendering timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// The command succeeded but wrote no frame.
    #[error("Rendered frame missing: {path}")]
    OutputMissing { path: PathBuf },

    /// I/O error while preparing the frame.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RenderError {
    pub fn failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
            stderr,
        }
    }

    /// Whether the failure is tied to the input product.
    ///
    /// A missing command or a timeout affects every product alike and is
    /// never a decode error.
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Failed { .. } | Self::OutputMissing { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_decode() {
        assert!(RenderError::failed("bad header", None).is_decode());
        assert!(RenderError::OutputMissing {
            path: "/f/a.png".into()
        }
        .is_decode());
        assert!(!RenderError::Timeout { timeout_secs: 5 }.is_decode());
        assert!(!RenderError::CommandNotFound {
            path: "render".into()
        }
        .is_decode());
    }
}
