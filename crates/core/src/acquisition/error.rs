//! Error types for the acquisition module.

use std::path::PathBuf;
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::workspace::WorkspaceError;

/// Errors that can occur while downloading or extracting products.
#[derive(Debug, Error)]
pub enum AcquireError {
    /// Data provider rejected the credentials.
    #[error("Download rejected credentials: {0}")]
    Auth(String),

    /// Network failure or unexpected HTTP status.
    #[error("Download failed: {0}")]
    Transport(String),

    /// Download timed out.
    #[error("Download timed out")]
    Timeout,

    /// Archive is corrupt or holds no usable product.
    #[error("Corrupt archive {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    /// I/O error while writing archive or product files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Workspace bookkeeping failed.
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
}

impl AcquireError {
    /// Creates a decode error for an archive.
    pub fn decode(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Decode {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error concerns the content of one product rather than
    /// the environment.
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }
}

impl From<CatalogError> for AcquireError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::Auth(reason) => Self::Auth(reason),
            CatalogError::Timeout => Self::Timeout,
            CatalogError::Transport(reason) | CatalogError::Api(reason) => Self::Transport(reason),
        }
    }
}
