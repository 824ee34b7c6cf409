//! Trait definitions for the acquisition module.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::catalog::ProductRef;

use super::error::AcquireError;

/// Fetches product archives.
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Returns the name of this downloader implementation.
    fn name(&self) -> &str;

    /// Downloads the archive of `product` into `dest_dir` and returns its path.
    async fn download(&self, product: &ProductRef, dest_dir: &Path)
        -> Result<PathBuf, AcquireError>;
}

/// Unpacks product archives.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Extracts the raw product files of `archive` into `dest_dir`.
    ///
    /// Returns the extracted files in the order they should be rendered.
    async fn extract(&self, archive: &Path, dest_dir: &Path) -> Result<Vec<PathBuf>, AcquireError>;
}
