//! Mock downloader and extractor for testing.
//!
//! Both work on the real filesystem so that archive lifecycles can be
//! observed from the outside.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::acquisition::{archive_file_name, AcquireError, Downloader, Extractor};
use crate::catalog::ProductRef;

/// Mock implementation of the Downloader trait.
///
/// Writes a small placeholder archive for each product.
#[derive(Debug, Clone, Default)]
pub struct MockDownloader {
    downloads: Arc<RwLock<Vec<String>>>,
    /// Errors keyed by 1-based call number.
    failures: Arc<RwLock<HashMap<usize, AcquireError>>>,
}

impl MockDownloader {
    /// Create a new mock downloader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the `call`-th download (1-based) fail with `error`.
    pub async fn fail_on_call(&self, call: usize, error: AcquireError) {
        self.failures.write().await.insert(call, error);
    }

    /// Ids of every product a download was attempted for.
    pub async fn recorded_downloads(&self) -> Vec<String> {
        self.downloads.read().await.clone()
    }

    /// Get the number of download attempts.
    pub async fn download_count(&self) -> usize {
        self.downloads.read().await.len()
    }
}

#[async_trait]
impl Downloader for MockDownloader {
    fn name(&self) -> &str {
        "mock"
    }

    async fn download(
        &self,
        product: &ProductRef,
        dest_dir: &Path,
    ) -> Result<PathBuf, AcquireError> {
        let call = {
            let mut downloads = self.downloads.write().await;
            downloads.push(product.id.clone());
            downloads.len()
        };
        if let Some(err) = self.failures.write().await.remove(&call) {
            return Err(err);
        }

        tokio::fs::create_dir_all(dest_dir).await?;
        let path = dest_dir.join(archive_file_name(&product.id));
        tokio::fs::write(&path, product.id.as_bytes()).await?;
        Ok(path)
    }
}

/// A recorded extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedExtraction {
    pub archive: PathBuf,
    pub dest_dir: PathBuf,
    /// Files present in the archive's directory when extraction started.
    pub archives_present: Vec<PathBuf>,
}

/// Mock implementation of the Extractor trait.
///
/// Creates `files_per_archive` raw files named after the archive, or after
/// the stem set with [`MockExtractor::set_raw_stem`].
#[derive(Debug, Clone)]
pub struct MockExtractor {
    extractions: Arc<RwLock<Vec<RecordedExtraction>>>,
    failing_archives: Arc<RwLock<HashSet<String>>>,
    files_per_archive: Arc<RwLock<usize>>,
    raw_stem: Arc<RwLock<Option<String>>>,
}

impl Default for MockExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl MockExtractor {
    /// Create a new mock extractor.
    pub fn new() -> Self {
        Self {
            extractions: Arc::new(RwLock::new(Vec::new())),
            failing_archives: Arc::new(RwLock::new(HashSet::new())),
            files_per_archive: Arc::new(RwLock::new(1)),
            raw_stem: Arc::new(RwLock::new(None)),
        }
    }

    /// Treat the archive of `product_id` as corrupt.
    pub async fn fail_product(&self, product_id: &str) {
        self.failing_archives
            .write()
            .await
            .insert(archive_file_name(product_id));
    }

    /// Set how many raw files each archive yields.
    pub async fn set_files_per_archive(&self, count: usize) {
        *self.files_per_archive.write().await = count;
    }

    /// Give the raw files of every archive the same stem.
    pub async fn set_raw_stem(&self, stem: &str) {
        *self.raw_stem.write().await = Some(stem.to_string());
    }

    /// Get all recorded extractions.
    pub async fn recorded_extractions(&self) -> Vec<RecordedExtraction> {
        self.extractions.read().await.clone()
    }
}

fn list_dir(dir: &Path) -> Vec<PathBuf> {
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)
        .map(|rd| rd.filter_map(|e| e.ok().map(|e| e.path())).collect())
        .unwrap_or_default();
    entries.sort();
    entries
}

#[async_trait]
impl Extractor for MockExtractor {
    async fn extract(&self, archive: &Path, dest_dir: &Path) -> Result<Vec<PathBuf>, AcquireError> {
        let archives_present = archive.parent().map(list_dir).unwrap_or_default();
        self.extractions.write().await.push(RecordedExtraction {
            archive: archive.to_path_buf(),
            dest_dir: dest_dir.to_path_buf(),
            archives_present,
        });

        let file_name = archive
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if self.failing_archives.read().await.contains(&file_name) {
            return Err(AcquireError::decode(archive, "mock corrupt archive"));
        }

        let stem = match self.raw_stem.read().await.clone() {
            Some(stem) => stem,
            None => archive
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };
        tokio::fs::create_dir_all(dest_dir).await?;
        let count = *self.files_per_archive.read().await;
        let mut files = Vec::with_capacity(count);
        for i in 0..count {
            let path = dest_dir.join(format!("{stem}-{i}.nat"));
            tokio::fs::write(&path, b"raw").await?;
            files.push(path);
        }
        Ok(files)
    }
}
