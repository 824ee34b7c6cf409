//! Filesystem seam for the workspace manager.

use async_trait::async_trait;
use std::io;
use std::path::Path;
use tokio::fs;

/// The filesystem operations the workspace manager needs.
///
/// Implementations report raw I/O results; treating a missing path as
/// success is the manager's job.
#[async_trait]
pub trait WorkspaceFs: Send + Sync {
    async fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    async fn remove_dir_all(&self, path: &Path) -> io::Result<()>;

    async fn remove_file(&self, path: &Path) -> io::Result<()>;

    async fn exists(&self, path: &Path) -> bool;
}

/// The local disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

#[async_trait]
impl WorkspaceFs for LocalFs {
    async fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path).await
    }

    async fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::remove_dir_all(path).await
    }

    async fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path).await
    }

    async fn exists(&self, path: &Path) -> bool {
        fs::try_exists(path).await.unwrap_or(false)
    }
}
