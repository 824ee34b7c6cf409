//! Workspace layout and lifecycle.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::error::WorkspaceError;
use super::fs::{LocalFs, WorkspaceFs};

/// Workspace configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Directory holding the per-run subdirectories.
    #[serde(default = "default_root")]
    pub root: PathBuf,
}

fn default_root() -> PathBuf {
    PathBuf::from("downloads")
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
        }
    }
}

/// The directories owned by one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
    archives: PathBuf,
    extracted: PathBuf,
    frames: PathBuf,
    artifact: PathBuf,
}

impl Workspace {
    /// Lays out the workspace under `root`; the animation is written to
    /// `root/<artifact_name>`.
    pub fn new(root: impl Into<PathBuf>, artifact_name: &str) -> Self {
        let root = root.into();
        Self {
            archives: root.join("archives"),
            extracted: root.join("extracted"),
            frames: root.join("frames"),
            artifact: root.join(artifact_name),
            root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Downloaded archives, each removed right after extraction.
    pub fn archives(&self) -> &Path {
        &self.archives
    }

    /// Raw products extracted from archives.
    pub fn extracted(&self) -> &Path {
        &self.extracted
    }

    /// Rendered frames.
    pub fn frames(&self) -> &Path {
        &self.frames
    }

    /// Where the animation is written.
    pub fn artifact(&self) -> &Path {
        &self.artifact
    }

    pub fn directories(&self) -> [&Path; 3] {
        [&self.archives, &self.extracted, &self.frames]
    }

    /// Extraction target for one product.
    pub fn product_dir(&self, product_id: &str) -> PathBuf {
        self.extracted.join(sanitize_component(product_id))
    }
}

/// Replaces anything that is not safe in a single path component.
pub(crate) fn sanitize_component(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    match cleaned.trim_matches('.') {
        "" => "_".to_string(),
        _ => cleaned,
    }
}

/// Purges, hands out and releases the run workspace.
///
/// Assumes exclusive ownership of its directories: two runs sharing a root
/// would purge each other's files.
pub struct WorkspaceManager {
    fs: Arc<dyn WorkspaceFs>,
    layout: Workspace,
}

impl WorkspaceManager {
    pub fn new(fs: Arc<dyn WorkspaceFs>, layout: Workspace) -> Self {
        Self { fs, layout }
    }

    /// A manager backed by the local disk.
    pub fn local(layout: Workspace) -> Self {
        Self::new(Arc::new(LocalFs), layout)
    }

    pub fn layout(&self) -> &Workspace {
        &self.layout
    }

    /// Deletes and recreates the run directories.
    ///
    /// Anything left by a previous run, crashed or not, is gone afterwards.
    pub async fn prepare(&self) -> Result<Workspace, WorkspaceError> {
        if let Err(e) = self.fs.remove_file(self.layout.artifact()).await {
            if e.kind() != io::ErrorKind::NotFound {
                return Err(WorkspaceError::PurgeFailed {
                    path: self.layout.artifact().to_path_buf(),
                    source: e,
                });
            }
        }

        for dir in self.layout.directories() {
            match self.fs.remove_dir_all(dir).await {
                Ok(()) => debug!(path = %dir.display(), "Purged stale directory"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(WorkspaceError::PurgeFailed {
                        path: dir.to_path_buf(),
                        source: e,
                    })
                }
            }
            self.fs.create_dir_all(dir).await.map_err(|e| {
                WorkspaceError::DirectoryCreationFailed {
                    path: dir.to_path_buf(),
                    source: e,
                }
            })?;
        }

        info!(root = %self.layout.root().display(), "Workspace prepared");
        Ok(self.layout.clone())
    }

    /// Deletes one archive once its contents have been extracted.
    pub async fn consume_archive(
        &self,
        workspace: &Workspace,
        archive: &Path,
    ) -> Result<(), WorkspaceError> {
        if !archive.starts_with(workspace.archives()) {
            return Err(WorkspaceError::ForeignArchive {
                path: archive.to_path_buf(),
            });
        }
        self.fs
            .remove_file(archive)
            .await
            .map_err(|e| WorkspaceError::ConsumeFailed {
                path: archive.to_path_buf(),
                source: e,
            })?;
        debug!(path = %archive.display(), "Archive consumed");
        Ok(())
    }

    /// Removes every transient artifact of the run.
    ///
    /// Missing paths are fine, so releasing twice is the same as releasing
    /// once. All paths are attempted even if one fails.
    pub async fn release(&self, workspace: &Workspace) -> Result<(), WorkspaceError> {
        let mut failures = Vec::new();

        for dir in workspace.directories() {
            match self.fs.remove_dir_all(dir).await {
                Ok(()) => debug!(path = %dir.display(), "Removed directory"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => failures.push((dir.to_path_buf(), e.to_string())),
            }
        }

        match self.fs.remove_file(workspace.artifact()).await {
            Ok(()) => debug!(path = %workspace.artifact().display(), "Removed animation"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => failures.push((workspace.artifact().to_path_buf(), e.to_string())),
        }

        if failures.is_empty() {
            info!(root = %workspace.root().display(), "Workspace released");
            Ok(())
        } else {
            warn!(failed = failures.len(), "Workspace release incomplete");
            Err(WorkspaceError::ReleaseFailed { failures })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FsOp, MemoryFs};
    use tempfile::TempDir;

    fn layout() -> Workspace {
        Workspace::new("/work", "animation.gif")
    }

    #[test]
    fn test_layout() {
        let ws = layout();
        assert_eq!(ws.archives(), Path::new("/work/archives"));
        assert_eq!(ws.extracted(), Path::new("/work/extracted"));
        assert_eq!(ws.frames(), Path::new("/work/frames"));
        assert_eq!(ws.artifact(), Path::new("/work/animation.gif"));
        assert_eq!(
            ws.product_dir("MSG4/SEVI:01"),
            PathBuf::from("/work/extracted/MSG4_SEVI_01")
        );
    }

    #[test]
    fn test_sanitize_component() {
        assert_eq!(sanitize_component("abc-1.2_x"), "abc-1.2_x");
        assert_eq!(sanitize_component("../etc"), ".._etc");
        assert_eq!(sanitize_component(".."), "_");
        assert_eq!(sanitize_component(""), "_");
    }

    #[tokio::test]
    async fn test_prepare_purges_stale_contents() {
        let fs = Arc::new(MemoryFs::new());
        fs.add_file("/work/archives/stale.zip").await;
        fs.add_file("/work/frames/0001.png").await;
        fs.add_file("/work/animation.gif").await;
        let manager = WorkspaceManager::new(fs.clone(), layout());

        let ws = manager.prepare().await.unwrap();

        for dir in ws.directories() {
            assert!(fs.is_dir(dir).await);
            assert!(fs.is_empty_dir(dir).await);
        }
        assert!(!fs.exists(Path::new("/work/archives/stale.zip")).await);
        assert!(!fs.exists(ws.artifact()).await);
    }

    #[tokio::test]
    async fn test_release_is_idempotent() {
        let fs = Arc::new(MemoryFs::new());
        let manager = WorkspaceManager::new(fs.clone(), layout());
        let ws = manager.prepare().await.unwrap();
        fs.add_file("/work/extracted/p1/raw.nat").await;
        fs.add_file("/work/animation.gif").await;

        manager.release(&ws).await.unwrap();
        let after_first = fs.snapshot().await;
        manager.release(&ws).await.unwrap();
        let after_second = fs.snapshot().await;

        assert_eq!(after_first, after_second);
        for dir in ws.directories() {
            assert!(!fs.exists(dir).await);
        }
        assert!(!fs.exists(ws.artifact()).await);
    }

    #[tokio::test]
    async fn test_release_without_prepare_is_noop() {
        let fs = Arc::new(MemoryFs::new());
        let manager = WorkspaceManager::new(fs.clone(), layout());
        assert!(manager.release(manager.layout()).await.is_ok());
    }

    #[tokio::test]
    async fn test_release_attempts_every_path_and_reports_failures() {
        let fs = Arc::new(MemoryFs::new());
        let manager = WorkspaceManager::new(fs.clone(), layout());
        let ws = manager.prepare().await.unwrap();
        fs.fail_path(ws.extracted()).await;

        let err = manager.release(&ws).await.unwrap_err();

        match err {
            WorkspaceError::ReleaseFailed { failures } => {
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].0, ws.extracted());
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!fs.exists(ws.archives()).await);
        assert!(!fs.exists(ws.frames()).await);
    }

    #[tokio::test]
    async fn test_consume_archive_removes_only_that_archive() {
        let fs = Arc::new(MemoryFs::new());
        let manager = WorkspaceManager::new(fs.clone(), layout());
        let ws = manager.prepare().await.unwrap();
        fs.add_file("/work/archives/a.zip").await;
        fs.add_file("/work/archives/b.zip").await;

        manager
            .consume_archive(&ws, Path::new("/work/archives/a.zip"))
            .await
            .unwrap();

        assert!(!fs.exists(Path::new("/work/archives/a.zip")).await);
        assert!(fs.exists(Path::new("/work/archives/b.zip")).await);
        assert!(fs
            .operations()
            .await
            .contains(&FsOp::RemoveFile(PathBuf::from("/work/archives/a.zip"))));
    }

    #[tokio::test]
    async fn test_consume_archive_rejects_foreign_paths() {
        let fs = Arc::new(MemoryFs::new());
        let manager = WorkspaceManager::new(fs.clone(), layout());
        let ws = manager.prepare().await.unwrap();

        let err = manager
            .consume_archive(&ws, Path::new("/etc/passwd"))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkspaceError::ForeignArchive { .. }));
    }

    #[tokio::test]
    async fn test_local_prepare_and_release() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("run");
        std::fs::create_dir_all(root.join("archives")).unwrap();
        std::fs::write(root.join("archives/leftover.zip"), b"old").unwrap();
        let manager = WorkspaceManager::local(Workspace::new(&root, "out.gif"));

        let ws = manager.prepare().await.unwrap();
        assert_eq!(std::fs::read_dir(ws.archives()).unwrap().count(), 0);

        std::fs::write(ws.artifact(), b"GIF89a").unwrap();
        manager.release(&ws).await.unwrap();
        manager.release(&ws).await.unwrap();

        assert!(!ws.archives().exists());
        assert!(!ws.extracted().exists());
        assert!(!ws.frames().exists());
        assert!(!ws.artifact().exists());
        assert!(root.exists());
    }
}
