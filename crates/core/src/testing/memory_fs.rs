//! In-memory workspace filesystem for testing.

use async_trait::async_trait;
use std::collections::{BTreeSet, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::workspace::WorkspaceFs;

/// A filesystem call made through [`MemoryFs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsOp {
    CreateDirAll(PathBuf),
    RemoveDirAll(PathBuf),
    RemoveFile(PathBuf),
}

/// Directories and files held by a [`MemoryFs`] at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FsSnapshot {
    pub dirs: BTreeSet<PathBuf>,
    pub files: BTreeSet<PathBuf>,
}

#[derive(Debug, Default)]
struct State {
    tree: FsSnapshot,
    failing: HashSet<PathBuf>,
    operations: Vec<FsOp>,
}

/// Mock implementation of the WorkspaceFs trait.
///
/// Keeps a tree of paths in memory, records every call and can be told to
/// fail on specific paths.
#[derive(Debug, Clone, Default)]
pub struct MemoryFs {
    state: Arc<RwLock<State>>,
}

fn denied(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::PermissionDenied,
        format!("injected failure on {}", path.display()),
    )
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, path.display().to_string())
}

impl MemoryFs {
    /// Create an empty filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, creating its parent directories.
    pub async fn add_file(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let mut state = self.state.write().await;
        if let Some(parent) = path.parent() {
            for dir in parent.ancestors() {
                state.tree.dirs.insert(dir.to_path_buf());
            }
        }
        state.tree.files.insert(path.to_path_buf());
    }

    /// Make every call touching exactly `path` fail.
    pub async fn fail_path(&self, path: impl AsRef<Path>) {
        self.state
            .write()
            .await
            .failing
            .insert(path.as_ref().to_path_buf());
    }

    pub async fn is_dir(&self, path: &Path) -> bool {
        self.state.read().await.tree.dirs.contains(path)
    }

    /// Whether `path` is a directory with nothing below it.
    pub async fn is_empty_dir(&self, path: &Path) -> bool {
        let state = self.state.read().await;
        state.tree.dirs.contains(path)
            && !state.tree.files.iter().any(|f| f.starts_with(path))
            && !state
                .tree
                .dirs
                .iter()
                .any(|d| d != path && d.starts_with(path))
    }

    /// Copy of the current tree.
    pub async fn snapshot(&self) -> FsSnapshot {
        self.state.read().await.tree.clone()
    }

    /// Every call made so far, in order.
    pub async fn operations(&self) -> Vec<FsOp> {
        self.state.read().await.operations.clone()
    }
}

#[async_trait]
impl WorkspaceFs for MemoryFs {
    async fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        let mut state = self.state.write().await;
        state.operations.push(FsOp::CreateDirAll(path.to_path_buf()));
        if state.failing.contains(path) {
            return Err(denied(path));
        }
        for dir in path.ancestors() {
            state.tree.dirs.insert(dir.to_path_buf());
        }
        Ok(())
    }

    async fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        let mut state = self.state.write().await;
        state.operations.push(FsOp::RemoveDirAll(path.to_path_buf()));
        if state.failing.contains(path) {
            return Err(denied(path));
        }
        if !state.tree.dirs.contains(path) {
            return Err(not_found(path));
        }
        state.tree.dirs.retain(|d| !d.starts_with(path));
        state.tree.files.retain(|f| !f.starts_with(path));
        Ok(())
    }

    async fn remove_file(&self, path: &Path) -> io::Result<()> {
        let mut state = self.state.write().await;
        state.operations.push(FsOp::RemoveFile(path.to_path_buf()));
        if state.failing.contains(path) {
            return Err(denied(path));
        }
        if state.tree.files.remove(path) {
            Ok(())
        } else {
            Err(not_found(path))
        }
    }

    async fn exists(&self, path: &Path) -> bool {
        let state = self.state.read().await;
        state.tree.dirs.contains(path) || state.tree.files.contains(path)
    }
}
