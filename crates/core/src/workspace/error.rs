//! Error types for the workspace module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while managing run directories.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    /// Failed to purge a directory left over from a previous run.
    #[error("Failed to purge directory: {path}")]
    PurgeFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create a workspace directory.
    #[error("Failed to create directory: {path}")]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to delete a consumed archive.
    #[error("Failed to remove archive: {path}")]
    ConsumeFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Archive is outside the archives directory.
    #[error("Archive {path} does not belong to this workspace")]
    ForeignArchive { path: PathBuf },

    /// Failed to remove one or more paths during release.
    #[error("Failed to release {} path(s): {}", failures.len(), summarize(failures))]
    ReleaseFailed { failures: Vec<(PathBuf, String)> },
}

fn summarize(failures: &[(PathBuf, String)]) -> String {
    failures
        .iter()
        .map(|(path, reason)| format!("{}: {}", path.display(), reason))
        .collect::<Vec<_>>()
        .join("; ")
}
