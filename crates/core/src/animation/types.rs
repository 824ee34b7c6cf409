//! Types for the animation module.

use serde::Serialize;
use std::path::PathBuf;

/// The assembled animation, ready for publishing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnimationArtifact {
    pub path: PathBuf,
    pub frame_count: usize,
    pub size_bytes: u64,
    /// Hex SHA-256 of the file.
    pub sha256: String,
}
