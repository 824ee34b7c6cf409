//! Mock animator for testing.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::animation::{AnimationArtifact, Animator, EncodeError};

/// A recorded assembly call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedAssembly {
    pub frames: Vec<PathBuf>,
    pub output: PathBuf,
}

/// Mock implementation of the Animator trait.
///
/// Writes a tiny GIF header to `output` when its directory exists.
#[derive(Debug, Clone, Default)]
pub struct MockAnimator {
    assemblies: Arc<RwLock<Vec<RecordedAssembly>>>,
    next_error: Arc<RwLock<Option<EncodeError>>>,
}

impl MockAnimator {
    /// Create a new mock animator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the next assembly to fail with the given error.
    pub async fn set_next_error(&self, error: EncodeError) {
        *self.next_error.write().await = Some(error);
    }

    /// Get all recorded assemblies.
    pub async fn recorded_assemblies(&self) -> Vec<RecordedAssembly> {
        self.assemblies.read().await.clone()
    }
}

#[async_trait]
impl Animator for MockAnimator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn assemble(
        &self,
        frames: &[PathBuf],
        output: &Path,
    ) -> Result<AnimationArtifact, EncodeError> {
        self.assemblies.write().await.push(RecordedAssembly {
            frames: frames.to_vec(),
            output: output.to_path_buf(),
        });

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }
        if frames.is_empty() {
            return Err(EncodeError::NoFrames);
        }

        let bytes = format!("GIF89a:{}", frames.len()).into_bytes();
        let parent_exists = match output.parent() {
            Some(dir) => tokio::fs::try_exists(dir).await.unwrap_or(false),
            None => false,
        };
        if parent_exists {
            tokio::fs::write(output, &bytes).await?;
        }

        Ok(AnimationArtifact {
            path: output.to_path_buf(),
            frame_count: frames.len(),
            size_bytes: bytes.len() as u64,
            sha256: format!("{:x}", Sha256::digest(&bytes)),
        })
    }
}
