//! Trait definitions for the animation module.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::error::EncodeError;
use super::types::AnimationArtifact;

/// Assembles frames into a looping animation.
#[async_trait]
pub trait Animator: Send + Sync {
    /// Returns the name of this animator implementation.
    fn name(&self) -> &str;

    /// Writes an animation of `frames`, in the given order, to `output`.
    async fn assemble(
        &self,
        frames: &[PathBuf],
        output: &Path,
    ) -> Result<AnimationArtifact, EncodeError>;
}
