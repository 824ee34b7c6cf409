//! Trait definitions for the compositor module.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::error::RenderError;

/// Turns one raw product file into one image frame.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Returns the name of this renderer implementation.
    fn name(&self) -> &str;

    /// Renders `raw` into a frame inside `frames_dir` and returns its path.
    ///
    /// `sequence` is the frame's position in the animation. Frame names must
    /// be unique per sequence number, since raw files of different products
    /// may share a name.
    async fn render(
        &self,
        raw: &Path,
        frames_dir: &Path,
        sequence: usize,
    ) -> Result<PathBuf, RenderError>;
}
