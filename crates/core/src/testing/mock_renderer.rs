//! Mock renderer for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::compositor::{frame_stem, RenderError, Renderer};

/// Mock implementation of the Renderer trait.
///
/// Frames are named like [`CommandRenderer`](crate::compositor::CommandRenderer)
/// names them, with a `.png` extension. The frame file is only written when
/// `frames_dir` exists, so the mock also works with purely virtual paths.
#[derive(Debug, Clone, Default)]
pub struct MockRenderer {
    renders: Arc<RwLock<Vec<PathBuf>>>,
    failing_inputs: Arc<RwLock<HashSet<PathBuf>>>,
    next_error: Arc<RwLock<Option<RenderError>>>,
}

impl MockRenderer {
    /// Create a new mock renderer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make rendering of `raw` fail with a decode error.
    pub async fn fail_input(&self, raw: impl AsRef<Path>) {
        self.failing_inputs
            .write()
            .await
            .insert(raw.as_ref().to_path_buf());
    }

    /// Configure the next render to fail with the given error.
    pub async fn set_next_error(&self, error: RenderError) {
        *self.next_error.write().await = Some(error);
    }

    /// Raw files passed to `render`, in call order.
    pub async fn recorded_renders(&self) -> Vec<PathBuf> {
        self.renders.read().await.clone()
    }

    /// Get the number of renders attempted.
    pub async fn render_count(&self) -> usize {
        self.renders.read().await.len()
    }
}

#[async_trait]
impl Renderer for MockRenderer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn render(
        &self,
        raw: &Path,
        frames_dir: &Path,
        sequence: usize,
    ) -> Result<PathBuf, RenderError> {
        self.renders.write().await.push(raw.to_path_buf());

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }
        if self.failing_inputs.read().await.contains(raw) {
            return Err(RenderError::failed("mock render failure", None));
        }

        let frame = frames_dir.join(format!("{}.png", frame_stem(raw, sequence)));
        if tokio::fs::try_exists(frames_dir).await.unwrap_or(false) {
            tokio::fs::write(&frame, b"\x89PNG").await?;
        }
        Ok(frame)
    }
}
