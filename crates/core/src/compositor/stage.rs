//! Renders every acquired raw file into `frames/`.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::acquisition::{AcquiredProduct, DecodeErrorPolicy};
use crate::metrics;
use crate::workspace::Workspace;

use super::error::RenderError;
use super::traits::Renderer;

/// Produces frames in product order, then raw file order.
pub struct CompositionStage {
    renderer: Arc<dyn Renderer>,
    policy: DecodeErrorPolicy,
}

impl CompositionStage {
    pub fn new(renderer: Arc<dyn Renderer>, policy: DecodeErrorPolicy) -> Self {
        Self { renderer, policy }
    }

    /// Renders all raw files and returns the frames in animation order.
    ///
    /// May return an empty list when every file was skipped; callers decide
    /// whether that is fatal.
    pub async fn compose(
        &self,
        products: &[AcquiredProduct],
        workspace: &Workspace,
    ) -> Result<Vec<PathBuf>, RenderError> {
        let total = products.len();
        let mut frames = Vec::new();
        let mut sequence = 0;

        for (index, acquired) in products.iter().enumerate() {
            for raw in &acquired.raw_files {
                let rendered = self
                    .renderer
                    .render(raw, workspace.frames(), sequence)
                    .await;
                sequence += 1;
                match rendered {
                    Ok(frame) => {
                        debug!(raw = %raw.display(), frame = %frame.display(), "Rendered frame");
                        metrics::FRAMES_RENDERED.inc();
                        frames.push(frame);
                    }
                    Err(e) if e.is_decode() && self.policy == DecodeErrorPolicy::Skip => {
                        warn!(raw = %raw.display(), error = %e, "Skipping unrenderable file");
                    }
                    Err(e) => return Err(e),
                }
            }
            info!(
                product_id = %acquired.product.id,
                renderer = self.renderer.name(),
                "[{}/{}] Composited product",
                index + 1,
                total
            );
        }

        Ok(frames)
    }
}
