//! Publisher that only logs.

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use crate::animation::AnimationArtifact;

use super::error::PublishError;
use super::traits::Publisher;
use super::types::{MediaPost, TextPost};

/// Logs the post it would have made and returns synthetic ids.
#[derive(Debug, Default)]
pub struct DryRunPublisher;

impl DryRunPublisher {
    pub fn new() -> Self {
        Self
    }
}

fn synthetic_id() -> String {
    format!("dry-run-{}", Uuid::new_v4())
}

#[async_trait]
impl Publisher for DryRunPublisher {
    fn name(&self) -> &str {
        "dry_run"
    }

    async fn publish_media(
        &self,
        artifact: &AnimationArtifact,
        caption: &str,
    ) -> Result<MediaPost, PublishError> {
        if !tokio::fs::try_exists(&artifact.path).await? {
            return Err(PublishError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("animation not found: {}", artifact.path.display()),
            )));
        }
        let post = MediaPost {
            media_id: synthetic_id(),
            post_id: synthetic_id(),
        };
        info!(
            path = %artifact.path.display(),
            frames = artifact.frame_count,
            size_bytes = artifact.size_bytes,
            sha256 = %artifact.sha256,
            caption,
            post_id = %post.post_id,
            "Dry run: media post not sent"
        );
        Ok(post)
    }

    async fn publish_text(&self, message: &str) -> Result<TextPost, PublishError> {
        let post = TextPost {
            post_id: synthetic_id(),
        };
        info!(message, post_id = %post.post_id, "Dry run: text post not sent");
        Ok(post)
    }
}
