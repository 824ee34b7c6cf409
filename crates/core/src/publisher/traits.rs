//! Trait definitions for the publisher module.

use async_trait::async_trait;

use crate::animation::AnimationArtifact;

use super::error::PublishError;
use super::types::{MediaPost, TextPost};

/// A social feed the run posts to.
///
/// A run calls exactly one of the two methods, at most once.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Returns the name of this publisher implementation.
    fn name(&self) -> &str;

    /// Uploads the animation, then creates a post referencing it.
    async fn publish_media(
        &self,
        artifact: &AnimationArtifact,
        caption: &str,
    ) -> Result<MediaPost, PublishError>;

    /// Creates a text-only post.
    async fn publish_text(&self, message: &str) -> Result<TextPost, PublishError>;
}
