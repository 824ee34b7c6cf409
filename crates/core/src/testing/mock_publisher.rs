//! Mock publisher for testing.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::animation::AnimationArtifact;
use crate::publisher::{MediaPost, PublishError, Publisher, TextPost};

/// A post the mock accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishedPost {
    Media { path: PathBuf, caption: String },
    Text { message: String },
}

/// Mock implementation of the Publisher trait.
///
/// Successful posts are recorded; `call_count` also counts failed calls.
#[derive(Debug, Clone, Default)]
pub struct MockPublisher {
    posts: Arc<RwLock<Vec<PublishedPost>>>,
    calls: Arc<RwLock<usize>>,
    next_error: Arc<RwLock<Option<PublishError>>>,
}

impl MockPublisher {
    /// Create a new mock publisher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the next call to fail with the given error.
    pub async fn set_next_error(&self, error: PublishError) {
        *self.next_error.write().await = Some(error);
    }

    /// Get all accepted posts.
    pub async fn recorded_posts(&self) -> Vec<PublishedPost> {
        self.posts.read().await.clone()
    }

    /// Number of publish calls, successful or not.
    pub async fn call_count(&self) -> usize {
        *self.calls.read().await
    }

    async fn begin_call(&self) -> Result<usize, PublishError> {
        let mut calls = self.calls.write().await;
        *calls += 1;
        match self.next_error.write().await.take() {
            Some(err) => Err(err),
            None => Ok(*calls),
        }
    }
}

#[async_trait]
impl Publisher for MockPublisher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn publish_media(
        &self,
        artifact: &AnimationArtifact,
        caption: &str,
    ) -> Result<MediaPost, PublishError> {
        let call = self.begin_call().await?;
        self.posts.write().await.push(PublishedPost::Media {
            path: artifact.path.clone(),
            caption: caption.to_string(),
        });
        Ok(MediaPost {
            media_id: format!("media-{call}"),
            post_id: format!("post-{call}"),
        })
    }

    async fn publish_text(&self, message: &str) -> Result<TextPost, PublishError> {
        let call = self.begin_call().await?;
        self.posts.write().await.push(PublishedPost::Text {
            message: message.to_string(),
        });
        Ok(TextPost {
            post_id: format!("post-{call}"),
        })
    }
}
