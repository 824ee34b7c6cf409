//! The single publish decision of a run.

use tracing::{info, warn};

use crate::animation::AnimationArtifact;

use super::config::PublisherConfig;
use super::error::PublishError;
use super::traits::Publisher;
use super::types::{PublishPlan, PublishReceipt};

impl PublishPlan {
    /// Post the animation with the configured caption.
    pub fn media(artifact: AnimationArtifact, config: &PublisherConfig) -> Self {
        Self::Media {
            artifact,
            caption: config.caption.clone(),
        }
    }

    /// Post the fallback message after an empty search.
    pub fn no_imagery(attempts_used: u32, config: &PublisherConfig) -> Self {
        Self::TextOnly {
            message: config.fallback_message.clone(),
            reason: format!("no products found after {attempts_used} search attempts"),
        }
    }

    pub fn is_text_only(&self) -> bool {
        matches!(self, Self::TextOnly { .. })
    }

    /// Makes the one publisher call this plan stands for.
    pub async fn execute(&self, publisher: &dyn Publisher) -> Result<PublishReceipt, PublishError> {
        match self {
            Self::Media { artifact, caption } => {
                info!(
                    publisher = publisher.name(),
                    path = %artifact.path.display(),
                    frames = artifact.frame_count,
                    "Publishing animation"
                );
                let post = publisher.publish_media(artifact, caption).await?;
                Ok(PublishReceipt::Media(post))
            }
            Self::TextOnly { message, reason } => {
                warn!(publisher = publisher.name(), reason = %reason, "Publishing text-only update");
                let post = publisher.publish_text(message).await?;
                Ok(PublishReceipt::Text {
                    post,
                    reason: reason.clone(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockPublisher, PublishedPost};
    use std::path::PathBuf;

    fn artifact() -> AnimationArtifact {
        AnimationArtifact {
            path: PathBuf::from("/work/out.gif"),
            frame_count: 12,
            size_bytes: 2048,
            sha256: "00".repeat(32),
        }
    }

    #[test]
    fn test_no_imagery_plan() {
        let plan = PublishPlan::no_imagery(3, &PublisherConfig::default());
        match &plan {
            PublishPlan::TextOnly { message, reason } => {
                assert_eq!(message, &PublisherConfig::default().fallback_message);
                assert!(reason.contains("3 search attempts"));
            }
            other => panic!("unexpected plan: {other:?}"),
        }
        assert!(plan.is_text_only());
    }

    #[tokio::test]
    async fn test_media_plan_posts_once_with_caption() {
        let publisher = MockPublisher::new();
        let config = PublisherConfig::default();

        let receipt = PublishPlan::media(artifact(), &config)
            .execute(&publisher)
            .await
            .unwrap();

        assert!(matches!(receipt, PublishReceipt::Media(_)));
        let posts = publisher.recorded_posts().await;
        assert_eq!(posts.len(), 1);
        assert_eq!(
            posts[0],
            PublishedPost::Media {
                path: PathBuf::from("/work/out.gif"),
                caption: config.caption.clone(),
            }
        );
    }

    #[tokio::test]
    async fn test_text_plan_posts_message_only() {
        let publisher = MockPublisher::new();
        let config = PublisherConfig::default();

        let receipt = PublishPlan::no_imagery(3, &config)
            .execute(&publisher)
            .await
            .unwrap();

        assert!(matches!(receipt, PublishReceipt::Text { .. }));
        assert_eq!(
            publisher.recorded_posts().await,
            vec![PublishedPost::Text {
                message: config.fallback_message.clone()
            }]
        );
    }

    #[tokio::test]
    async fn test_publish_error_propagates() {
        let publisher = MockPublisher::new();
        publisher
            .set_next_error(PublishError::Auth("expired token".into()))
            .await;

        let err = PublishPlan::no_imagery(1, &PublisherConfig::default())
            .execute(&publisher)
            .await
            .unwrap_err();

        assert!(err.is_auth());
    }
}
