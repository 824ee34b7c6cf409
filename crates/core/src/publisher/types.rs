//! Types for the publisher module.

use serde::Serialize;

use crate::animation::AnimationArtifact;

/// A post carrying the animation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaPost {
    pub media_id: String,
    pub post_id: String,
}

/// A text-only post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextPost {
    pub post_id: String,
}

/// What a run publishes, decided once acquisition is over.
#[derive(Debug, Clone, PartialEq)]
pub enum PublishPlan {
    /// Post the animation with the success caption.
    Media {
        artifact: AnimationArtifact,
        caption: String,
    },
    /// Post the degraded message; `reason` is logged, not posted.
    TextOnly { message: String, reason: String },
}

/// Result of executing a [`PublishPlan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishReceipt {
    Media(MediaPost),
    Text { post: TextPost, reason: String },
}
