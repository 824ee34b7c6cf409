//! X (formerly Twitter) API v2 publisher.
//!
//! Uses an OAuth 2.0 user-context bearer token. Media is uploaded in one
//! multipart request; GIFs are processed asynchronously by X, so the upload
//! status is polled before the post is created.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::animation::AnimationArtifact;

use super::config::XConfig;
use super::error::PublishError;
use super::traits::Publisher;
use super::types::{MediaPost, TextPost};

/// Upper bound on status checks while X processes the upload.
const MAX_PROCESSING_POLLS: u32 = 30;

/// X API v2 client.
pub struct XPublisher {
    client: Client,
    config: XConfig,
}

impl XPublisher {
    /// Create a new X publisher.
    pub fn new(config: XConfig) -> Result<Self, PublishError> {
        if config.access_token.is_empty() {
            return Err(PublishError::Auth("X access token is required".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PublishError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn tweets_url(&self) -> String {
        format!("{}/2/tweets", self.config.api_url.trim_end_matches('/'))
    }

    fn status_url(&self, media_id: &str) -> String {
        format!(
            "{}?command=STATUS&media_id={}",
            self.config.upload_url,
            urlencoding::encode(media_id)
        )
    }

    async fn upload_media(&self, artifact: &AnimationArtifact) -> Result<String, PublishError> {
        let bytes = tokio::fs::read(&artifact.path).await?;
        let file_name = artifact
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "animation.gif".to_string());

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("image/gif")
            .map_err(|e| PublishError::Transport(e.to_string()))?;
        let form = Form::new()
            .text("media_category", "tweet_gif")
            .text("media_type", "image/gif")
            .part("media", part);

        info!(
            path = %artifact.path.display(),
            size_bytes = artifact.size_bytes,
            "Uploading media"
        );

        let response = self
            .client
            .post(&self.config.upload_url)
            .bearer_auth(&self.config.access_token)
            .multipart(form)
            .send()
            .await
            .map_err(map_request_error)?;

        let upload: MediaEnvelope = parse_response(response).await?;
        let media_id = upload.data.id.clone().ok_or_else(|| {
            PublishError::Api("media upload response carries no id".to_string())
        })?;

        self.wait_for_processing(&media_id, upload.data.processing_info)
            .await?;
        Ok(media_id)
    }

    async fn wait_for_processing(
        &self,
        media_id: &str,
        processing: Option<ProcessingInfo>,
    ) -> Result<(), PublishError> {
        poll_processing(processing, MAX_PROCESSING_POLLS, || {
            self.fetch_processing_info(media_id)
        })
        .await
    }

    async fn fetch_processing_info(
        &self,
        media_id: &str,
    ) -> Result<Option<ProcessingInfo>, PublishError> {
        let response = self
            .client
            .get(self.status_url(media_id))
            .bearer_auth(&self.config.access_token)
            .send()
            .await
            .map_err(map_request_error)?;
        let status: MediaEnvelope = parse_response(response).await?;
        Ok(status.data.processing_info)
    }

    async fn create_post(&self, request: &CreatePostRequest<'_>) -> Result<String, PublishError> {
        let response = self
            .client
            .post(self.tweets_url())
            .bearer_auth(&self.config.access_token)
            .json(request)
            .send()
            .await
            .map_err(map_request_error)?;

        let post: PostEnvelope = parse_response(response).await?;
        Ok(post.data.id)
    }
}

#[async_trait]
impl Publisher for XPublisher {
    fn name(&self) -> &str {
        "x"
    }

    async fn publish_media(
        &self,
        artifact: &AnimationArtifact,
        caption: &str,
    ) -> Result<MediaPost, PublishError> {
        let media_id = self.upload_media(artifact).await?;
        let request = CreatePostRequest {
            text: caption,
            media: Some(PostMedia {
                media_ids: vec![media_id.as_str()],
            }),
        };
        let post_id = self.create_post(&request).await?;
        info!(media_id = %media_id, post_id = %post_id, "Media post published");
        Ok(MediaPost { media_id, post_id })
    }

    async fn publish_text(&self, message: &str) -> Result<TextPost, PublishError> {
        let request = CreatePostRequest {
            text: message,
            media: None,
        };
        let post_id = self.create_post(&request).await?;
        info!(post_id = %post_id, "Text post published");
        Ok(TextPost { post_id })
    }
}

/// Follows `processing` until X reports a final state.
///
/// `fetch` is called at most `max_polls` times and every fetched state is
/// inspected, including the last one. No processing info means done.
async fn poll_processing<F, Fut>(
    mut processing: Option<ProcessingInfo>,
    max_polls: u32,
    mut fetch: F,
) -> Result<(), PublishError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<ProcessingInfo>, PublishError>>,
{
    let mut polls = 0;
    loop {
        let Some(info) = processing.take() else {
            return Ok(());
        };
        match info.state.as_str() {
            "succeeded" => return Ok(()),
            "failed" => {
                let reason = info
                    .error
                    .and_then(|e| e.message)
                    .unwrap_or_else(|| "unknown reason".to_string());
                return Err(PublishError::Api(format!("media processing failed: {reason}")));
            }
            state => {
                if polls >= max_polls {
                    return Err(PublishError::Timeout);
                }
                let wait = info.check_after_secs.unwrap_or(1);
                debug!(state, poll = polls + 1, wait_secs = wait, "Media still processing");
                tokio::time::sleep(Duration::from_secs(wait)).await;
            }
        }

        processing = fetch().await?;
        polls += 1;
    }
}

fn map_request_error(e: reqwest::Error) -> PublishError {
    if e.is_timeout() {
        PublishError::Timeout
    } else {
        PublishError::Transport(e.to_string())
    }
}

async fn parse_response<T: for<'de> Deserialize<'de>>(response: Response) -> Result<T, PublishError> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        let body = response.text().await.unwrap_or_default();
        return Err(PublishError::Auth(format!("HTTP {}: {}", status, excerpt(&body))));
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(PublishError::Api(format!("HTTP {}: {}", status, excerpt(&body))));
    }
    response
        .json()
        .await
        .map_err(|e| PublishError::Api(format!("Failed to parse response: {}", e)))
}

fn excerpt(body: &str) -> String {
    body.chars().take(200).collect()
}

// X API request/response types

#[derive(Debug, Serialize)]
struct CreatePostRequest<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    media: Option<PostMedia<'a>>,
}

#[derive(Debug, Serialize)]
struct PostMedia<'a> {
    media_ids: Vec<&'a str>,
}

#[derive(Debug, Deserialize)]
struct PostEnvelope {
    data: PostData,
}

#[derive(Debug, Deserialize)]
struct PostData {
    id: String,
}

#[derive(Debug, Deserialize)]
struct MediaEnvelope {
    data: MediaData,
}

#[derive(Debug, Deserialize)]
struct MediaData {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    processing_info: Option<ProcessingInfo>,
}

#[derive(Debug, Deserialize)]
struct ProcessingInfo {
    state: String,
    #[serde(default)]
    check_after_secs: Option<u64>,
    #[serde(default)]
    error: Option<ProcessingError>,
}

#[derive(Debug, Deserialize)]
struct ProcessingError {
    #[serde(default)]
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn publisher() -> XPublisher {
        XPublisher::new(XConfig {
            api_url: "https://api.example.test/".to_string(),
            upload_url: "https://upload.example.test/2/media/upload".to_string(),
            access_token: "token".to_string(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn test_requires_access_token() {
        let err = XPublisher::new(XConfig::default()).err().unwrap();
        assert!(err.is_auth());
    }

    #[test]
    fn test_urls() {
        let p = publisher();
        assert_eq!(p.tweets_url(), "https://api.example.test/2/tweets");
        assert_eq!(
            p.status_url("1880028106020515840"),
            "https://upload.example.test/2/media/upload?command=STATUS&media_id=1880028106020515840"
        );
    }

    #[test]
    fn test_create_post_request_body() {
        let with_media = CreatePostRequest {
            text: "hello",
            media: Some(PostMedia {
                media_ids: vec!["42"],
            }),
        };
        assert_eq!(
            serde_json::to_value(&with_media).unwrap(),
            serde_json::json!({"text": "hello", "media": {"media_ids": ["42"]}})
        );

        let text_only = CreatePostRequest {
            text: "hello",
            media: None,
        };
        assert_eq!(
            serde_json::to_value(&text_only).unwrap(),
            serde_json::json!({"text": "hello"})
        );
    }

    #[test]
    fn test_parse_media_upload_response() {
        let json = r#"{
            "data": {
                "id": "1880028106020515840",
                "media_key": "16_1880028106020515840",
                "size": 1048576,
                "expires_after_secs": 86400,
                "processing_info": {"state": "pending", "check_after_secs": 2}
            }
        }"#;
        let envelope: MediaEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.data.id.as_deref(), Some("1880028106020515840"));
        let info = envelope.data.processing_info.unwrap();
        assert_eq!(info.state, "pending");
        assert_eq!(info.check_after_secs, Some(2));
    }

    #[test]
    fn test_parse_post_response() {
        let json = r#"{"data": {"id": "1445880548472328192", "text": "hello"}}"#;
        let envelope: PostEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.data.id, "1445880548472328192");
    }

    #[tokio::test]
    async fn test_processing_done_without_info() {
        assert!(publisher().wait_for_processing("1", None).await.is_ok());
    }

    fn processing(state: &str) -> Option<ProcessingInfo> {
        Some(ProcessingInfo {
            state: state.to_string(),
            check_after_secs: Some(0),
            error: None,
        })
    }

    #[tokio::test]
    async fn test_success_on_last_poll_is_accepted() {
        let mut fetches = 0;
        let result = poll_processing(processing("pending"), 3, || {
            fetches += 1;
            let state = if fetches == 3 { "succeeded" } else { "in_progress" };
            async move { Ok(processing(state)) }
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(fetches, 3);
    }

    #[tokio::test]
    async fn test_processing_still_pending_after_max_polls() {
        let mut fetches = 0;
        let result = poll_processing(processing("pending"), 2, || {
            fetches += 1;
            async { Ok(processing("in_progress")) }
        })
        .await;

        assert!(matches!(result, Err(PublishError::Timeout)));
        assert_eq!(fetches, 2);
    }

    #[tokio::test]
    async fn test_processing_failure_is_api_error() {
        let info = ProcessingInfo {
            state: "failed".to_string(),
            check_after_secs: None,
            error: Some(ProcessingError {
                message: Some("InvalidMedia".to_string()),
            }),
        };
        let err = publisher()
            .wait_for_processing("1", Some(info))
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::Api(msg) if msg.contains("InvalidMedia")));
    }
}
