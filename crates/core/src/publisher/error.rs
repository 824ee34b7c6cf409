//! Error types for the publisher module.

use thiserror::Error;

/// Errors that can occur while publishing.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The feed rejected the credentials.
    #[error("Publisher rejected credentials: {0}")]
    Auth(String),

    /// Network failure.
    #[error("Publish request failed: {0}")]
    Transport(String),

    /// Request timed out.
    #[error("Publish request timed out")]
    Timeout,

    /// The feed answered with an error or an unexpected body.
    #[error("Publisher API error: {0}")]
    Api(String),

    /// The animation could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PublishError {
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }
}
