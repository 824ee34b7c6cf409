//! Types for the daily run.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::acquisition::AcquireError;
use crate::animation::EncodeError;
use crate::catalog::{CatalogError, TimeWindow, WindowError};
use crate::compositor::RenderError;
use crate::publisher::PublishError;
use crate::workspace::WorkspaceError;

/// States of a run, in the order a successful run visits them.
///
/// `Done` and `FailedFatal` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Searching,
    Acquiring,
    Composing,
    Animating,
    Publishing,
    Done,
    FailedFatal,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Searching => "searching",
            Self::Acquiring => "acquiring",
            Self::Composing => "composing",
            Self::Animating => "animating",
            Self::Publishing => "publishing",
            Self::Done => "done",
            Self::FailedFatal => "failed_fatal",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::FailedFatal)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of fatal errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Credentials rejected by the catalog or the feed.
    Auth,
    /// Network failure, or a call or external command that timed out.
    Transport,
    /// A product could not be extracted or rendered.
    Decode,
    /// The animation could not be assembled.
    Encode,
    /// Local filesystem failure.
    Workspace,
    /// The run parameters are unusable, including a missing render command.
    Config,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Transport => "transport",
            Self::Decode => "decode",
            Self::Encode => "encode",
            Self::Workspace => "workspace",
            Self::Config => "config",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a run ended, from the feed's point of view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PublishOutcome {
    /// The animation was posted.
    Published { media_id: String, post_id: String },
    /// The fallback text was posted.
    PublishedTextOnly { reason: String, post_id: String },
    /// Nothing was posted.
    Failed { kind: FailureKind, cause: String },
}

impl PublishOutcome {
    /// Metric label of the outcome.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Published { .. } => "published",
            Self::PublishedTextOnly { .. } => "published_text_only",
            Self::Failed { .. } => "failed",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Summary of one run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    /// Nominal search window, if it could be computed.
    pub window: Option<TimeWindow>,
    pub outcome: PublishOutcome,
    /// Every state entered, starting with `Idle`.
    pub states: Vec<RunState>,
    /// Catalog searches performed, 0 if the search never ran.
    pub attempts_used: u32,
    pub products_found: usize,
    pub frames_rendered: usize,
    pub duration: Duration,
    /// Set when the workspace could not be fully released.
    pub cleanup_error: Option<String>,
}

impl RunReport {
    pub fn final_state(&self) -> RunState {
        self.states.last().copied().unwrap_or(RunState::Idle)
    }

    /// Process exit code: 0 when something was published, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.outcome.is_failure() {
            1
        } else {
            0
        }
    }
}

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("invalid search window: {0}")]
    Window(#[from] WindowError),

    #[error("catalog search failed: {0}")]
    Catalog(#[from] CatalogError),

    #[error("acquisition failed: {0}")]
    Acquire(#[from] AcquireError),

    #[error("compositing failed: {0}")]
    Render(#[from] RenderError),

    #[error("no frames rendered from {products} acquired products")]
    NoFrames { products: usize },

    #[error("animation failed: {0}")]
    Encode(#[from] EncodeError),

    #[error("publishing failed: {0}")]
    Publish(#[from] PublishError),

    #[error("workspace failure: {0}")]
    Workspace(#[from] WorkspaceError),
}

impl RunError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Window(_) => FailureKind::Config,
            Self::Catalog(e) if e.is_auth() => FailureKind::Auth,
            Self::Catalog(_) => FailureKind::Transport,
            Self::Acquire(e) => match e {
                AcquireError::Auth(_) => FailureKind::Auth,
                AcquireError::Transport(_) | AcquireError::Timeout => FailureKind::Transport,
                AcquireError::Decode { .. } => FailureKind::Decode,
                AcquireError::Io(_) | AcquireError::Workspace(_) => FailureKind::Workspace,
            },
            Self::Render(e) => match e {
                RenderError::Failed { .. } | RenderError::OutputMissing { .. } => {
                    FailureKind::Decode
                }
                RenderError::Timeout { .. } => FailureKind::Transport,
                RenderError::CommandNotFound { .. } => FailureKind::Config,
                RenderError::Io(_) => FailureKind::Workspace,
            },
            Self::NoFrames { .. } => FailureKind::Decode,
            Self::Encode(_) => FailureKind::Encode,
            Self::Publish(PublishError::Auth(_)) => FailureKind::Auth,
            Self::Publish(PublishError::Io(_)) => FailureKind::Workspace,
            Self::Publish(_) => FailureKind::Transport,
            Self::Workspace(_) => FailureKind::Workspace,
        }
    }
}
