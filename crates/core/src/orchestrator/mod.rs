//! Pipeline orchestration for the daily run.
//!
//! [`DailyRun`] walks the state machine
//! `Idle → Searching → Acquiring → Composing → Animating → Publishing → Done`,
//! jumping from `Searching` straight to `Publishing` when the search comes
//! back empty, and to the absorbing `FailedFatal` on any unrecoverable error.
//! Each run yields a [`RunReport`] whose outcome maps to the process exit
//! code.

mod runner;
mod types;

pub use runner::{Collaborators, DailyRun};
pub use types::{FailureKind, PublishOutcome, RunError, RunReport, RunState};
