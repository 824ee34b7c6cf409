//! Publishing to the social feed.
//!
//! The orchestrator builds one [`PublishPlan`] per run and executes it:
//! either the animation with its caption, or the fallback text when the
//! catalog had nothing to offer.

mod config;
mod dry_run;
mod error;
mod plan;
mod traits;
mod types;
mod x;

pub use config::{PublisherBackend, PublisherConfig, XConfig};
pub use dry_run::DryRunPublisher;
pub use error::PublishError;
pub use traits::Publisher;
pub use types::{MediaPost, PublishPlan, PublishReceipt, TextPost};
pub use x::XPublisher;
