//! Daily Meteosat imagery acquisition and publishing.
//!
//! The crate is organised by pipeline stage:
//!
//! - [`catalog`]: product search with time-shifting fallback
//! - [`workspace`]: lifecycle of the run's temporary directories
//! - [`acquisition`]: download and extraction, one archive at a time
//! - [`compositor`]: one frame per raw product file
//! - [`animation`]: GIF assembly
//! - [`publisher`]: posting to the feed
//! - [`orchestrator`]: the run state machine tying them together

pub mod acquisition;
pub mod animation;
pub mod catalog;
pub mod compositor;
pub mod config;
pub mod metrics;
pub mod orchestrator;
mod process;
pub mod publisher;
pub mod testing;
pub mod workspace;

pub use acquisition::{
    AcquireError, AcquisitionConfig, DecodeErrorPolicy, Downloader, Extractor, ZipExtractor,
};
pub use animation::{AnimationArtifact, AnimationConfig, Animator, EncodeError, FfmpegAnimator};
pub use catalog::{
    BoundingBox, Catalog, CatalogConfig, CatalogError, EumetsatClient, FallbackSearch,
    ProductRef, SearchOutcome, TimeWindow, WindowConfig,
};
pub use compositor::{CommandRenderer, CompositorConfig, RenderError, Renderer};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, MetricsConfig,
    SanitizedConfig,
};
pub use orchestrator::{
    Collaborators, DailyRun, FailureKind, PublishOutcome, RunError, RunReport, RunState,
};
pub use publisher::{
    DryRunPublisher, PublishError, PublishPlan, Publisher, PublisherBackend, PublisherConfig,
    XPublisher,
};
pub use workspace::{LocalFs, Workspace, WorkspaceConfig, WorkspaceError, WorkspaceFs, WorkspaceManager};
