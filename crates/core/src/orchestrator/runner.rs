//! The daily run.
//!
//! One linear pass: prepare the workspace, search with fallback, then either
//! acquire, composite, animate and post the animation, or post the fallback
//! text when the catalog had nothing. Every await completes before the next
//! stage starts, and the workspace is released whatever the outcome.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::acquisition::{AcquisitionStage, Downloader, Extractor};
use crate::animation::Animator;
use crate::catalog::{BoundingBox, Catalog, FallbackSearch, TimeWindow, WindowConfig};
use crate::compositor::{CompositionStage, Renderer};
use crate::config::Config;
use crate::metrics;
use crate::publisher::{PublishPlan, PublishReceipt, Publisher, PublisherConfig};
use crate::workspace::{Workspace, WorkspaceFs, WorkspaceManager};

use super::types::{PublishOutcome, RunError, RunReport, RunState};

/// External collaborators of a run.
pub struct Collaborators {
    pub catalog: Arc<dyn Catalog>,
    pub downloader: Arc<dyn Downloader>,
    pub extractor: Arc<dyn Extractor>,
    pub renderer: Arc<dyn Renderer>,
    pub animator: Arc<dyn Animator>,
    pub publisher: Arc<dyn Publisher>,
    pub fs: Arc<dyn WorkspaceFs>,
}

/// State bookkeeping for one run.
struct Progress {
    states: Vec<RunState>,
    entered_at: Instant,
    window: Option<TimeWindow>,
    attempts_used: u32,
    products_found: usize,
    frames_rendered: usize,
}

impl Progress {
    fn new() -> Self {
        Self {
            states: vec![RunState::Idle],
            entered_at: Instant::now(),
            window: None,
            attempts_used: 0,
            products_found: 0,
            frames_rendered: 0,
        }
    }

    fn current(&self) -> RunState {
        self.states.last().copied().unwrap_or(RunState::Idle)
    }

    /// Leaves the current state, recording how long it lasted.
    fn enter(&mut self, next: RunState) {
        let current = self.current();
        metrics::STAGE_DURATION
            .with_label_values(&[current.as_str()])
            .observe(self.entered_at.elapsed().as_secs_f64());
        info!(from = %current, to = %next, "State transition");
        self.states.push(next);
        self.entered_at = Instant::now();
    }
}

/// Drives one daily acquisition-and-publish run.
pub struct DailyRun {
    region: BoundingBox,
    window: WindowConfig,
    search: FallbackSearch,
    acquisition: AcquisitionStage,
    composition: CompositionStage,
    animator: Arc<dyn Animator>,
    publisher: Arc<dyn Publisher>,
    publisher_config: PublisherConfig,
    workspace: WorkspaceManager,
}

impl DailyRun {
    pub fn new(config: &Config, collaborators: Collaborators) -> Self {
        let layout = Workspace::new(&config.workspace.root, &config.animation.output_name);
        Self {
            region: config.region,
            window: config.window.clone(),
            search: FallbackSearch::new(
                collaborators.catalog,
                config.window.max_fallback_attempts,
            ),
            acquisition: AcquisitionStage::new(
                collaborators.downloader,
                collaborators.extractor,
                &config.acquisition,
            ),
            composition: CompositionStage::new(
                collaborators.renderer,
                config.acquisition.on_decode_error,
            ),
            animator: collaborators.animator,
            publisher: collaborators.publisher,
            publisher_config: config.publisher.clone(),
            workspace: WorkspaceManager::new(collaborators.fs, layout),
        }
    }

    /// The directories this run uses.
    pub fn workspace(&self) -> &Workspace {
        self.workspace.layout()
    }

    /// Executes the run for the day implied by `now`.
    ///
    /// Never returns an error: failures end up in the report's outcome.
    pub async fn run(&self, now: DateTime<Utc>) -> RunReport {
        let run_id = Uuid::new_v4();
        let span = info_span!("run", run_id = %run_id);
        self.run_with_id(run_id, now).instrument(span).await
    }

    async fn run_with_id(&self, run_id: Uuid, now: DateTime<Utc>) -> RunReport {
        let started = Instant::now();
        let mut progress = Progress::new();
        info!(publisher = self.publisher.name(), "Run started");

        let result = match AssertUnwindSafe(self.drive(now, &mut progress))
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(payload) => {
                error!(state = %progress.current(), "Run panicked, releasing workspace");
                if let Err(e) = self.workspace.release(self.workspace.layout()).await {
                    warn!(error = %e, "Failed to release workspace");
                }
                panic::resume_unwind(payload);
            }
        };

        let outcome = match result {
            Ok(PublishReceipt::Media(post)) => {
                progress.enter(RunState::Done);
                PublishOutcome::Published {
                    media_id: post.media_id,
                    post_id: post.post_id,
                }
            }
            Ok(PublishReceipt::Text { post, reason }) => {
                progress.enter(RunState::Done);
                PublishOutcome::PublishedTextOnly {
                    reason,
                    post_id: post.post_id,
                }
            }
            Err(e) => {
                let kind = e.kind();
                error!(
                    kind = %kind,
                    cause = %e,
                    state = %progress.current(),
                    "Run failed"
                );
                progress.enter(RunState::FailedFatal);
                PublishOutcome::Failed {
                    kind,
                    cause: e.to_string(),
                }
            }
        };

        debug_assert!(progress.current().is_terminal());

        let cleanup_error = match self.workspace.release(self.workspace.layout()).await {
            Ok(()) => None,
            Err(e) => {
                warn!(error = %e, "Failed to release workspace");
                Some(e.to_string())
            }
        };

        metrics::RUNS_TOTAL.with_label_values(&[outcome.label()]).inc();
        metrics::LAST_RUN_TIMESTAMP.set(Utc::now().timestamp());

        let report = RunReport {
            run_id,
            started_at: now,
            window: progress.window,
            outcome,
            states: progress.states,
            attempts_used: progress.attempts_used,
            products_found: progress.products_found,
            frames_rendered: progress.frames_rendered,
            duration: started.elapsed(),
            cleanup_error,
        };
        info!(
            outcome = report.outcome.label(),
            attempts = report.attempts_used,
            products = report.products_found,
            frames = report.frames_rendered,
            duration_ms = report.duration.as_millis() as u64,
            "Run finished"
        );
        report
    }

    async fn drive(
        &self,
        now: DateTime<Utc>,
        progress: &mut Progress,
    ) -> Result<PublishReceipt, RunError> {
        let nominal = TimeWindow::for_day(now, self.window.offset_days, self.window.length_hours)?;
        progress.window = Some(nominal);

        let workspace = self.workspace.prepare().await?;

        progress.enter(RunState::Searching);
        let found = self.search.search(&nominal, &self.region).await?;
        progress.attempts_used = found.attempts_used;
        progress.products_found = found.products.len();

        let plan = if found.is_empty() {
            PublishPlan::no_imagery(found.attempts_used, &self.publisher_config)
        } else {
            progress.enter(RunState::Acquiring);
            let acquired = self
                .acquisition
                .acquire(&found.products, &workspace, &self.workspace)
                .await?;

            progress.enter(RunState::Composing);
            let frames = self.composition.compose(&acquired, &workspace).await?;
            progress.frames_rendered = frames.len();
            if frames.is_empty() {
                return Err(RunError::NoFrames {
                    products: acquired.len(),
                });
            }

            progress.enter(RunState::Animating);
            let artifact = self.animator.assemble(&frames, workspace.artifact()).await?;
            PublishPlan::media(artifact, &self.publisher_config)
        };

        progress.enter(RunState::Publishing);
        Ok(plan.execute(self.publisher.as_ref()).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_from_str;
    use crate::testing::{
        fixtures, FsOp, MemoryFs, MockAnimator, MockCatalog, MockDownloader, MockExtractor,
        MockPublisher, MockRenderer,
    };

    fn config() -> Config {
        load_config_from_str(
            r#"
[region]
min_lon = -25.0
min_lat = 33.0
max_lon = 45.0
max_lat = 72.0

[workspace]
root = "/work"

[publisher]
backend = "dry_run"
"#,
        )
        .unwrap()
    }

    struct Mocks {
        catalog: Arc<MockCatalog>,
        publisher: Arc<MockPublisher>,
        fs: Arc<MemoryFs>,
    }

    fn daily_run() -> (DailyRun, Mocks) {
        let mocks = Mocks {
            catalog: Arc::new(MockCatalog::new()),
            publisher: Arc::new(MockPublisher::new()),
            fs: Arc::new(MemoryFs::new()),
        };
        let run = DailyRun::new(
            &config(),
            Collaborators {
                catalog: mocks.catalog.clone(),
                downloader: Arc::new(MockDownloader::new()),
                extractor: Arc::new(MockExtractor::new()),
                renderer: Arc::new(MockRenderer::new()),
                animator: Arc::new(MockAnimator::new()),
                publisher: mocks.publisher.clone(),
                fs: mocks.fs.clone(),
            },
        );
        (run, mocks)
    }

    #[tokio::test]
    async fn test_empty_search_posts_text_and_skips_stages() {
        let (run, mocks) = daily_run();

        let report = run.run(fixtures::run_time()).await;

        assert!(matches!(
            report.outcome,
            PublishOutcome::PublishedTextOnly { .. }
        ));
        assert_eq!(
            report.states,
            vec![
                RunState::Idle,
                RunState::Searching,
                RunState::Publishing,
                RunState::Done
            ]
        );
        assert_eq!(report.attempts_used, 3);
        assert_eq!(report.window, Some(fixtures::nominal_window()));
        assert_eq!(mocks.catalog.search_count().await, 3);
        assert_eq!(mocks.publisher.call_count().await, 1);
        assert_eq!(report.exit_code(), 0);
    }

    #[tokio::test]
    async fn test_workspace_prepared_before_search_and_released_after() {
        let (run, mocks) = daily_run();
        mocks.fs.add_file("/work/archives/stale.zip").await;

        run.run(fixtures::run_time()).await;

        let ops = mocks.fs.operations().await;
        assert_eq!(ops.first(), Some(&FsOp::RemoveFile("/work/Meteosat_Europe.gif".into())));
        assert_eq!(ops.last(), Some(&FsOp::RemoveFile("/work/Meteosat_Europe.gif".into())));
        for dir in run.workspace().directories() {
            assert!(!mocks.fs.exists(dir).await);
        }
    }

    #[tokio::test]
    async fn test_prepare_failure_is_fatal_without_search() {
        let (run, mocks) = daily_run();
        mocks.fs.fail_path("/work/frames").await;

        let report = run.run(fixtures::run_time()).await;

        match &report.outcome {
            PublishOutcome::Failed { kind, .. } => {
                assert_eq!(*kind, crate::orchestrator::FailureKind::Workspace)
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(report.states, vec![RunState::Idle, RunState::FailedFatal]);
        assert_eq!(mocks.catalog.search_count().await, 0);
        assert_eq!(mocks.publisher.call_count().await, 0);
        assert!(report.cleanup_error.is_some());
        assert_eq!(report.exit_code(), 1);
    }

    struct PanickingDownloader;

    #[async_trait::async_trait]
    impl Downloader for PanickingDownloader {
        fn name(&self) -> &str {
            "panicking"
        }

        async fn download(
            &self,
            _product: &crate::catalog::ProductRef,
            _dest_dir: &std::path::Path,
        ) -> Result<std::path::PathBuf, crate::acquisition::AcquireError> {
            panic!("downloader crashed");
        }
    }

    #[tokio::test]
    async fn test_workspace_released_when_collaborator_panics() {
        let catalog = Arc::new(MockCatalog::new());
        catalog.push_response(Ok(fixtures::hourly_products(2))).await;
        let publisher = Arc::new(MockPublisher::new());
        let fs = Arc::new(MemoryFs::new());
        let run = DailyRun::new(
            &config(),
            Collaborators {
                catalog,
                downloader: Arc::new(PanickingDownloader),
                extractor: Arc::new(MockExtractor::new()),
                renderer: Arc::new(MockRenderer::new()),
                animator: Arc::new(MockAnimator::new()),
                publisher: publisher.clone(),
                fs: fs.clone(),
            },
        );
        let directories: Vec<_> = run
            .workspace()
            .directories()
            .iter()
            .map(|d| d.to_path_buf())
            .collect();

        let joined = tokio::spawn(async move { run.run(fixtures::run_time()).await }).await;

        assert!(joined.unwrap_err().is_panic());
        for dir in directories {
            assert!(!fs.exists(&dir).await);
        }
        assert_eq!(publisher.call_count().await, 0);
    }

    #[tokio::test]
    async fn test_publish_failure_is_fatal() {
        let (run, mocks) = daily_run();
        mocks
            .publisher
            .set_next_error(crate::publisher::PublishError::Timeout)
            .await;

        let report = run.run(fixtures::run_time()).await;

        assert_eq!(report.final_state(), RunState::FailedFatal);
        assert_eq!(mocks.publisher.call_count().await, 1);
        assert!(mocks.publisher.recorded_posts().await.is_empty());
    }
}
