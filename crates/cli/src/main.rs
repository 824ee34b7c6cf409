use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use meteoloop_core::metrics;
use meteoloop_core::{
    load_config, validate_config, Collaborators, CommandRenderer, DailyRun, DryRunPublisher,
    EumetsatClient, FfmpegAnimator, LocalFs, PublishOutcome, Publisher, PublisherBackend,
    SanitizedConfig, XPublisher, ZipExtractor,
};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    match run().await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("Fatal error: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn init_logging() {
    let json = std::env::var("METEOLOOP_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(|| tracing_subscriber::fmt::layer()))
        .init();
}

async fn run() -> Result<i32> {
    init_logging();
    info!(version = VERSION, "meteoloop starting");

    // Determine config path
    let config_path = std::env::var("METEOLOOP_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    let sanitized = SanitizedConfig::from(&config);
    let config_json = serde_json::to_string(&sanitized).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!(
        config_hash = &config_hash[..16],
        config = %config_json,
        "Configuration loaded successfully"
    );

    // The Data Store client serves both the search and the downloads.
    let eumetsat = Arc::new(
        EumetsatClient::new(config.catalog.clone()).context("Failed to create catalog client")?,
    );

    let publisher: Arc<dyn Publisher> = match config.publisher.backend {
        PublisherBackend::X => {
            let x_config = config
                .publisher
                .x
                .clone()
                .context("publisher.x section is required for the x backend")?;
            info!("Publishing to X at {}", x_config.api_url);
            Arc::new(XPublisher::new(x_config).context("Failed to create X publisher")?)
        }
        PublisherBackend::DryRun => {
            info!("Dry run: posts will only be logged");
            Arc::new(DryRunPublisher::new())
        }
    };

    let daily_run = DailyRun::new(
        &config,
        Collaborators {
            catalog: eumetsat.clone(),
            downloader: eumetsat,
            extractor: Arc::new(ZipExtractor::new(config.acquisition.raw_extension.clone())),
            renderer: Arc::new(CommandRenderer::new(config.compositor.clone())),
            animator: Arc::new(FfmpegAnimator::new(config.animation.clone())),
            publisher,
            fs: Arc::new(LocalFs),
        },
    );

    let report = daily_run.run(Utc::now()).await;

    match &report.outcome {
        PublishOutcome::Published { media_id, post_id } => {
            info!(media_id = %media_id, post_id = %post_id, "Animation published");
        }
        PublishOutcome::PublishedTextOnly { reason, post_id } => {
            warn!(reason = %reason, post_id = %post_id, "Published text-only update");
        }
        PublishOutcome::Failed { kind, cause } => {
            error!(kind = %kind, cause = %cause, "Run failed, nothing published");
        }
    }

    if let Some(path) = &config.metrics.textfile_path {
        match metrics::write_textfile(path).await {
            Ok(()) => info!("Metrics written to {:?}", path),
            Err(e) => warn!("Failed to write metrics to {:?}: {}", path, e),
        }
    }

    Ok(report.exit_code())
}
