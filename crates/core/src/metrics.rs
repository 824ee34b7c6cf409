//! Prometheus metrics for the daily run.
//!
//! The job is not scraped while it runs; instead the registry is written to
//! a node_exporter textfile after each run.

use std::io;
use std::path::Path;

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// Run
// =============================================================================

/// Completed runs by outcome.
pub static RUNS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("meteoloop_runs_total", "Total runs by outcome"),
        &["outcome"], // "published", "published_text_only", "failed"
    )
    .unwrap()
});

/// Time spent in each pipeline stage.
pub static STAGE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "meteoloop_stage_duration_seconds",
            "Duration of each pipeline stage",
        )
        .buckets(vec![0.5, 1.0, 5.0, 15.0, 30.0, 60.0, 300.0, 900.0, 1800.0, 3600.0]),
        &["stage"],
    )
    .unwrap()
});

/// Unix time at which the last run finished.
pub static LAST_RUN_TIMESTAMP: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "meteoloop_last_run_timestamp_seconds",
        "Unix timestamp of the last finished run",
    )
    .unwrap()
});

// =============================================================================
// Stages
// =============================================================================

/// Catalog search attempts by result.
pub static SEARCH_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "meteoloop_search_attempts_total",
            "Total catalog search attempts",
        ),
        &["result"], // "hit", "empty"
    )
    .unwrap()
});

/// Products downloaded and extracted.
pub static PRODUCTS_ACQUIRED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "meteoloop_products_acquired_total",
        "Total products downloaded and extracted",
    )
    .unwrap()
});

/// Frames rendered.
pub static FRAMES_RENDERED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("meteoloop_frames_rendered_total", "Total frames rendered").unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    registry.register(Box::new(RUNS_TOTAL.clone())).unwrap();
    registry.register(Box::new(STAGE_DURATION.clone())).unwrap();
    registry
        .register(Box::new(LAST_RUN_TIMESTAMP.clone()))
        .unwrap();
    registry.register(Box::new(SEARCH_ATTEMPTS.clone())).unwrap();
    registry
        .register(Box::new(PRODUCTS_ACQUIRED.clone()))
        .unwrap();
    registry.register(Box::new(FRAMES_RENDERED.clone())).unwrap();
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

/// Writes the registry to `path` for the node_exporter textfile collector.
///
/// The file is replaced atomically so the collector never reads a partial
/// export.
pub async fn write_textfile(path: &Path) -> io::Result<()> {
    let text = encode_metrics().map_err(io::Error::other)?;
    let tmp = path.with_extension("prom.tmp");
    tokio::fs::write(&tmp, text).await?;
    tokio::fs::rename(&tmp, path).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_encode_contains_all_metrics() {
        RUNS_TOTAL.with_label_values(&["published"]).inc_by(0);
        STAGE_DURATION.with_label_values(&["searching"]).observe(0.0);
        SEARCH_ATTEMPTS.with_label_values(&["empty"]).inc_by(0);

        let text = encode_metrics().unwrap();

        for name in [
            "meteoloop_runs_total",
            "meteoloop_stage_duration_seconds",
            "meteoloop_last_run_timestamp_seconds",
            "meteoloop_search_attempts_total",
            "meteoloop_products_acquired_total",
            "meteoloop_frames_rendered_total",
        ] {
            assert!(text.contains(name), "missing {name}");
        }
    }

    #[tokio::test]
    async fn test_write_textfile_replaces_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("meteoloop.prom");
        std::fs::write(&path, "stale").unwrap();

        write_textfile(&path).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("meteoloop_"));
        assert!(!temp.path().join("meteoloop.prom.tmp").exists());
    }
}
