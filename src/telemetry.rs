//! Telemetry logic.
//! Support tracing, metrics and logging.
use axum::extract::{MatchedPath, Request};
use axum::middleware::Next;
use axum::response::IntoResponse;
use metrics::Unit;
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use std::time::Instant;

use crate::content::Collection;

pub const RENAMES: &str = "rename_total";
pub const FANOUT_ROWS: &str = "rename_fanout_rows_total";
pub const FANOUT_FAILURES: &str = "rename_fanout_failures_total";

/// Install the global `tracing` subscriber.
///
/// Filter comes from `RUST_LOG`, `info` by default.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();
}

/// Create recorder for Prometheus metrics.
pub fn setup_metrics_recorder() -> Result<PrometheusHandle, BuildError> {
    const EXPONENTIAL_SECONDS: &[f64] = &[
        0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
    ];

    metrics::describe_counter!(RENAMES, Unit::Count, "Committed handle renames.");
    metrics::describe_counter!(
        FANOUT_ROWS,
        Unit::Count,
        "Backend rows rewritten by rename fan-out."
    );
    metrics::describe_counter!(
        FANOUT_FAILURES,
        Unit::Count,
        "Backend requests that failed during rename fan-out."
    );

    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_requests_duration_seconds".to_string()),
            EXPONENTIAL_SECONDS,
        )?
        .install_recorder()
}

/// Count a committed rename.
pub fn record_rename() {
    metrics::counter!(RENAMES).increment(1);
}

/// Count backend rows rewritten for `collection`.
pub fn record_fanout_rows(collection: Collection, rows: u64) {
    metrics::counter!(FANOUT_ROWS, "collection" => collection.to_string()).increment(rows);
}

/// Count a failed backend request for `collection`.
pub fn record_fanout_failure(collection: Collection) {
    metrics::counter!(FANOUT_FAILURES, "collection" => collection.to_string()).increment(1);
}

/// Track HTTP metrics.
pub async fn track(req: Request, next: Next) -> impl IntoResponse {
    let start = Instant::now();
    let path = if let Some(matched_path) = req.extensions().get::<MatchedPath>() {
        matched_path.as_str().to_owned()
    } else {
        req.uri().path().to_owned()
    };
    let method = req.method().clone();

    let response = next.run(req).await;

    let latency = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    let labels = [
        ("method", method.to_string()),
        ("path", path),
        ("status", status),
    ];
    metrics::counter!("http_requests_total", &labels).increment(1);
    metrics::histogram!("http_requests_duration_seconds", &labels).record(latency);

    response
}
