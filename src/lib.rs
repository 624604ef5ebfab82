//! TurkGuide client state, with handle renames and alias resolution.

#![forbid(unsafe_code)]

pub mod alias;
pub mod config;
pub mod content;
pub mod error;
pub mod handle;
pub mod rename;
mod router;
pub mod state;
pub mod store;
pub mod telemetry;
pub mod user;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::http::{Method, StatusCode, header};
use axum::routing::get;
use axum::{Router, middleware};
use error::ServerError;
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceBuilder;
use tower_http::LatencyUnit;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{
    DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer,
};

use crate::state::ClientState;
use crate::store::{MemoryRemoteStore, PgRemoteStore, RemoteStore};
use crate::user::ProfileService;

/// MUST NEVER be used in production.
#[cfg(test)]
pub async fn make_request(
    app: Router,
    method: Method,
    path: &str,
    body: String,
) -> axum::http::Response<axum::body::Body> {
    use axum::extract::Request;
    use tower::util::ServiceExt;

    app.oneshot(
        Request::builder()
            .method(method)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(axum::body::Body::from(body))
            .unwrap(),
    )
    .await
    .unwrap()
}

/// State sharing between routes.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::Configuration>,
    pub profiles: ProfileService,
    pub metrics: Option<PrometheusHandle>,
}

/// Create router.
pub fn app(state: AppState) -> Router {
    let middleware = ServiceBuilder::new()
        // Add high level tracing/logging to all requests.
        .layer(
            TraceLayer::new_for_http()
                .on_body_chunk(|chunk: &Bytes, latency: Duration, _span: &tracing::Span| {
                    tracing::trace!(size_bytes = chunk.len(), latency = ?latency, "sending body chunk")
                })
                .make_span_with(DefaultMakeSpan::new().level(tracing::Level::INFO))
                .on_request(DefaultOnRequest::new())
                .on_response(DefaultOnResponse::new().latency_unit(LatencyUnit::Micros)),
        )
        // Set a timeout.
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, Duration::from_secs(10)))
        // Add CORS preflight support.
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::PATCH, Method::OPTIONS])
                .allow_headers(Any),
        );

    Router::new()
        // `GET /status.json` goes to `status`.
        .route("/status.json", get(router::status::handler))
        // `GET /metrics` goes to the Prometheus scrape.
        .route("/metrics", get(router::metrics::handler))
        // `GET /aliases/:HANDLE` resolves a possibly old handle.
        .route("/aliases/{handle}", get(router::aliases::handler))
        .nest("/users", router::users::router())
        .with_state(state)
        .route_layer(middleware::from_fn(telemetry::track))
        .layer(middleware)
}

/// Initialize the application state.
///
/// Loads the persisted snapshot if any, then refreshes it from the backend.
/// An unreachable backend keeps the snapshot.
pub async fn initialize_state(
    config: Arc<config::Configuration>,
    metrics: Option<PrometheusHandle>,
) -> Result<AppState, Box<dyn std::error::Error>> {
    let store: Arc<dyn RemoteStore> = match &config.postgres {
        Some(postgres) => Arc::new(PgRemoteStore::connect(postgres).await?),
        None => {
            tracing::warn!("missing `postgres` entry on `config.yaml` file, using memory store");
            Arc::new(MemoryRemoteStore::default())
        },
    };

    let mut client = match &config.state_path {
        Some(path) => ClientState::load(path).await?.unwrap_or_default(),
        None => ClientState::default(),
    };

    if let Err(err) = client.refresh(store.as_ref(), config.rename.page_size).await {
        tracing::error!(error = %err, "cannot refresh client state, serving snapshot");
    }

    client.aliases.set_capacity(config.rename.alias_capacity);
    if config.rename.compact_aliases {
        let live: Vec<String> = client.roster.handles().map(str::to_owned).collect();
        let dropped = client.aliases.compact(live.iter().map(String::as_str));
        tracing::info!(dropped, remaining = client.aliases.len(), "aliases compacted");
    }

    let mut profiles = ProfileService::new(client, store, config.rename.page_size);
    if let Some(path) = &config.state_path {
        profiles = profiles.persist_to(path.clone());
    }

    Ok(AppState {
        config,
        profiles,
        metrics,
    })
}
