use std::path::PathBuf;
use std::time::Duration;

use turkguide::config::Configuration;
use turkguide::{app, initialize_state, telemetry};

const FANOUT_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    telemetry::init_tracing();

    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.yaml".into());
    let config = Configuration::default().path(PathBuf::from(path)).read()?;

    let metrics = match telemetry::setup_metrics_recorder() {
        Ok(handle) => Some(handle),
        Err(err) => {
            tracing::warn!(error = %err, "metrics recorder not installed");
            None
        },
    };

    let state = initialize_state(config.clone(), metrics).await?;
    let profiles = state.profiles.clone();

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    tracing::info!(name = %config.name, port = config.port, "server started");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    profiles.drain(FANOUT_DRAIN_TIMEOUT).await;

    if let Some(path) = &config.state_path {
        profiles.client().read().await.save(path).await?;
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "cannot listen for shutdown signal");
    }
    tracing::info!("shutting down");
}
