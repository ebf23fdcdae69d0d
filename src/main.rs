// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    Router,
    routing::{delete, get, post},
};
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

use crate::application::alert_service::AlertService;
use crate::application::chart_service::ChartService;
use crate::application::coordinator::PollingCoordinator;
use crate::application::session_service::SessionService;
use crate::application::store::SnapshotStore;
use crate::infrastructure::config::load_cloud_config;
use crate::infrastructure::rest_client::RestCloudClient;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    create_alert, delete_alert, device_chart, end_session, health_check, list_alerts,
    list_devices, list_sessions, session_chart, start_session, trigger_refresh,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    let cloud_config = load_cloud_config()?;
    let settings = cloud_config.cloud;
    let request_timeout = Duration::from_secs(settings.request_timeout_secs);
    let scan_interval = Duration::from_secs(settings.scan_interval_secs);

    // Create the cloud client (infrastructure layer)
    let client = Arc::new(RestCloudClient::new(
        settings.api_url,
        settings.api_key,
        settings.username,
        settings.password,
        request_timeout,
    )?);

    // Create the snapshot store and coordinator (application layer)
    let store = Arc::new(SnapshotStore::new());
    let coordinator = Arc::new(PollingCoordinator::new(
        client.clone(),
        store.clone(),
        request_timeout,
    ));

    // Populate the snapshot before serving, then keep polling in the background
    if let Err(err) = coordinator.refresh().await {
        tracing::warn!(error = %err, "initial refresh failed, serving an empty snapshot");
    }
    let _poll = coordinator.clone().start_polling(scan_interval);

    // Create application state
    let state = Arc::new(AppState {
        store: store.clone(),
        coordinator: coordinator.clone(),
        chart_service: ChartService::new(client.clone(), store.clone()),
        session_service: SessionService::new(client.clone(), coordinator.clone()),
        alert_service: AlertService::new(client.clone(), coordinator.clone()),
    });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/devices", get(list_devices))
        .route("/devices/:id/chart", get(device_chart))
        .route("/sessions", get(list_sessions).post(start_session))
        .route("/sessions/:id/end", post(end_session))
        .route("/sessions/:id/chart", get(session_chart))
        .route("/alerts", get(list_alerts).post(create_alert))
        .route("/alerts/:id", delete(delete_alert))
        .route("/refresh", post(trigger_refresh))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = "0.0.0.0:8080".parse()?;
    tracing::info!(%addr, "starting grill-telemetry service");

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
