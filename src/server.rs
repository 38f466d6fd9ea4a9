//! HTTP server for exposing Prometheus metrics.
//!
//! This module provides an Axum-based HTTP server that serves the `/metrics`
//! endpoint for Prometheus scraping and a `/health` endpoint for health checks.

use crate::error::{ExporterError, Result};
use crate::exporter::Exporter;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared application state.
#[derive(Clone)]
struct AppState {
    exporter: Arc<Exporter>,
}

/// Build the router serving `/metrics`, `/health` and `/`.
pub fn router(exporter: Arc<Exporter>) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .route("/", get(root_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { exporter })
}

/// Start the HTTP server.
///
/// # Arguments
///
/// * `listen_address` - Address to bind to (e.g., "0.0.0.0:9436")
/// * `exporter` - Exporter scraped on every `/metrics` request
pub async fn start_server(listen_address: &str, exporter: Arc<Exporter>) -> Result<()> {
    let app = router(exporter);

    info!("Starting HTTP server on {}", listen_address);

    let listener = TcpListener::bind(listen_address).await?;

    axum::serve(listener, app)
        .await
        .map_err(|e| ExporterError::Server(e.to_string()))?;

    Ok(())
}

/// Handler for /metrics endpoint.
async fn metrics_handler(State(state): State<AppState>) -> Response {
    info!("Received metrics scrape request");

    // Failed devices are reported through mikrotik_up, the scrape itself still succeeds
    match state.exporter.scrape().await {
        Ok(body) => (StatusCode::OK, body).into_response(),
        Err(e) => {
            warn!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
                .into_response()
        }
    }
}

/// Handler for /health endpoint.
async fn health_handler() -> Response {
    (StatusCode::OK, "OK").into_response()
}

/// Handler for root endpoint.
async fn root_handler(State(state): State<AppState>) -> Response {
    let collectors = state
        .exporter
        .collector_keys()
        .iter()
        .map(|key| format!("<li>{}</li>", key))
        .collect::<String>();

    let html = format!(
        r#"
<!DOCTYPE html>
<html>
<head>
    <title>MikroTik Exporter</title>
    <style>
        body {{ font-family: Arial, sans-serif; margin: 40px; }}
        h1 {{ color: #333; }}
        a {{ color: #0066cc; text-decoration: none; }}
        a:hover {{ text-decoration: underline; }}
        .info {{ background: #f0f0f0; padding: 15px; border-radius: 5px; margin: 20px 0; }}
    </style>
</head>
<body>
    <h1>MikroTik Exporter</h1>
    <div class="info">
        <p>Prometheus metrics exporter for MikroTik RouterOS devices</p>
        <p><strong>Endpoints:</strong></p>
        <ul>
            <li><a href="/metrics">/metrics</a> - Prometheus metrics</li>
            <li><a href="/health">/health</a> - Health check</li>
        </ul>
        <p><strong>Enabled collectors:</strong></p>
        <ul>{}</ul>
    </div>
</body>
</html>
"#,
        collectors
    );

    (StatusCode::OK, axum::response::Html(html)).into_response()
}
