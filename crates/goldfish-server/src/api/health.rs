//! Health check endpoint for the Goldfish Server

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::server::GoldfishServer;

/// Health check handler
///
/// Reports the server version and whether the document store answers.
/// Responds 503 when the store is down.
pub async fn health_check(State(server): State<Arc<GoldfishServer>>) -> impl IntoResponse {
    debug!("Health check requested");

    let database_status = match server.check_database_health().await {
        Ok(true) => "UP",
        Ok(false) => "DEGRADED",
        Err(err) => {
            warn!(?err, "Document store health check failed");
            "DOWN"
        }
    };

    let (status_code, overall) = if database_status == "DOWN" {
        (StatusCode::SERVICE_UNAVAILABLE, "DOWN")
    } else {
        (StatusCode::OK, "UP")
    };

    let response = json!({
        "status": overall,
        "version": env!("CARGO_PKG_VERSION"),
        "dependencies": {
            "database": { "status": database_status },
        },
    });

    (status_code, Json(response))
}
