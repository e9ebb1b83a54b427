//! API module for the Goldfish Server
//!
//! Routes keep the `/CRUD/{read,update,delete,create}/...` layout existing
//! clients use. Deletes answer on `DELETE /CRUD/delete/{graph,process}/:id`
//! and on the `GET /CRUD/delete/{graph,process}_file_id/:id` form older
//! clients call. Successful responses wrap their payload as `{"result": ..}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use goldfish_core::Filter;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod errors;
pub mod graphs;
pub mod health;
pub mod processes;

use crate::error::ServerError;
use crate::server::GoldfishServer;
use errors::ApiError;

/// Build the router for API endpoints
pub fn build_router(server: Arc<GoldfishServer>) -> Router {
    Router::new()
        // Graph reads
        .route("/CRUD/read/graph_instance/", post(graphs::read_graph_instance))
        .route("/CRUD/read/graph_collection/", post(graphs::read_graph_collection))
        .route("/CRUD/read/graph_id/:id", get(graphs::read_graph_by_id))
        .route("/CRUD/read/graph_name/:project_name", get(graphs::read_graph_by_name))
        .route("/CRUD/read/graph_owner/:owner", get(graphs::read_graphs_by_owner))
        .route("/CRUD/read/graph_email/:email", get(graphs::read_graphs_by_email))
        // Process reads
        .route("/CRUD/read/process_instance/", post(processes::read_process_instance))
        .route("/CRUD/read/process_collection/", post(processes::read_process_collection))
        .route("/CRUD/read/process_id/:id", get(processes::read_process_by_id))
        .route("/CRUD/read/process_parent/:parent_graph", get(processes::read_processes_by_parent))
        .route("/CRUD/read/process_data_type/:data_key", get(processes::read_processes_by_data_key))
        .route(
            "/CRUD/read/process_file_location_type/:file_location_type",
            get(processes::read_processes_by_file_location_type),
        )
        // Graph updates
        .route("/CRUD/update/graph_project_name/", post(graphs::update_project_name))
        .route("/CRUD/update/graph_owner/", post(graphs::update_owner))
        .route("/CRUD/update/graph_owner_email/", post(graphs::update_owner_email))
        .route("/CRUD/update/graph_process_meta_data/", post(graphs::update_process_meta_data))
        .route("/CRUD/update/process_list_order/", post(graphs::update_process_list_order))
        // Process updates
        .route("/CRUD/update/process_meta_data/", post(processes::update_meta_data))
        .route("/CRUD/update/process_elastic_data_paths/", post(processes::update_elastic_data_paths))
        .route("/CRUD/update/process_file_location_type/", post(processes::update_file_location_type))
        // Deletes
        .route("/CRUD/delete/graph/:id", delete(graphs::delete_graph))
        .route("/CRUD/delete/process/:id", delete(processes::delete_process))
        .route("/CRUD/delete/graph_file_id/:id", get(graphs::delete_graph))
        .route("/CRUD/delete/process_file_id/:id", get(processes::delete_process))
        // Creates
        .route("/CRUD/create/graph/", post(graphs::create_graph))
        .route("/CRUD/create/process/", post(processes::create_process))
        // Health check
        .route("/health", get(health::health_check))
        .layer(TraceLayer::new_for_http())
        // Shared state
        .with_state(server)
}

/// Query string carrying a JSON-encoded document filter
#[derive(Debug, Default, Deserialize)]
pub struct FilterParams {
    #[serde(default)]
    pub filter: Option<String>,
}

impl FilterParams {
    /// Parse the filter, treating an absent or blank one as "match all"
    pub fn parse(&self) -> Result<Filter, ServerError> {
        match self.filter.as_deref().map(str::trim) {
            None | Some("") => Ok(Filter::All),
            Some(raw) => {
                let value: serde_json::Value = serde_json::from_str(raw)?;
                Ok(Filter::from_json(&value)?)
            }
        }
    }
}

/// Wrap a payload as `{"result": ..}` with 200 OK
pub(crate) fn ok<T: Serialize>(result: T) -> Response {
    (StatusCode::OK, Json(json!({ "result": result }))).into_response()
}

/// 200 with the value, or 404 when it is absent
pub(crate) fn found<T: Serialize>(result: Option<T>, what: &str) -> Result<Response, ApiError> {
    match result {
        Some(result) => Ok(ok(result)),
        None => Err(ApiError::NotFound(format!("{} not found", what))),
    }
}

/// 200 with the list, or 404 when it is empty
pub(crate) fn found_all<T: Serialize>(results: Vec<T>, what: &str) -> Result<Response, ApiError> {
    if results.is_empty() {
        Err(ApiError::NotFound(format!("{} not found", what)))
    } else {
        Ok(ok(results))
    }
}
