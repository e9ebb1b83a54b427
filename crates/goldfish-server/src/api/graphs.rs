//! Graph handlers

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query, State},
    response::Response,
    Json,
};
use goldfish_core::NewGraph;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::info;

use super::errors::ApiError;
use super::{found, found_all, ok, FilterParams};
use crate::server::GoldfishServer;

/// Request to rename a graph's project
#[derive(Debug, Deserialize)]
pub struct ProjectNameUpdate {
    pub update_id: String,
    pub project_name: String,
}

#[derive(Debug, Deserialize)]
pub struct OwnerUpdate {
    pub update_id: String,
    pub owner: String,
}

#[derive(Debug, Deserialize)]
pub struct OwnerEmailUpdate {
    pub update_id: String,
    pub owner_email: String,
}

#[derive(Debug, Deserialize)]
pub struct ProcessMetaDataUpdate {
    pub update_id: String,
    pub process_meta_data: Map<String, Value>,
}

/// Request to reorder a graph's process list
#[derive(Debug, Deserialize)]
pub struct ProcessListOrderUpdate {
    pub update_id: String,
    pub process_list: Vec<String>,
}

pub async fn read_graph_instance(
    State(server): State<Arc<GoldfishServer>>,
    params: Result<Query<FilterParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(params) = params?;
    let filter = params.parse()?;
    info!(?filter, "Reading first matching graph");
    found(server.graphs().find_one(&filter).await?, "Graph")
}

pub async fn read_graph_collection(
    State(server): State<Arc<GoldfishServer>>,
    params: Result<Query<FilterParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(params) = params?;
    let filter = params.parse()?;
    info!(?filter, "Reading matching graphs");
    found_all(server.graphs().find_many(&filter).await?, "Graph")
}

pub async fn read_graph_by_id(
    State(server): State<Arc<GoldfishServer>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    found(server.graphs().find_by_id(&id).await?, "Graph")
}

pub async fn read_graph_by_name(
    State(server): State<Arc<GoldfishServer>>,
    Path(project_name): Path<String>,
) -> Result<Response, ApiError> {
    found(server.graphs().find_by_project_name(&project_name).await?, "Graph")
}

pub async fn read_graphs_by_owner(
    State(server): State<Arc<GoldfishServer>>,
    Path(owner): Path<String>,
) -> Result<Response, ApiError> {
    found_all(server.graphs().find_by_owner(&owner).await?, "Graph")
}

pub async fn read_graphs_by_email(
    State(server): State<Arc<GoldfishServer>>,
    Path(email): Path<String>,
) -> Result<Response, ApiError> {
    found_all(server.graphs().find_by_owner_email(&email).await?, "Graph")
}

pub async fn update_project_name(
    State(server): State<Arc<GoldfishServer>>,
    payload: Result<Json<ProjectNameUpdate>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    server
        .graphs()
        .update_project_name(&request.update_id, &request.project_name)
        .await?;
    Ok(ok(json!({ "updated": request.update_id })))
}

pub async fn update_owner(
    State(server): State<Arc<GoldfishServer>>,
    payload: Result<Json<OwnerUpdate>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    server.graphs().update_owner(&request.update_id, &request.owner).await?;
    Ok(ok(json!({ "updated": request.update_id })))
}

pub async fn update_owner_email(
    State(server): State<Arc<GoldfishServer>>,
    payload: Result<Json<OwnerEmailUpdate>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    server
        .graphs()
        .update_owner_email(&request.update_id, &request.owner_email)
        .await?;
    Ok(ok(json!({ "updated": request.update_id })))
}

pub async fn update_process_meta_data(
    State(server): State<Arc<GoldfishServer>>,
    payload: Result<Json<ProcessMetaDataUpdate>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    server
        .graphs()
        .update_process_meta_data(&request.update_id, request.process_meta_data)
        .await?;
    Ok(ok(json!({ "updated": request.update_id })))
}

pub async fn update_process_list_order(
    State(server): State<Arc<GoldfishServer>>,
    payload: Result<Json<ProcessListOrderUpdate>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    info!(graph_id = %request.update_id, "Reordering process list");
    server
        .graphs()
        .update_process_list_order(&request.update_id, request.process_list)
        .await?;
    Ok(ok(json!({ "updated": request.update_id })))
}

pub async fn delete_graph(
    State(server): State<Arc<GoldfishServer>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    info!(%id, "Deleting graph");
    let outcome = server.graphs().delete(&id).await?;
    Ok(ok(json!({
        "deleted": id,
        "processes_deleted": outcome.processes_deleted,
    })))
}

pub async fn create_graph(
    State(server): State<Arc<GoldfishServer>>,
    payload: Result<Json<NewGraph>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(new_graph) = payload?;
    let graph = server.graphs().create(new_graph).await?;
    Ok(ok(graph))
}
