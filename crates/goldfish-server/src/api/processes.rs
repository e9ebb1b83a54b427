//! Process step handlers

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query, State},
    response::Response,
    Json,
};
use goldfish_core::{ElasticDataPaths, FileLocationType, NewProcess};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::info;

use super::errors::ApiError;
use super::{found, found_all, ok, FilterParams};
use crate::server::GoldfishServer;

#[derive(Debug, Deserialize)]
pub struct MetaDataUpdate {
    pub update_id: String,
    pub meta_data: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct ElasticDataPathsUpdate {
    pub update_id: String,
    pub elastic_data_paths: ElasticDataPaths,
}

#[derive(Debug, Deserialize)]
pub struct FileLocationTypeUpdate {
    pub update_id: String,
    pub file_location_type: FileLocationType,
}

/// Where to splice a new process into its parent's list
#[derive(Debug, Default, Deserialize)]
pub struct CreateProcessParams {
    #[serde(default)]
    pub list_insert_location: Option<usize>,
}

pub async fn read_process_instance(
    State(server): State<Arc<GoldfishServer>>,
    params: Result<Query<FilterParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(params) = params?;
    let filter = params.parse()?;
    found(server.processes().find_one(&filter).await?, "Process")
}

pub async fn read_process_collection(
    State(server): State<Arc<GoldfishServer>>,
    params: Result<Query<FilterParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(params) = params?;
    let filter = params.parse()?;
    found_all(server.processes().find_many(&filter).await?, "Processes")
}

pub async fn read_process_by_id(
    State(server): State<Arc<GoldfishServer>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    found(server.processes().find_by_id(&id).await?, "Process")
}

pub async fn read_processes_by_parent(
    State(server): State<Arc<GoldfishServer>>,
    Path(parent_graph): Path<String>,
) -> Result<Response, ApiError> {
    found_all(server.processes().find_by_parent_graph(&parent_graph).await?, "Processes")
}

pub async fn read_processes_by_data_key(
    State(server): State<Arc<GoldfishServer>>,
    Path(data_key): Path<String>,
) -> Result<Response, ApiError> {
    found_all(server.processes().find_by_data_key(&data_key).await?, "Processes")
}

pub async fn read_processes_by_file_location_type(
    State(server): State<Arc<GoldfishServer>>,
    Path(file_location_type): Path<String>,
) -> Result<Response, ApiError> {
    let kind: FileLocationType = file_location_type.parse()?;
    found_all(server.processes().find_by_file_location_type(kind).await?, "Processes")
}

pub async fn update_meta_data(
    State(server): State<Arc<GoldfishServer>>,
    payload: Result<Json<MetaDataUpdate>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    server
        .processes()
        .update_meta_data(&request.update_id, request.meta_data)
        .await?;
    Ok(ok(json!({ "updated": request.update_id })))
}

pub async fn update_elastic_data_paths(
    State(server): State<Arc<GoldfishServer>>,
    payload: Result<Json<ElasticDataPathsUpdate>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    server
        .processes()
        .update_elastic_data_paths(&request.update_id, request.elastic_data_paths)
        .await?;
    Ok(ok(json!({ "updated": request.update_id })))
}

pub async fn update_file_location_type(
    State(server): State<Arc<GoldfishServer>>,
    payload: Result<Json<FileLocationTypeUpdate>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    server
        .processes()
        .update_file_location_type(&request.update_id, request.file_location_type)
        .await?;
    Ok(ok(json!({ "updated": request.update_id })))
}

pub async fn delete_process(
    State(server): State<Arc<GoldfishServer>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    info!(%id, "Deleting process");
    server.processes().delete(&id).await?;
    Ok(ok(json!({ "deleted": id })))
}

pub async fn create_process(
    State(server): State<Arc<GoldfishServer>>,
    params: Result<Query<CreateProcessParams>, QueryRejection>,
    payload: Result<Json<NewProcess>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Query(params) = params?;
    let Json(new_process) = payload?;
    let process = server
        .processes()
        .create(new_process, params.list_insert_location)
        .await?;
    Ok(ok(process))
}
