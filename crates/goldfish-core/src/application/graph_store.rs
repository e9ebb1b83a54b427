use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{info, instrument};

use super::process_store::ProcessStore;
use super::{from_document, set_field, to_document};
use crate::document::{Collections, DocumentCollection, Filter};
use crate::domain::graph::fields;
use crate::domain::identifiers::generate_id;
use crate::domain::validation::validate_email;
use crate::domain::{Graph, NewGraph};
use crate::error::{CoreError, CoreResult};

const KIND: &str = "Graph";

/// Outcome of a cascading graph deletion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GraphDeletion {
    pub processes_deleted: u64,
}

/// Store for graph documents
#[derive(Clone)]
pub struct GraphStore {
    graphs: Arc<dyn DocumentCollection>,
    processes: ProcessStore,
}

impl GraphStore {
    pub fn new(collections: &Collections) -> Self {
        Self {
            graphs: collections.graphs.clone(),
            processes: ProcessStore::new(collections),
        }
    }

    pub async fn find_by_id(&self, id: &str) -> CoreResult<Option<Graph>> {
        self.find_one(&Filter::by_id(id)).await
    }

    /// First graph with the given project name
    pub async fn find_by_project_name(&self, project_name: &str) -> CoreResult<Option<Graph>> {
        self.find_one(&Filter::eq(fields::PROJECT_NAME, project_name)).await
    }

    pub async fn find_by_owner(&self, owner: &str) -> CoreResult<Vec<Graph>> {
        self.find_many(&Filter::eq(fields::OWNER, owner)).await
    }

    pub async fn find_by_owner_email(&self, owner_email: &str) -> CoreResult<Vec<Graph>> {
        self.find_many(&Filter::eq(fields::OWNER_EMAIL, owner_email)).await
    }

    pub async fn find_one(&self, filter: &Filter) -> CoreResult<Option<Graph>> {
        match self.graphs.find_one(filter).await? {
            Some(document) => Ok(Some(from_document(document)?)),
            None => Ok(None),
        }
    }

    pub async fn find_many(&self, filter: &Filter) -> CoreResult<Vec<Graph>> {
        self.graphs
            .find_many(filter)
            .await?
            .into_iter()
            .map(from_document)
            .collect()
    }

    pub async fn update_project_name(&self, id: &str, project_name: &str) -> CoreResult<()> {
        self.update_field(id, fields::PROJECT_NAME, Value::from(project_name)).await
    }

    pub async fn update_owner(&self, id: &str, owner: &str) -> CoreResult<()> {
        self.update_field(id, fields::OWNER, Value::from(owner)).await
    }

    pub async fn update_owner_email(&self, id: &str, owner_email: &str) -> CoreResult<()> {
        validate_email(owner_email)?;
        self.update_field(id, fields::OWNER_EMAIL, Value::from(owner_email)).await
    }

    pub async fn update_process_meta_data(&self, id: &str, meta_data: Map<String, Value>) -> CoreResult<()> {
        self.update_field(id, fields::PROCESS_META_DATA, Value::Object(meta_data))
            .await
    }

    /// Overwrite the process list with a new ordering.
    ///
    /// Callers are expected to pass a permutation of the current list; the
    /// list is stored exactly as given.
    #[instrument(skip(self, process_list), fields(graph_id = %id, len = process_list.len()))]
    pub async fn update_process_list_order(&self, id: &str, process_list: Vec<String>) -> CoreResult<()> {
        self.update_field(id, fields::PROCESS_LIST, Value::from(process_list)).await
    }

    async fn update_field(&self, id: &str, field: &str, value: Value) -> CoreResult<()> {
        set_field(self.graphs.as_ref(), KIND, id, field, value, fields::DATE_UPDATED).await
    }

    /// Delete a graph together with every process it owns.
    ///
    /// Children go first so a failure never leaves processes pointing at a
    /// deleted graph. Having no children is not an error; a missing graph is.
    #[instrument(skip(self), fields(graph_id = %id))]
    pub async fn delete(&self, id: &str) -> CoreResult<GraphDeletion> {
        let processes_deleted = self.processes.delete_by_parent(id).await?;

        if self.graphs.delete_one(id).await? == 0 {
            return Err(CoreError::not_found(KIND, id));
        }

        info!(processes_deleted, "Graph deleted");
        Ok(GraphDeletion { processes_deleted })
    }

    pub async fn create(&self, payload: NewGraph) -> CoreResult<Graph> {
        payload.validate()?;

        let graph = payload.into_graph(generate_id());
        self.graphs.insert_one(to_document(&graph)?).await?;

        info!(graph_id = %graph.id, project_name = %graph.project_name, "Graph created");
        Ok(graph)
    }
}
