use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use super::{from_document, set_field, to_document};
use crate::document::{Collections, DocumentCollection, Filter, Update};
use crate::domain::graph::fields as graph_fields;
use crate::domain::identifiers::generate_id;
use crate::domain::process::fields;
use crate::domain::{ElasticDataPaths, FileLocationType, NewProcess, Process};
use crate::error::{CoreError, CoreResult};

const KIND: &str = "Process";

/// Store for process step documents.
///
/// Holds the graph collection as well, because creating and deleting a
/// process also maintains the parent graph's `process_list`.
#[derive(Clone)]
pub struct ProcessStore {
    processes: Arc<dyn DocumentCollection>,
    graphs: Arc<dyn DocumentCollection>,
}

impl ProcessStore {
    pub fn new(collections: &Collections) -> Self {
        Self {
            processes: collections.processes.clone(),
            graphs: collections.graphs.clone(),
        }
    }

    pub async fn find_by_id(&self, id: &str) -> CoreResult<Option<Process>> {
        self.find_one(&Filter::by_id(id)).await
    }

    pub async fn find_one(&self, filter: &Filter) -> CoreResult<Option<Process>> {
        match self.processes.find_one(filter).await? {
            Some(document) => Ok(Some(from_document(document)?)),
            None => Ok(None),
        }
    }

    pub async fn find_many(&self, filter: &Filter) -> CoreResult<Vec<Process>> {
        self.processes
            .find_many(filter)
            .await?
            .into_iter()
            .map(from_document)
            .collect()
    }

    pub async fn find_by_parent_graph(&self, graph_id: &str) -> CoreResult<Vec<Process>> {
        self.find_many(&Filter::eq(fields::PARENT_GRAPH, graph_id)).await
    }

    /// Processes whose `elastic_data_paths` contain `key`, whatever its value
    pub async fn find_by_data_key(&self, key: &str) -> CoreResult<Vec<Process>> {
        if key.is_empty() || key.contains('.') || key.starts_with('$') {
            return Err(CoreError::ValidationError(format!("invalid data key '{}'", key)));
        }
        let path = format!("{}.{}", fields::ELASTIC_DATA_PATHS, key);
        self.find_many(&Filter::exists(path)).await
    }

    pub async fn find_by_file_location_type(&self, kind: FileLocationType) -> CoreResult<Vec<Process>> {
        self.find_many(&Filter::eq(fields::FILE_LOCATION_TYPE, kind.as_str())).await
    }

    pub async fn update_meta_data(&self, id: &str, meta_data: Map<String, Value>) -> CoreResult<()> {
        self.update_field(id, fields::META_DATA, Value::Object(meta_data)).await
    }

    pub async fn update_elastic_data_paths(&self, id: &str, paths: ElasticDataPaths) -> CoreResult<()> {
        self.update_field(id, fields::ELASTIC_DATA_PATHS, Value::Object(paths))
            .await
    }

    pub async fn update_file_location_type(&self, id: &str, kind: FileLocationType) -> CoreResult<()> {
        self.update_field(id, fields::FILE_LOCATION_TYPE, Value::from(kind.as_str()))
            .await
    }

    async fn update_field(&self, id: &str, field: &str, value: Value) -> CoreResult<()> {
        set_field(self.processes.as_ref(), KIND, id, field, value, fields::DATE_UPDATED).await
    }

    /// Delete a process and unlink it from its parent graph.
    ///
    /// A missing process is reported as not found and nothing else is
    /// touched. The id is pulled from the parent's list with an atomic array
    /// update before the process document itself is removed.
    #[instrument(skip(self), fields(process_id = %id))]
    pub async fn delete(&self, id: &str) -> CoreResult<()> {
        let process = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| CoreError::not_found(KIND, id))?;

        let unlink = Update::new().pull(graph_fields::PROCESS_LIST, id);
        let outcome = self.graphs.update_one(&process.parent_graph, &unlink).await?;
        if outcome.matched == 0 {
            warn!(parent_graph = %process.parent_graph, "Parent graph missing, removing orphaned process");
        }

        if self.processes.delete_one(id).await? == 0 {
            return Err(CoreError::not_found(KIND, id));
        }

        info!(parent_graph = %process.parent_graph, "Process deleted");
        Ok(())
    }

    /// Remove every process owned by a graph. Parent lists are not
    /// rewritten; this only runs as part of deleting the graph itself.
    #[instrument(skip(self))]
    pub async fn delete_by_parent(&self, graph_id: &str) -> CoreResult<u64> {
        let deleted = self
            .processes
            .delete_many(&Filter::eq(fields::PARENT_GRAPH, graph_id))
            .await?;
        info!(deleted, "Child processes deleted");
        Ok(deleted)
    }

    /// Create a process and splice its id into the parent's list.
    ///
    /// `insert_at` of `None` appends; positions past the end also append.
    /// If the splice fails the inserted process is removed again.
    #[instrument(skip(self, payload), fields(parent_graph = %payload.parent_graph))]
    pub async fn create(&self, payload: NewProcess, insert_at: Option<usize>) -> CoreResult<Process> {
        if self.graphs.find_one(&Filter::by_id(&payload.parent_graph)).await?.is_none() {
            return Err(CoreError::not_found("Graph", &payload.parent_graph));
        }

        let process = payload.into_process(generate_id());
        self.processes.insert_one(to_document(&process)?).await?;

        let link = Update::new().push(graph_fields::PROCESS_LIST, process.id.clone(), insert_at);
        match self.graphs.update_one(&process.parent_graph, &link).await {
            Ok(outcome) if outcome.matched > 0 => {
                info!(process_id = %process.id, ?insert_at, "Process created");
                Ok(process)
            }
            Ok(_) => {
                self.discard(&process.id).await;
                Err(CoreError::not_found("Graph", &process.parent_graph))
            }
            Err(err) => {
                self.discard(&process.id).await;
                Err(err.into())
            }
        }
    }

    async fn discard(&self, id: &str) {
        if let Err(err) = self.processes.delete_one(id).await {
            error!(?err, process_id = %id, "Failed to remove process after linking to parent failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::{graph_document, process_document, MockCollection};
    use crate::document::{StoreError, UpdateOp, UpdateOutcome};
    use serde_json::json;

    fn store(processes: MockCollection, graphs: MockCollection) -> ProcessStore {
        ProcessStore::new(&Collections::new(Arc::new(graphs), Arc::new(processes)))
    }

    #[tokio::test]
    async fn deleting_a_missing_process_touches_nothing() {
        let mut processes = MockCollection::new();
        processes.expect_find_one().times(1).returning(|_| Ok(None));
        processes.expect_delete_one().never();
        let mut graphs = MockCollection::new();
        graphs.expect_update_one().never();

        let err = store(processes, graphs).delete("missing").await.unwrap_err();
        assert_eq!(err, CoreError::not_found("Process", "missing"));
    }

    #[tokio::test]
    async fn delete_pulls_id_from_parent_then_removes_document() {
        let mut processes = MockCollection::new();
        processes
            .expect_find_one()
            .returning(|_| Ok(Some(process_document("p1", "g1"))));
        processes
            .expect_delete_one()
            .withf(|id| id == "p1")
            .times(1)
            .returning(|_| Ok(1));

        let mut graphs = MockCollection::new();
        graphs
            .expect_update_one()
            .withf(|id, update| {
                id == "g1"
                    && update.ops()
                        == [UpdateOp::Pull {
                            field: "process_list".to_string(),
                            value: json!("p1"),
                        }]
            })
            .times(1)
            .returning(|_, _| Ok(UpdateOutcome::matched(true)));

        store(processes, graphs).delete("p1").await.unwrap();
    }

    #[tokio::test]
    async fn orphaned_process_is_still_deleted() {
        let mut processes = MockCollection::new();
        processes
            .expect_find_one()
            .returning(|_| Ok(Some(process_document("p1", "gone"))));
        processes.expect_delete_one().times(1).returning(|_| Ok(1));
        let mut graphs = MockCollection::new();
        graphs
            .expect_update_one()
            .returning(|_, _| Ok(UpdateOutcome::not_matched()));

        assert!(store(processes, graphs).delete("p1").await.is_ok());
    }

    #[tokio::test]
    async fn create_with_missing_parent_inserts_nothing() {
        let mut processes = MockCollection::new();
        processes.expect_insert_one().never();
        let mut graphs = MockCollection::new();
        graphs.expect_find_one().returning(|_| Ok(None));
        graphs.expect_update_one().never();

        let err = store(processes, graphs)
            .create(NewProcess::new("g404", FileLocationType::Pool), None)
            .await
            .unwrap_err();
        assert_eq!(err, CoreError::not_found("Graph", "g404"));
    }

    #[tokio::test]
    async fn create_pushes_id_at_requested_position() {
        let mut processes = MockCollection::new();
        processes.expect_insert_one().times(1).returning(|_| Ok(()));
        processes.expect_delete_one().never();
        let mut graphs = MockCollection::new();
        graphs
            .expect_find_one()
            .returning(|_| Ok(Some(graph_document("g1", &["a", "b"]))));
        graphs
            .expect_update_one()
            .withf(|id, update| {
                id == "g1"
                    && matches!(
                        update.ops(),
                        [UpdateOp::Push { field, position: Some(1), .. }] if field == "process_list"
                    )
            })
            .times(1)
            .returning(|_, _| Ok(UpdateOutcome::matched(true)));

        let process = store(processes, graphs)
            .create(NewProcess::new("g1", FileLocationType::DigsLocal), Some(1))
            .await
            .unwrap();
        assert_eq!(process.parent_graph, "g1");
        assert!(!process.id.is_empty());
    }

    #[tokio::test]
    async fn failed_splice_removes_the_inserted_process() {
        let mut processes = MockCollection::new();
        processes.expect_insert_one().returning(|_| Ok(()));
        processes.expect_delete_one().times(1).returning(|_| Ok(1));
        let mut graphs = MockCollection::new();
        graphs
            .expect_find_one()
            .returning(|_| Ok(Some(graph_document("g1", &[]))));
        graphs
            .expect_update_one()
            .returning(|_, _| Err(StoreError::Backend("connection reset".to_string())));

        let err = store(processes, graphs)
            .create(NewProcess::new("g1", FileLocationType::Pool), None)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::OperationFailed(_)));
    }

    #[tokio::test]
    async fn update_of_missing_process_is_not_found() {
        let mut processes = MockCollection::new();
        processes
            .expect_update_one()
            .returning(|_, _| Ok(UpdateOutcome::not_matched()));
        let graphs = MockCollection::new();

        let err = store(processes, graphs)
            .update_file_location_type("p9", FileLocationType::Mixed)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn data_key_query_uses_an_existence_filter() {
        let mut processes = MockCollection::new();
        processes
            .expect_find_many()
            .withf(|filter| *filter == Filter::exists("elastic_data_paths.pdb"))
            .returning(|_| Ok(vec![process_document("p1", "g1")]));
        let graphs = MockCollection::new();

        let found = store(processes, graphs).find_by_data_key("pdb").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].elastic_data_paths["pdb"], json!(["/pool/a.pdb"]));
    }

    #[tokio::test]
    async fn dotted_data_keys_are_rejected() {
        let store = store(MockCollection::new(), MockCollection::new());
        assert!(matches!(
            store.find_by_data_key("pdb.path").await,
            Err(CoreError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn undecodable_documents_surface_as_serialization_errors() {
        let mut processes = MockCollection::new();
        processes
            .expect_find_one()
            .returning(|_| Ok(Some(json!({"_id": "p1"}).as_object().cloned().unwrap())));

        let err = store(processes, MockCollection::new())
            .find_by_id("p1")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::SerializationError(_)));
    }
}
