//! Application services - the graph and process stores

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::document::{Collections, Document, DocumentCollection, Update};
use crate::domain::identifiers::{now, timestamp_value};
use crate::error::{CoreError, CoreResult};

/// Graph store and its integrity rules
pub mod graph_store;

/// Process store and its integrity rules
pub mod process_store;

pub use graph_store::{GraphDeletion, GraphStore};
pub use process_store::ProcessStore;

/// Both stores, built over one set of collections
#[derive(Clone)]
pub struct Stores {
    pub graphs: GraphStore,
    pub processes: ProcessStore,
}

impl Stores {
    pub fn new(collections: &Collections) -> Self {
        Self {
            graphs: GraphStore::new(collections),
            processes: ProcessStore::new(collections),
        }
    }
}

pub(crate) fn to_document<T: Serialize>(value: &T) -> CoreResult<Document> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(CoreError::SerializationError(format!(
            "expected a JSON object, got {}",
            other
        ))),
    }
}

pub(crate) fn from_document<T: DeserializeOwned>(document: Document) -> CoreResult<T> {
    serde_json::from_value(Value::Object(document))
        .map_err(|e| CoreError::SerializationError(format!("Stored document does not decode: {}", e)))
}

/// Set one field and refresh `date_updated` in a single atomic update.
///
/// Succeeds whenever the document exists, even if the value is unchanged.
pub(crate) async fn set_field(
    collection: &dyn DocumentCollection,
    kind: &str,
    id: &str,
    field: &str,
    value: Value,
    date_field: &str,
) -> CoreResult<()> {
    let update = Update::new()
        .set(field, value)
        .set(date_field, timestamp_value(now())?);

    let outcome = collection.update_one(id, &update).await?;
    if outcome.matched == 0 {
        return Err(CoreError::not_found(kind, id));
    }

    tracing::debug!(kind, id, field, "Field updated");
    Ok(())
}
