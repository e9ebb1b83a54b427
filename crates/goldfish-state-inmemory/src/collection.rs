use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

use goldfish_core::document::{document_id, UpdateOutcome};
use goldfish_core::{Document, DocumentCollection, Filter, StoreError, Update};

struct StoredDocument {
    // insertion sequence, gives find results a stable order
    seq: u64,
    document: Document,
}

/// In-memory implementation of a document collection.
///
/// Each document sits in its own map entry; `update_one` holds the entry's
/// write guard for the whole update, so operations on one document are
/// serialized while different documents proceed in parallel.
pub struct InMemoryCollection {
    name: String,
    documents: DashMap<String, StoredDocument>,
    next_seq: AtomicU64,
}

impl InMemoryCollection {
    /// Create an empty collection
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            documents: DashMap::new(),
            next_seq: AtomicU64::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    fn matching(&self, filter: &Filter) -> Vec<(u64, Document)> {
        let mut found: Vec<(u64, Document)> = self
            .documents
            .iter()
            .filter(|entry| filter.matches(&entry.document))
            .map(|entry| (entry.seq, entry.document.clone()))
            .collect();
        found.sort_by_key(|(seq, _)| *seq);
        found
    }
}

#[async_trait]
impl DocumentCollection for InMemoryCollection {
    async fn find_one(&self, filter: &Filter) -> Result<Option<Document>, StoreError> {
        // direct lookup for the common by-id case
        if let Filter::Eq { path, value } = filter {
            if path == goldfish_core::document::ID_FIELD {
                return Ok(value
                    .as_str()
                    .and_then(|id| self.documents.get(id))
                    .map(|entry| entry.document.clone()));
            }
        }
        Ok(self.matching(filter).into_iter().next().map(|(_, document)| document))
    }

    async fn find_many(&self, filter: &Filter) -> Result<Vec<Document>, StoreError> {
        Ok(self.matching(filter).into_iter().map(|(_, document)| document).collect())
    }

    async fn insert_one(&self, document: Document) -> Result<(), StoreError> {
        let id = document_id(&document)
            .ok_or_else(|| StoreError::Serialization("document is missing a string _id".to_string()))?
            .to_string();

        match self.documents.entry(id) {
            Entry::Occupied(entry) => Err(StoreError::DuplicateKey(entry.key().clone())),
            Entry::Vacant(entry) => {
                let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
                debug!(collection = %self.name, id = %entry.key(), "Inserting document");
                entry.insert(StoredDocument { seq, document });
                Ok(())
            }
        }
    }

    async fn update_one(&self, id: &str, update: &Update) -> Result<UpdateOutcome, StoreError> {
        update.validate()?;
        match self.documents.get_mut(id) {
            Some(mut entry) => {
                let changed = update.apply(&mut entry.document)?;
                Ok(UpdateOutcome::matched(changed))
            }
            None => Ok(UpdateOutcome::not_matched()),
        }
    }

    async fn delete_one(&self, id: &str) -> Result<u64, StoreError> {
        Ok(u64::from(self.documents.remove(id).is_some()))
    }

    async fn delete_many(&self, filter: &Filter) -> Result<u64, StoreError> {
        let mut removed = 0u64;
        self.documents.retain(|_, stored| {
            if filter.matches(&stored.document) {
                removed += 1;
                false
            } else {
                true
            }
        });
        debug!(collection = %self.name, removed, "Deleted matching documents");
        Ok(removed)
    }
}
