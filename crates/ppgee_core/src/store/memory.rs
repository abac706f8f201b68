//! In-memory map-of-maps document store.

use super::{
    check_batch_size, merge_fields, BatchWrite, DocumentStore, StoreResult, StoredDocument,
    DEFAULT_MAX_BATCH_WRITES,
};
use crate::model::Document;
use parking_lot::Mutex;
use std::collections::BTreeMap;

type Collections = BTreeMap<String, BTreeMap<String, Document>>;

/// Process-local document store keyed by collection, then document key.
///
/// Contents are lost when the value is dropped. Listing order is key order.
pub struct MemoryDocumentStore {
    collections: Mutex<Collections>,
    max_batch_writes: usize,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::with_max_batch_writes(DEFAULT_MAX_BATCH_WRITES)
    }

    /// Creates a store enforcing a custom batch size limit (minimum 1).
    pub fn with_max_batch_writes(max_batch_writes: usize) -> Self {
        Self {
            collections: Mutex::new(BTreeMap::new()),
            max_batch_writes: max_batch_writes.max(1),
        }
    }

    /// Number of documents stored in `collection`.
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .lock()
            .get(collection)
            .map_or(0, BTreeMap::len)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn max_batch_writes(&self) -> usize {
        self.max_batch_writes
    }

    fn list(&self, collection: &str) -> StoreResult<Vec<StoredDocument>> {
        let collections = self.collections.lock();
        let documents = collections
            .get(collection)
            .map(|documents| {
                documents
                    .iter()
                    .map(|(key, body)| StoredDocument {
                        key: key.clone(),
                        body: body.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(documents)
    }

    fn get(&self, collection: &str, key: &str) -> StoreResult<Option<Document>> {
        let collections = self.collections.lock();
        Ok(collections
            .get(collection)
            .and_then(|documents| documents.get(key))
            .cloned())
    }

    fn set(&self, collection: &str, key: &str, document: &Document) -> StoreResult<()> {
        self.collections
            .lock()
            .entry(collection.to_string())
            .or_default()
            .insert(key.to_string(), document.clone());
        Ok(())
    }

    fn merge(&self, collection: &str, key: &str, patch: &Document) -> StoreResult<()> {
        let mut collections = self.collections.lock();
        let stored = collections
            .entry(collection.to_string())
            .or_default()
            .entry(key.to_string())
            .or_default();
        merge_fields(stored, patch);
        Ok(())
    }

    fn delete(&self, collection: &str, key: &str) -> StoreResult<()> {
        if let Some(documents) = self.collections.lock().get_mut(collection) {
            documents.remove(key);
        }
        Ok(())
    }

    fn commit_batch(&self, collection: &str, writes: &[BatchWrite]) -> StoreResult<()> {
        check_batch_size(writes, self.max_batch_writes)?;

        // Lock held across the whole batch.
        let mut collections = self.collections.lock();
        let documents = collections.entry(collection.to_string()).or_default();
        for write in writes {
            match write {
                BatchWrite::Set { key, document } => {
                    documents.insert(key.clone(), document.clone());
                }
                BatchWrite::Delete { key } => {
                    documents.remove(key);
                }
            }
        }
        Ok(())
    }
}
