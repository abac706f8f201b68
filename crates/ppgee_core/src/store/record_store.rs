//! Per-collection record adapter over a `DocumentStore`.
//!
//! # Responsibility
//! - Implement list/create/create-many/update/delete/clear for one collection
//!   addressed by name, keyed by each record's own `id`.
//! - Split bulk writes into sequential chunks of `max_batch_writes()`.
//!
//! # Invariants
//! - `create` is an upsert that overwrites; `update` merges.
//! - `list` always yields an `id` field, falling back to the store key.
//! - Chunk N+1 is only issued after chunk N committed. A failing chunk leaves
//!   earlier chunks committed and reports the count via
//!   `StoreError::PartialBatch`.
//! - No retries; the caller owns retry policy.

use super::{BatchWrite, DocumentStore, StoreError, StoreResult};
use crate::model::Document;
use log::{debug, error, info};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

/// Acknowledgement returned by `delete`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteAck {
    pub message: String,
}

/// Record store adapter shared by every collection.
#[derive(Clone)]
pub struct RecordStore {
    store: Arc<dyn DocumentStore>,
}

impl RecordStore {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Underlying document store handle.
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Returns every record in `collection`, each with an `id` field.
    pub fn list(&self, collection: &str) -> StoreResult<Vec<Document>> {
        let stored = self.store.list(collection)?;
        Ok(stored
            .into_iter()
            .map(|item| {
                let mut body = item.body;
                let has_id = body
                    .get("id")
                    .and_then(Value::as_str)
                    .is_some_and(|id| !id.is_empty());
                if !has_id {
                    body.insert("id".to_string(), Value::String(item.key));
                }
                body
            })
            .collect())
    }

    pub fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        self.store.get(collection, id)
    }

    /// Stores `record` at its `id`, overwriting any previous document.
    pub fn create(&self, collection: &str, record: Document) -> StoreResult<Document> {
        let key = record_key(collection, &record)?;
        self.store.set(collection, &key, &record)?;
        Ok(record)
    }

    /// Stores all `records` in sequential atomic chunks.
    pub fn create_many(&self, collection: &str, records: Vec<Document>) -> StoreResult<Vec<Document>> {
        let writes = records
            .iter()
            .map(|record| {
                Ok(BatchWrite::Set {
                    key: record_key(collection, record)?,
                    document: record.clone(),
                })
            })
            .collect::<StoreResult<Vec<_>>>()?;

        self.commit_chunked(collection, "create_many", writes)?;
        Ok(records)
    }

    /// Merges `record` into the document at its `id`, creating it if absent.
    pub fn update(&self, collection: &str, record: Document) -> StoreResult<Document> {
        let key = record_key(collection, &record)?;
        self.store.merge(collection, &key, &record)?;
        Ok(record)
    }

    /// Removes the document at `id`; missing documents are not an error.
    pub fn delete(&self, collection: &str, id: &str) -> StoreResult<DeleteAck> {
        self.store.delete(collection, id)?;
        Ok(DeleteAck {
            message: format!("Document {id} deleted from {collection}"),
        })
    }

    /// Deletes every document in `collection`; returns how many were removed.
    pub fn clear(&self, collection: &str) -> StoreResult<usize> {
        let writes: Vec<_> = self
            .store
            .list(collection)?
            .into_iter()
            .map(|item| BatchWrite::Delete { key: item.key })
            .collect();
        let total = writes.len();
        if total == 0 {
            return Ok(0);
        }

        self.commit_chunked(collection, "clear", writes)?;
        Ok(total)
    }

    fn commit_chunked(
        &self,
        collection: &str,
        operation: &str,
        writes: Vec<BatchWrite>,
    ) -> StoreResult<()> {
        let started_at = Instant::now();
        let total = writes.len();
        let chunk_size = self.store.max_batch_writes().max(1);
        let mut committed = 0usize;

        for (index, chunk) in writes.chunks(chunk_size).enumerate() {
            if let Err(err) = self.store.commit_batch(collection, chunk) {
                error!(
                    "event=batch_commit module=store status=error backend={} collection={collection} op={operation} chunk={index} committed={committed} total={total} error={err}",
                    self.store.backend_name()
                );
                if committed == 0 {
                    return Err(err);
                }
                return Err(StoreError::PartialBatch {
                    collection: collection.to_string(),
                    committed,
                    total,
                    source: Box::new(err),
                });
            }
            committed += chunk.len();
            debug!(
                "event=batch_commit module=store status=ok collection={collection} op={operation} chunk={index} size={}",
                chunk.len()
            );
        }

        info!(
            "event=bulk_write module=store status=ok backend={} collection={collection} op={operation} total={total} duration_ms={}",
            self.store.backend_name(),
            started_at.elapsed().as_millis()
        );
        Ok(())
    }
}

/// The document key is the record's `id` exactly as given.
fn record_key(collection: &str, record: &Document) -> StoreResult<String> {
    match record.get("id").and_then(Value::as_str) {
        Some(id) if !id.trim().is_empty() => Ok(id.to_string()),
        _ => Err(StoreError::MissingId {
            collection: collection.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::RecordStore;
    use crate::model::Document;
    use crate::store::{DocumentStore, MemoryDocumentStore, StoreError};
    use serde_json::{json, Value};
    use std::sync::Arc;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn list_falls_back_to_store_key_for_missing_id() {
        let store = Arc::new(MemoryDocumentStore::new());
        store
            .set("turmas", "t1", &doc(json!({"disciplina": "Redes"})))
            .expect("seed");
        let records = RecordStore::new(store);

        let listed = records.list("turmas").expect("list");
        assert_eq!(listed, vec![doc(json!({"id": "t1", "disciplina": "Redes"}))]);
    }

    #[test]
    fn create_rejects_blank_id() {
        let records = RecordStore::new(Arc::new(MemoryDocumentStore::new()));
        let err = records
            .create("turmas", doc(json!({"id": "  "})))
            .unwrap_err();
        assert!(matches!(err, StoreError::MissingId { collection } if collection == "turmas"));
    }

    #[test]
    fn create_many_rejects_whole_input_when_any_id_missing() {
        let store = Arc::new(MemoryDocumentStore::new());
        let records = RecordStore::new(store.clone());

        let err = records
            .create_many("turmas", vec![doc(json!({"id": "t1"})), doc(json!({"sala": 2}))])
            .unwrap_err();
        assert!(matches!(err, StoreError::MissingId { .. }));
        assert!(store.is_empty("turmas"));
    }

    #[test]
    fn padded_id_is_keyed_verbatim() {
        let store = Arc::new(MemoryDocumentStore::new());
        let records = RecordStore::new(store.clone());

        records
            .create("graduates", doc(json!({"id": " g1 ", "nome": "Ana"})))
            .expect("create");
        assert!(store.get("graduates", " g1 ").expect("get").is_some());
        assert!(store.get("graduates", "g1").expect("get").is_none());

        records.delete("graduates", " g1 ").expect("delete");
        assert!(records.list("graduates").expect("list").is_empty());
    }

    #[test]
    fn clear_on_empty_collection_is_noop() {
        let records = RecordStore::new(Arc::new(MemoryDocumentStore::new()));
        assert_eq!(records.clear("periodicos").expect("clear"), 0);
    }
}
