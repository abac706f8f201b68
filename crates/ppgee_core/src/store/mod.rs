//! Storage port for the remote document store and its adapters.
//!
//! # Responsibility
//! - Define the `DocumentStore` primitives addressed by collection and key.
//! - Provide the in-memory and SQLite implementations selected at startup.
//! - Provide `RecordStore`, the per-collection list/create/update/delete/clear
//!   adapter with chunked bulk writes.
//!
//! # Invariants
//! - One `commit_batch` call is atomic; nothing spans two calls.
//! - `merge` preserves fields absent from the patch and creates missing keys.
//! - `delete` of a missing key succeeds.

use crate::db::DbError;
use crate::model::Document;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod memory;
mod record_store;
mod sqlite;

pub use memory::MemoryDocumentStore;
pub use record_store::{DeleteAck, RecordStore};
pub use sqlite::SqliteDocumentStore;

/// Maximum writes per atomic batch accepted by the shipped stores.
pub const DEFAULT_MAX_BATCH_WRITES: usize = 500;

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage-layer failure.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    Encoding(serde_json::Error),
    /// Persisted body is not a JSON object.
    InvalidData(String),
    /// Record has no usable `id` to key the document with.
    MissingId { collection: String },
    BatchTooLarge { size: usize, limit: usize },
    /// Store could not be reached or refused the operation.
    Unavailable(String),
    /// A chunked bulk write failed after earlier chunks were committed.
    PartialBatch {
        collection: String,
        committed: usize,
        total: usize,
        source: Box<StoreError>,
    },
}

impl StoreError {
    /// Writes already committed before this error, for chunked bulk writes.
    pub fn committed_writes(&self) -> usize {
        match self {
            Self::PartialBatch { committed, .. } => *committed,
            _ => 0,
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Encoding(err) => write!(f, "document encoding failed: {err}"),
            Self::InvalidData(message) => write!(f, "invalid stored document: {message}"),
            Self::MissingId { collection } => {
                write!(f, "record in `{collection}` has no id")
            }
            Self::BatchTooLarge { size, limit } => {
                write!(f, "batch of {size} writes exceeds limit {limit}")
            }
            Self::Unavailable(message) => write!(f, "document store unavailable: {message}"),
            Self::PartialBatch {
                collection,
                committed,
                total,
                source,
            } => write!(
                f,
                "bulk write to `{collection}` stopped after {committed} of {total} writes: {source}"
            ),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Encoding(err) => Some(err),
            Self::PartialBatch { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encoding(value)
    }
}

/// One stored document together with its store key.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub key: String,
    pub body: Document,
}

/// One write inside an atomic batch.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchWrite {
    Set { key: String, document: Document },
    Delete { key: String },
}

/// Document store primitives. Implementations must be shareable across
/// threads; callers fan out reads concurrently.
pub trait DocumentStore: Send + Sync {
    /// Short backend name for logs.
    fn backend_name(&self) -> &'static str;

    fn max_batch_writes(&self) -> usize {
        DEFAULT_MAX_BATCH_WRITES
    }

    fn list(&self, collection: &str) -> StoreResult<Vec<StoredDocument>>;

    fn get(&self, collection: &str, key: &str) -> StoreResult<Option<Document>>;

    /// Overwrites the whole document at `key`.
    fn set(&self, collection: &str, key: &str, document: &Document) -> StoreResult<()>;

    /// Field-level merge into the document at `key`, creating it if absent.
    fn merge(&self, collection: &str, key: &str, patch: &Document) -> StoreResult<()>;

    fn delete(&self, collection: &str, key: &str) -> StoreResult<()>;

    /// Applies all writes atomically, or none of them.
    fn commit_batch(&self, collection: &str, writes: &[BatchWrite]) -> StoreResult<()>;
}

/// Merges `patch` into `target`: nested objects merge recursively, every
/// other value replaces the stored one.
pub fn merge_fields(target: &mut Document, patch: &Document) {
    for (field, value) in patch {
        match (target.get_mut(field), value) {
            (Some(Value::Object(existing)), Value::Object(nested)) => {
                merge_fields(existing, nested);
            }
            _ => {
                target.insert(field.clone(), value.clone());
            }
        }
    }
}

pub(crate) fn check_batch_size(writes: &[BatchWrite], limit: usize) -> StoreResult<()> {
    if writes.len() > limit {
        return Err(StoreError::BatchTooLarge {
            size: writes.len(),
            limit,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::merge_fields;
    use crate::model::Document;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> Document {
        match value {
            serde_json::Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn merge_keeps_fields_missing_from_patch() {
        let mut target = doc(json!({"id": "x", "a": 1, "b": 2}));
        merge_fields(&mut target, &doc(json!({"id": "x", "a": 9})));
        assert_eq!(target, doc(json!({"id": "x", "a": 9, "b": 2})));
    }

    #[test]
    fn merge_descends_into_nested_objects() {
        let mut target = doc(json!({"contato": {"email": "a@b", "fone": "1"}}));
        merge_fields(&mut target, &doc(json!({"contato": {"fone": "2"}})));
        assert_eq!(
            target,
            doc(json!({"contato": {"email": "a@b", "fone": "2"}}))
        );
    }

    #[test]
    fn merge_replaces_non_object_values_wholesale() {
        let mut target = doc(json!({"tags": ["a", "b"], "n": {"x": 1}}));
        merge_fields(&mut target, &doc(json!({"tags": ["c"], "n": 5})));
        assert_eq!(target, doc(json!({"tags": ["c"], "n": 5})));
    }
}
