//! SQLite-persisted document store.
//!
//! # Responsibility
//! - Persist each collection's documents as JSON bodies keyed by
//!   `(collection, doc_id)`.
//! - Map batches and merges onto single SQLite transactions.
//!
//! # Invariants
//! - Listing order is first-insertion order; overwrites keep the row.
//! - Stored bodies are always JSON objects; anything else is invalid data.

use super::{
    check_batch_size, merge_fields, BatchWrite, DocumentStore, StoreError, StoreResult,
    StoredDocument, DEFAULT_MAX_BATCH_WRITES,
};
use crate::db::{open_db, open_db_in_memory};
use crate::model::Document;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::path::Path;

const UPSERT_SQL: &str = "INSERT INTO documents (collection, doc_id, body)
     VALUES (?1, ?2, ?3)
     ON CONFLICT (collection, doc_id) DO UPDATE SET
        body = excluded.body,
        updated_at = (strftime('%s', 'now') * 1000);";

const DELETE_SQL: &str = "DELETE FROM documents WHERE collection = ?1 AND doc_id = ?2;";

/// Document store persisted in a single SQLite database.
pub struct SqliteDocumentStore {
    conn: Mutex<Connection>,
    max_batch_writes: usize,
}

impl SqliteDocumentStore {
    /// Opens (and migrates) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Ok(Self::from_connection(open_db(path)?))
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?))
    }

    /// Wraps an already migrated connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
            max_batch_writes: DEFAULT_MAX_BATCH_WRITES,
        }
    }

    /// Lowers the per-batch write limit, clamped to `1..=500`.
    pub fn with_max_batch_writes(mut self, max_batch_writes: usize) -> Self {
        self.max_batch_writes = max_batch_writes.clamp(1, DEFAULT_MAX_BATCH_WRITES);
        self
    }
}

impl DocumentStore for SqliteDocumentStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    fn max_batch_writes(&self) -> usize {
        self.max_batch_writes
    }

    fn list(&self, collection: &str) -> StoreResult<Vec<StoredDocument>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT doc_id, body
             FROM documents
             WHERE collection = ?1
             ORDER BY rowid ASC;",
        )?;
        let mut rows = stmt.query([collection])?;
        let mut documents = Vec::new();

        while let Some(row) = rows.next()? {
            let key: String = row.get(0)?;
            let body: String = row.get(1)?;
            let body = parse_body(collection, &key, &body)?;
            documents.push(StoredDocument { key, body });
        }

        Ok(documents)
    }

    fn get(&self, collection: &str, key: &str) -> StoreResult<Option<Document>> {
        let conn = self.conn.lock();
        let body: Option<String> = conn
            .query_row(
                "SELECT body FROM documents WHERE collection = ?1 AND doc_id = ?2;",
                params![collection, key],
                |row| row.get(0),
            )
            .optional()?;

        body.map(|body| parse_body(collection, key, &body))
            .transpose()
    }

    fn set(&self, collection: &str, key: &str, document: &Document) -> StoreResult<()> {
        let body = serde_json::to_string(document)?;
        self.conn
            .lock()
            .execute(UPSERT_SQL, params![collection, key, body])?;
        Ok(())
    }

    fn merge(&self, collection: &str, key: &str, patch: &Document) -> StoreResult<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        let existing: Option<String> = tx
            .query_row(
                "SELECT body FROM documents WHERE collection = ?1 AND doc_id = ?2;",
                params![collection, key],
                |row| row.get(0),
            )
            .optional()?;

        let mut merged = match existing {
            Some(body) => parse_body(collection, key, &body)?,
            None => Document::new(),
        };
        merge_fields(&mut merged, patch);

        tx.execute(
            UPSERT_SQL,
            params![collection, key, serde_json::to_string(&merged)?],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn delete(&self, collection: &str, key: &str) -> StoreResult<()> {
        self.conn
            .lock()
            .execute(DELETE_SQL, params![collection, key])?;
        Ok(())
    }

    fn commit_batch(&self, collection: &str, writes: &[BatchWrite]) -> StoreResult<()> {
        check_batch_size(writes, self.max_batch_writes)?;

        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        {
            let mut upsert = tx.prepare_cached(UPSERT_SQL)?;
            let mut delete = tx.prepare_cached(DELETE_SQL)?;
            for write in writes {
                match write {
                    BatchWrite::Set { key, document } => {
                        upsert.execute(params![collection, key, serde_json::to_string(document)?])?;
                    }
                    BatchWrite::Delete { key } => {
                        delete.execute(params![collection, key])?;
                    }
                }
            }
        }
        tx.commit()?;
        Ok(())
    }
}

fn parse_body(collection: &str, key: &str, body: &str) -> StoreResult<Document> {
    match serde_json::from_str::<Value>(body)? {
        Value::Object(document) => Ok(document),
        other => Err(StoreError::InvalidData(format!(
            "document `{collection}/{key}` holds a non-object body of type {}",
            json_type_name(&other)
        ))),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
