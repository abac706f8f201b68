#![allow(dead_code)]

use ppgee_core::model::Document;
use ppgee_core::store::{
    BatchWrite, DocumentStore, MemoryDocumentStore, StoreError, StoreResult, StoredDocument,
};
use ppgee_core::sync::{Notice, Notifier};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Mutex;

pub fn doc(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

type Hook = Box<dyn FnOnce() + Send>;

/// Memory store wrapper that records batch sizes and injects failures.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryDocumentStore,
    commits: Mutex<Vec<usize>>,
    fail_commit: Mutex<Option<usize>>,
    fail_list: Mutex<HashSet<String>>,
    list_hook: Mutex<Option<(String, Hook)>>,
    listed_hook: Mutex<Option<(String, Hook)>>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails the `n`th `commit_batch` call (1-based) from now on.
    pub fn fail_commit(&self, n: usize) {
        *self.fail_commit.lock().unwrap() = Some(n);
    }

    pub fn fail_list(&self, collection: &str) {
        self.fail_list.lock().unwrap().insert(collection.to_string());
    }

    /// Runs `hook` once, the next time `collection` is listed.
    pub fn on_next_list(&self, collection: &str, hook: impl FnOnce() + Send + 'static) {
        *self.list_hook.lock().unwrap() = Some((collection.to_string(), Box::new(hook)));
    }

    /// Runs `hook` once, right after the next read of `collection` and
    /// before its rows are returned.
    pub fn after_next_list(&self, collection: &str, hook: impl FnOnce() + Send + 'static) {
        *self.listed_hook.lock().unwrap() = Some((collection.to_string(), Box::new(hook)));
    }

    /// Sizes of every attempted batch commit, in order.
    pub fn commit_sizes(&self) -> Vec<usize> {
        self.commits.lock().unwrap().clone()
    }

    pub fn inner(&self) -> &MemoryDocumentStore {
        &self.inner
    }
}

impl DocumentStore for FlakyStore {
    fn backend_name(&self) -> &'static str {
        "flaky"
    }

    fn list(&self, collection: &str) -> StoreResult<Vec<StoredDocument>> {
        if let Some(hook) = take_hook(&self.list_hook, collection) {
            hook();
        }
        if self.fail_list.lock().unwrap().contains(collection) {
            return Err(StoreError::Unavailable(format!("list {collection} refused")));
        }
        let rows = self.inner.list(collection)?;
        if let Some(hook) = take_hook(&self.listed_hook, collection) {
            hook();
        }
        Ok(rows)
    }

    fn get(&self, collection: &str, key: &str) -> StoreResult<Option<Document>> {
        self.inner.get(collection, key)
    }

    fn set(&self, collection: &str, key: &str, document: &Document) -> StoreResult<()> {
        self.inner.set(collection, key, document)
    }

    fn merge(&self, collection: &str, key: &str, patch: &Document) -> StoreResult<()> {
        self.inner.merge(collection, key, patch)
    }

    fn delete(&self, collection: &str, key: &str) -> StoreResult<()> {
        self.inner.delete(collection, key)
    }

    fn commit_batch(&self, collection: &str, writes: &[BatchWrite]) -> StoreResult<()> {
        let attempt = {
            let mut commits = self.commits.lock().unwrap();
            commits.push(writes.len());
            commits.len()
        };
        if *self.fail_commit.lock().unwrap() == Some(attempt) {
            return Err(StoreError::Unavailable(format!("commit {attempt} refused")));
        }
        self.inner.commit_batch(collection, writes)
    }
}

fn take_hook(slot: &Mutex<Option<(String, Hook)>>, collection: &str) -> Option<Hook> {
    let mut slot = slot.lock().unwrap();
    match slot.as_ref() {
        Some((target, _)) if target == collection => slot.take().map(|(_, hook)| hook),
        _ => None,
    }
}

/// Notifier that keeps every notice for assertions.
#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: &Notice) {
        self.notices.lock().unwrap().push(notice.clone());
    }
}
