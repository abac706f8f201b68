use super::{RepoError, RepoResult};
use crate::model::entity::{Entity, EntityKind};
use crate::model::records::{
    AlunoEspecial, AlunoRegular, Conferencia, Docente, Graduate, Periodico, Projeto, Turma,
};
use crate::model::Document;
use crate::store::{DeleteAck, DocumentStore, RecordStore};
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;

/// Typed access to one entity collection.
pub struct Repository<E: Entity> {
    records: RecordStore,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Clone for Repository<E> {
    fn clone(&self) -> Self {
        Self::new(self.records.clone())
    }
}

impl<E: Entity> Repository<E> {
    pub fn new(records: RecordStore) -> Self {
        Self {
            records,
            _entity: PhantomData,
        }
    }

    pub fn kind(&self) -> EntityKind {
        E::KIND
    }

    pub fn collection(&self) -> &'static str {
        E::KIND.collection()
    }

    pub fn list(&self) -> RepoResult<Vec<E>> {
        self.records
            .list(self.collection())?
            .into_iter()
            .map(decode::<E>)
            .collect()
    }

    pub fn get(&self, id: &str) -> RepoResult<Option<E>> {
        self.records
            .get(self.collection(), id)?
            .map(decode::<E>)
            .transpose()
    }

    /// Upserts `item` at `item.id()` and returns it unchanged.
    pub fn create(&self, item: &E) -> RepoResult<E> {
        self.records.create(self.collection(), encode(item)?)?;
        Ok(item.clone())
    }

    /// Bulk upsert in store-sized chunks; see `RecordStore::create_many`.
    pub fn create_many(&self, items: &[E]) -> RepoResult<Vec<E>> {
        let documents = items.iter().map(encode).collect::<RepoResult<Vec<_>>>()?;
        self.records.create_many(self.collection(), documents)?;
        Ok(items.to_vec())
    }

    /// Bulk upsert of untyped documents, forwarded without shape checks.
    pub fn create_many_documents(&self, documents: Vec<Document>) -> RepoResult<Vec<Document>> {
        Ok(self.records.create_many(self.collection(), documents)?)
    }

    /// Merges `item` into the stored record and returns it unchanged.
    pub fn update(&self, item: &E) -> RepoResult<E> {
        self.records.update(self.collection(), encode(item)?)?;
        Ok(item.clone())
    }

    pub fn delete(&self, id: &str) -> RepoResult<DeleteAck> {
        Ok(self.records.delete(self.collection(), id)?)
    }

    pub fn clear(&self) -> RepoResult<usize> {
        Ok(self.records.clear(self.collection())?)
    }
}

/// One repository per entity kind over a shared store.
#[derive(Clone)]
pub struct Repositories {
    pub graduates: Repository<Graduate>,
    pub docentes: Repository<Docente>,
    pub projetos: Repository<Projeto>,
    pub turmas: Repository<Turma>,
    pub alunos_regulares: Repository<AlunoRegular>,
    pub alunos_especiais: Repository<AlunoEspecial>,
    pub periodicos: Repository<Periodico>,
    pub conferencias: Repository<Conferencia>,
    records: RecordStore,
}

impl Repositories {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        let records = RecordStore::new(store);
        Self {
            graduates: Repository::new(records.clone()),
            docentes: Repository::new(records.clone()),
            projetos: Repository::new(records.clone()),
            turmas: Repository::new(records.clone()),
            alunos_regulares: Repository::new(records.clone()),
            alunos_especiais: Repository::new(records.clone()),
            periodicos: Repository::new(records.clone()),
            conferencias: Repository::new(records.clone()),
            records,
        }
    }

    /// Repository for any entity type, for generic callers.
    pub fn of<E: Entity>(&self) -> Repository<E> {
        Repository::new(self.records.clone())
    }

    /// Untyped adapter, addressed by collection name.
    pub fn records(&self) -> &RecordStore {
        &self.records
    }

    pub fn clear_kind(&self, kind: EntityKind) -> RepoResult<usize> {
        Ok(self.records.clear(kind.collection())?)
    }

    /// Bulk upsert of untyped documents into the collection of `kind`.
    pub fn create_many_documents(
        &self,
        kind: EntityKind,
        documents: Vec<Document>,
    ) -> RepoResult<Vec<Document>> {
        Ok(self.records.create_many(kind.collection(), documents)?)
    }
}

fn encode<E: Entity>(item: &E) -> RepoResult<Document> {
    match serde_json::to_value(item) {
        Ok(Value::Object(document)) => Ok(document),
        Ok(_) => Err(RepoError::Encode {
            kind: E::KIND,
            source: serde::ser::Error::custom("record did not serialize to an object"),
        }),
        Err(source) => Err(RepoError::Encode {
            kind: E::KIND,
            source,
        }),
    }
}

fn decode<E: Entity>(document: Document) -> RepoResult<E> {
    let id = document
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    serde_json::from_value(Value::Object(document)).map_err(|source| RepoError::Decode {
        kind: E::KIND,
        id,
        source,
    })
}
