//! Typed repository facade over the record store adapter.
//!
//! # Responsibility
//! - Expose list/create/create-many/update/delete/clear per entity kind.
//! - Convert between typed records and stored documents.
//!
//! # Invariants
//! - `Repository<E>` always addresses `E::KIND.collection()`; the binding is
//!   the only logic this layer adds.
//! - Read paths reject undecodable documents instead of skipping them.

mod repository;

pub use repository::{Repositories, Repository};

use crate::model::entity::EntityKind;
use crate::store::StoreError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for typed record operations.
#[derive(Debug)]
pub enum RepoError {
    Store(StoreError),
    /// Record could not be encoded as a plain JSON object.
    Encode {
        kind: EntityKind,
        source: serde_json::Error,
    },
    /// Stored document does not match the record shape.
    Decode {
        kind: EntityKind,
        id: String,
        source: serde_json::Error,
    },
}

impl RepoError {
    /// Whether the failure was caused by the caller's input rather than the store.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::Store(StoreError::MissingId { .. }) | Self::Encode { .. }
        )
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Encode { kind, source } => {
                write!(f, "cannot encode {kind} record: {source}")
            }
            Self::Decode { kind, id, source } => {
                write!(f, "invalid stored {kind} record `{id}`: {source}")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Encode { source, .. } => Some(source),
            Self::Decode { source, .. } => Some(source),
        }
    }
}

impl From<StoreError> for RepoError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}
