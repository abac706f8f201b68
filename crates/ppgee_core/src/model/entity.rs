//! Entity kinds and the typed record contract.
//!
//! # Responsibility
//! - Enumerate the eight entity kinds with their collection and API names.
//! - Provide the `Entity` trait used by the repository facade and mirror.
//!
//! # Invariants
//! - `EntityKind::collection` values are stable; they are the persisted
//!   collection names and the backup bundle keys.
//! - `Entity::id` returns the raw identifier; blank means "not assigned".

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Collection name for graduates.
pub const COLLECTION_GRADUATES: &str = "graduates";
/// Collection name for faculty.
pub const COLLECTION_DOCENTES: &str = "docentes";
/// Collection name for research projects.
pub const COLLECTION_PROJETOS: &str = "projetos";
/// Collection name for classes.
pub const COLLECTION_TURMAS: &str = "turmas";
/// Collection name for regular students.
pub const COLLECTION_ALUNOS_REGULARES: &str = "alunosRegulares";
/// Collection name for special students.
pub const COLLECTION_ALUNOS_ESPECIAIS: &str = "alunosEspeciais";
/// Collection name for journal publications.
pub const COLLECTION_PERIODICOS: &str = "periodicos";
/// Collection name for conference publications.
pub const COLLECTION_CONFERENCIAS: &str = "conferencias";

/// One of the eight tracked record types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    Graduates,
    Docentes,
    Projetos,
    Turmas,
    AlunosRegulares,
    AlunosEspeciais,
    Periodicos,
    Conferencias,
}

impl EntityKind {
    /// All kinds in canonical order (fetch, restore and export order).
    pub const ALL: [EntityKind; 8] = [
        Self::Graduates,
        Self::Docentes,
        Self::Projetos,
        Self::Turmas,
        Self::AlunosRegulares,
        Self::AlunosEspeciais,
        Self::Periodicos,
        Self::Conferencias,
    ];

    /// Stable collection name in the document store and backup bundle key.
    pub fn collection(self) -> &'static str {
        match self {
            Self::Graduates => COLLECTION_GRADUATES,
            Self::Docentes => COLLECTION_DOCENTES,
            Self::Projetos => COLLECTION_PROJETOS,
            Self::Turmas => COLLECTION_TURMAS,
            Self::AlunosRegulares => COLLECTION_ALUNOS_REGULARES,
            Self::AlunosEspeciais => COLLECTION_ALUNOS_ESPECIAIS,
            Self::Periodicos => COLLECTION_PERIODICOS,
            Self::Conferencias => COLLECTION_CONFERENCIAS,
        }
    }

    /// Path segment under `/api/` serving this kind.
    pub fn api_segment(self) -> &'static str {
        match self {
            Self::AlunosRegulares => "alunos-regulares",
            Self::AlunosEspeciais => "alunos-especiais",
            other => other.collection(),
        }
    }

    /// Singular label used in HTTP messages and notices.
    pub fn label(self) -> &'static str {
        match self {
            Self::Graduates => "Graduate",
            Self::Docentes => "Docente",
            Self::Projetos => "Projeto",
            Self::Turmas => "Turma",
            Self::AlunosRegulares => "Aluno regular",
            Self::AlunosEspeciais => "Aluno especial",
            Self::Periodicos => "Periodico",
            Self::Conferencias => "Conferencia",
        }
    }

    /// Parses a collection name or API path segment.
    pub fn parse(value: &str) -> Result<Self, EntityKindError> {
        let normalized = value.trim();
        if normalized.is_empty() {
            return Err(EntityKindError::Empty);
        }

        Self::ALL
            .into_iter()
            .find(|kind| kind.collection() == normalized || kind.api_segment() == normalized)
            .ok_or_else(|| EntityKindError::Unsupported(normalized.to_string()))
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.collection())
    }
}

/// Entity kind parse errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityKindError {
    Empty,
    Unsupported(String),
}

impl Display for EntityKindError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "entity kind must not be empty"),
            Self::Unsupported(value) => write!(f, "entity kind is unsupported: {value}"),
        }
    }
}

impl Error for EntityKindError {}

/// Typed record stored in one entity collection.
///
/// Implementations serialize to a flat JSON object whose `id` field matches
/// [`Entity::id`]. Absent optional fields must be skipped on serialization so
/// that merge updates keep the stored value.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const KIND: EntityKind;

    fn id(&self) -> &str;

    fn set_id(&mut self, id: String);

    /// Fills optional columns that bulk imports must always carry.
    fn fill_import_defaults(&mut self) {}
}
