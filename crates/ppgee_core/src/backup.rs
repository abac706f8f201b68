//! Backup bundle: eight optional named arrays of records.
//!
//! # Responsibility
//! - Parse untrusted backup JSON into a validated bundle.
//! - Serialize a bundle for export.
//!
//! # Invariants
//! - Top level must be an object whose keys are collection names.
//! - Every present value is an array of JSON objects.
//! - Record shapes are otherwise not validated; restore forwards them as-is.

use crate::model::entity::EntityKind;
use crate::model::Document;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Malformed backup input. Raised before any store call.
#[derive(Debug)]
pub enum BackupError {
    Json(serde_json::Error),
    NotAnObject,
    UnknownCollection(String),
    NotAnArray { collection: String },
    NotARecord { collection: String, index: usize },
}

impl Display for BackupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "backup is not valid JSON: {err}"),
            Self::NotAnObject => write!(f, "backup must be a JSON object"),
            Self::UnknownCollection(key) => write!(f, "backup has unknown collection `{key}`"),
            Self::NotAnArray { collection } => {
                write!(f, "backup collection `{collection}` must be an array")
            }
            Self::NotARecord { collection, index } => {
                write!(f, "backup collection `{collection}` item {index} is not an object")
            }
        }
    }
}

impl Error for BackupError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for BackupError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BackupBundle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graduates: Option<Vec<Document>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docentes: Option<Vec<Document>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projetos: Option<Vec<Document>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turmas: Option<Vec<Document>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alunos_regulares: Option<Vec<Document>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alunos_especiais: Option<Vec<Document>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub periodicos: Option<Vec<Document>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conferencias: Option<Vec<Document>>,
}

impl BackupBundle {
    /// Parses backup text.
    pub fn parse(text: &str) -> Result<Self, BackupError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    /// Validates an already-decoded JSON value.
    pub fn from_value(value: Value) -> Result<Self, BackupError> {
        let Value::Object(entries) = value else {
            return Err(BackupError::NotAnObject);
        };

        let mut bundle = Self::default();
        for (key, value) in entries {
            let kind = EntityKind::ALL
                .into_iter()
                .find(|kind| kind.collection() == key)
                .ok_or_else(|| BackupError::UnknownCollection(key.clone()))?;
            let Value::Array(items) = value else {
                return Err(BackupError::NotAnArray { collection: key });
            };

            let mut records = Vec::with_capacity(items.len());
            for (index, item) in items.into_iter().enumerate() {
                match item {
                    Value::Object(record) => records.push(record),
                    _ => {
                        return Err(BackupError::NotARecord {
                            collection: key,
                            index,
                        })
                    }
                }
            }
            bundle.insert(kind, records);
        }
        Ok(bundle)
    }

    pub fn get(&self, kind: EntityKind) -> Option<&Vec<Document>> {
        self.slot(kind).as_ref()
    }

    /// Replaces the array for `kind`.
    pub fn insert(&mut self, kind: EntityKind, records: Vec<Document>) {
        *self.slot_mut(kind) = Some(records);
    }

    /// Present arrays in canonical kind order.
    pub fn arrays(&self) -> impl Iterator<Item = (EntityKind, &[Document])> + '_ {
        EntityKind::ALL
            .into_iter()
            .filter_map(|kind| self.get(kind).map(|records| (kind, records.as_slice())))
    }

    /// Consumes the bundle into its present arrays, in canonical kind order.
    pub fn into_arrays(mut self) -> Vec<(EntityKind, Vec<Document>)> {
        EntityKind::ALL
            .into_iter()
            .filter_map(|kind| self.slot_mut(kind).take().map(|records| (kind, records)))
            .collect()
    }

    /// Number of records across every present array.
    pub fn record_count(&self) -> usize {
        self.arrays().map(|(_, records)| records.len()).sum()
    }

    pub fn to_json_pretty(&self) -> Result<String, BackupError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn slot(&self, kind: EntityKind) -> &Option<Vec<Document>> {
        match kind {
            EntityKind::Graduates => &self.graduates,
            EntityKind::Docentes => &self.docentes,
            EntityKind::Projetos => &self.projetos,
            EntityKind::Turmas => &self.turmas,
            EntityKind::AlunosRegulares => &self.alunos_regulares,
            EntityKind::AlunosEspeciais => &self.alunos_especiais,
            EntityKind::Periodicos => &self.periodicos,
            EntityKind::Conferencias => &self.conferencias,
        }
    }

    fn slot_mut(&mut self, kind: EntityKind) -> &mut Option<Vec<Document>> {
        match kind {
            EntityKind::Graduates => &mut self.graduates,
            EntityKind::Docentes => &mut self.docentes,
            EntityKind::Projetos => &mut self.projetos,
            EntityKind::Turmas => &mut self.turmas,
            EntityKind::AlunosRegulares => &mut self.alunos_regulares,
            EntityKind::AlunosEspeciais => &mut self.alunos_especiais,
            EntityKind::Periodicos => &mut self.periodicos,
            EntityKind::Conferencias => &mut self.conferencias,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{BackupBundle, BackupError};
    use crate::model::entity::EntityKind;
    use serde_json::json;

    #[test]
    fn parse_accepts_subset_of_collections() {
        let bundle = BackupBundle::parse(
            r#"{"graduates":[{"id":"g1","nome":"Ana"}],"alunosRegulares":[]}"#,
        )
        .expect("valid backup");

        assert_eq!(bundle.get(EntityKind::Graduates).map(Vec::len), Some(1));
        assert_eq!(bundle.get(EntityKind::AlunosRegulares).map(Vec::len), Some(0));
        assert!(bundle.get(EntityKind::Docentes).is_none());
        let kinds: Vec<_> = bundle.arrays().map(|(kind, _)| kind).collect();
        assert_eq!(kinds, vec![EntityKind::Graduates, EntityKind::AlunosRegulares]);
    }

    #[test]
    fn parse_rejects_top_level_array() {
        let error = BackupBundle::parse("[]").expect_err("array is not a bundle");
        assert!(matches!(error, BackupError::NotAnObject));
    }

    #[test]
    fn parse_rejects_unknown_key() {
        let error = BackupBundle::parse(r#"{"usuarios":[]}"#).expect_err("unknown key");
        assert!(matches!(error, BackupError::UnknownCollection(key) if key == "usuarios"));
    }

    #[test]
    fn parse_rejects_api_segment_as_key() {
        let error = BackupBundle::parse(r#"{"alunos-regulares":[]}"#).expect_err("api segment");
        assert!(matches!(error, BackupError::UnknownCollection(_)));
    }

    #[test]
    fn parse_rejects_non_array_value() {
        let error =
            BackupBundle::parse(r#"{"docentes":{"id":"d1"}}"#).expect_err("object is not array");
        assert!(matches!(error, BackupError::NotAnArray { collection } if collection == "docentes"));
    }

    #[test]
    fn parse_rejects_non_object_item() {
        let error = BackupBundle::parse(r#"{"turmas":[{"id":"t1"}, 3]}"#).expect_err("number item");
        assert!(matches!(
            error,
            BackupError::NotARecord { collection, index: 1 } if collection == "turmas"
        ));
    }

    #[test]
    fn export_uses_collection_names_and_skips_absent_arrays() {
        let mut bundle = BackupBundle::default();
        bundle.insert(EntityKind::AlunosEspeciais, vec![]);

        let text = bundle.to_json_pretty().expect("serialize");
        let value: serde_json::Value = serde_json::from_str(&text).expect("json");
        assert_eq!(value, json!({"alunosEspeciais": []}));
        assert_eq!(BackupBundle::parse(&text).expect("reparse"), bundle);
    }
}
