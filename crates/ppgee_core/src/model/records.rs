//! Record shapes for the eight entity collections.
//!
//! Each record names the columns the dashboard reasons about and keeps every
//! other column in `extra`, so spreadsheet and backup rows round-trip without
//! loss.
//!
//! Named text columns accept any JSON value: spreadsheet cells and restored
//! backups carry numbers and booleans (phone numbers, years) where text is
//! expected. Such values are read as their JSON text; `null` reads as absent.

use crate::model::entity::{Entity, EntityKind};
use crate::model::Document;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Program graduate (egresso).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Graduate {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub nome: Option<String>,
    /// Current employment, free text.
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub trabalhando: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub ano_defesa: Option<String>,
    #[serde(flatten)]
    pub extra: Document,
}

/// Faculty member.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Docente {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub nome: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub fone: Option<String>,
    #[serde(flatten)]
    pub extra: Document,
}

/// Research project.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Projeto {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(flatten)]
    pub extra: Document,
}

/// Class offering.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Turma {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(flatten)]
    pub extra: Document,
}

/// Regular (enrolled) student.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlunoRegular {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub nome: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub orientador: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub co_orientador: Option<String>,
    /// Qualification exam date (`dd/mm/yyyy`).
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub qualificacao: Option<String>,
    /// Defense date (`dd/mm/yyyy`).
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub defesa: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub bolsista: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub fone: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub informacoes_extras: Option<String>,
    #[serde(flatten)]
    pub extra: Document,
}

/// Special (non-degree) student.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlunoEspecial {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub nome: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub fone: Option<String>,
    #[serde(flatten)]
    pub extra: Document,
}

/// Journal publication.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Periodico {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: String,
    /// Qualis category; spreadsheet rows may leave it blank.
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub categoria: Option<String>,
    #[serde(flatten)]
    pub extra: Document,
}

/// Conference publication.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Conferencia {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub categoria: Option<String>,
    #[serde(flatten)]
    pub extra: Document,
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text),
        Some(other) => Some(other.to_string()),
    })
}

fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(lenient_text(deserializer)?.unwrap_or_default())
}

fn default_blank(field: &mut Option<String>) {
    if field.is_none() {
        *field = Some(String::new());
    }
}

macro_rules! impl_entity {
    ($record:ty, $kind:expr, |$this:ident| $defaults:block) => {
        impl Entity for $record {
            const KIND: EntityKind = $kind;

            fn id(&self) -> &str {
                &self.id
            }

            fn set_id(&mut self, id: String) {
                self.id = id;
            }

            fn fill_import_defaults(&mut self) {
                let $this = self;
                $defaults
            }
        }
    };
}

impl_entity!(Graduate, EntityKind::Graduates, |this| {
    default_blank(&mut this.trabalhando);
    default_blank(&mut this.ano_defesa);
});
impl_entity!(Docente, EntityKind::Docentes, |this| {
    default_blank(&mut this.email);
    default_blank(&mut this.fone);
});
impl_entity!(Projeto, EntityKind::Projetos, |_this| {});
impl_entity!(Turma, EntityKind::Turmas, |_this| {});
impl_entity!(AlunoRegular, EntityKind::AlunosRegulares, |this| {
    default_blank(&mut this.co_orientador);
    default_blank(&mut this.qualificacao);
    default_blank(&mut this.defesa);
    default_blank(&mut this.bolsista);
    default_blank(&mut this.email);
    default_blank(&mut this.fone);
    default_blank(&mut this.informacoes_extras);
});
impl_entity!(AlunoEspecial, EntityKind::AlunosEspeciais, |this| {
    default_blank(&mut this.email);
    default_blank(&mut this.fone);
});
impl_entity!(Periodico, EntityKind::Periodicos, |this| {
    default_blank(&mut this.categoria);
});
impl_entity!(Conferencia, EntityKind::Conferencias, |this| {
    default_blank(&mut this.categoria);
});

#[cfg(test)]
mod tests {
    use super::{AlunoRegular, Docente, Graduate};
    use crate::model::entity::Entity;
    use serde_json::json;

    #[test]
    fn unknown_columns_round_trip_through_extra() {
        let value = json!({"id": "g1", "nome": "Ana", "curso": "Mestrado", "ano": 2021});
        let graduate: Graduate = serde_json::from_value(value.clone()).expect("decode graduate");

        assert_eq!(graduate.nome.as_deref(), Some("Ana"));
        assert_eq!(graduate.extra.get("curso"), Some(&json!("Mestrado")));
        assert_eq!(serde_json::to_value(&graduate).expect("encode graduate"), value);
    }

    #[test]
    fn absent_optional_fields_are_not_serialized() {
        let graduate = Graduate {
            id: "g1".to_string(),
            ..Graduate::default()
        };
        assert_eq!(
            serde_json::to_value(&graduate).expect("encode graduate"),
            json!({"id": "g1"})
        );
    }

    #[test]
    fn import_defaults_fill_only_missing_fields() {
        let mut aluno = AlunoRegular {
            id: "a1".to_string(),
            email: Some("a1@ufam.edu.br".to_string()),
            ..AlunoRegular::default()
        };
        aluno.fill_import_defaults();

        assert_eq!(aluno.co_orientador.as_deref(), Some(""));
        assert_eq!(aluno.informacoes_extras.as_deref(), Some(""));
        assert_eq!(aluno.email.as_deref(), Some("a1@ufam.edu.br"));
        assert_eq!(aluno.orientador, None);
    }

    #[test]
    fn non_text_cells_decode_as_text() {
        let docente: Docente = serde_json::from_value(json!({
            "id": "d1",
            "nome": "Lima",
            "fone": 92999990000u64,
            "email": null,
            "ativo": true
        }))
        .expect("decode docente");

        assert_eq!(docente.fone.as_deref(), Some("92999990000"));
        assert_eq!(docente.email, None);
        assert_eq!(docente.extra.get("ativo"), Some(&json!(true)));
    }
}
