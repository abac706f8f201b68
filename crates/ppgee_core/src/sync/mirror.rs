//! In-memory copy of the eight collections.

use crate::backup::BackupBundle;
use crate::model::entity::{Entity, EntityKind};
use crate::model::records::{
    AlunoEspecial, AlunoRegular, Conferencia, Docente, Graduate, Periodico, Projeto, Turma,
};
use crate::model::Document;
use serde_json::Value;

/// Client-held records per collection, in fetch order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mirror {
    pub graduates: Vec<Graduate>,
    pub docentes: Vec<Docente>,
    pub projetos: Vec<Projeto>,
    pub turmas: Vec<Turma>,
    pub alunos_regulares: Vec<AlunoRegular>,
    pub alunos_especiais: Vec<AlunoEspecial>,
    pub periodicos: Vec<Periodico>,
    pub conferencias: Vec<Conferencia>,
}

/// Entity with a slot in the mirror.
pub trait Mirrored: Entity {
    fn slot(mirror: &Mirror) -> &Vec<Self>;
    fn slot_mut(mirror: &mut Mirror) -> &mut Vec<Self>;
}

macro_rules! impl_mirrored {
    ($($record:ty => $field:ident),+ $(,)?) => {
        $(
            impl Mirrored for $record {
                fn slot(mirror: &Mirror) -> &Vec<Self> {
                    &mirror.$field
                }

                fn slot_mut(mirror: &mut Mirror) -> &mut Vec<Self> {
                    &mut mirror.$field
                }
            }
        )+
    };
}

impl_mirrored!(
    Graduate => graduates,
    Docente => docentes,
    Projeto => projetos,
    Turma => turmas,
    AlunoRegular => alunos_regulares,
    AlunoEspecial => alunos_especiais,
    Periodico => periodicos,
    Conferencia => conferencias,
);

impl Mirror {
    pub fn records<E: Mirrored>(&self) -> &[E] {
        E::slot(self)
    }

    /// Appends records in the order given.
    pub fn append<E: Mirrored>(&mut self, records: impl IntoIterator<Item = E>) {
        E::slot_mut(self).extend(records);
    }

    /// Replaces the entry with the same id. Returns `false`, leaving the
    /// mirror as it was, when no entry matches.
    pub fn replace<E: Mirrored>(&mut self, record: E) -> bool {
        match E::slot_mut(self)
            .iter_mut()
            .find(|entry| entry.id() == record.id())
        {
            Some(entry) => {
                *entry = record;
                true
            }
            None => false,
        }
    }

    /// Removes every entry with `id`; returns how many were removed.
    pub fn remove<E: Mirrored>(&mut self, id: &str) -> usize {
        let slot = E::slot_mut(self);
        let before = slot.len();
        slot.retain(|entry| entry.id() != id);
        before - slot.len()
    }

    pub fn len(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::Graduates => self.graduates.len(),
            EntityKind::Docentes => self.docentes.len(),
            EntityKind::Projetos => self.projetos.len(),
            EntityKind::Turmas => self.turmas.len(),
            EntityKind::AlunosRegulares => self.alunos_regulares.len(),
            EntityKind::AlunosEspeciais => self.alunos_especiais.len(),
            EntityKind::Periodicos => self.periodicos.len(),
            EntityKind::Conferencias => self.conferencias.len(),
        }
    }

    pub fn total_len(&self) -> usize {
        EntityKind::ALL.into_iter().map(|kind| self.len(kind)).sum()
    }

    /// True when all eight collections are empty.
    pub fn is_empty(&self) -> bool {
        self.total_len() == 0
    }

    /// Plain JSON documents for one collection.
    pub fn documents(&self, kind: EntityKind) -> Result<Vec<Document>, serde_json::Error> {
        match kind {
            EntityKind::Graduates => to_documents(&self.graduates),
            EntityKind::Docentes => to_documents(&self.docentes),
            EntityKind::Projetos => to_documents(&self.projetos),
            EntityKind::Turmas => to_documents(&self.turmas),
            EntityKind::AlunosRegulares => to_documents(&self.alunos_regulares),
            EntityKind::AlunosEspeciais => to_documents(&self.alunos_especiais),
            EntityKind::Periodicos => to_documents(&self.periodicos),
            EntityKind::Conferencias => to_documents(&self.conferencias),
        }
    }

    /// Backup bundle holding every collection, empty ones included.
    pub fn to_backup(&self) -> Result<BackupBundle, serde_json::Error> {
        let mut bundle = BackupBundle::default();
        for kind in EntityKind::ALL {
            bundle.insert(kind, self.documents(kind)?);
        }
        Ok(bundle)
    }
}

fn to_documents<E: Entity>(records: &[E]) -> Result<Vec<Document>, serde_json::Error> {
    records
        .iter()
        .map(|record| match serde_json::to_value(record)? {
            Value::Object(document) => Ok(document),
            _ => Err(serde::ser::Error::custom("record did not serialize to an object")),
        })
        .collect()
}
