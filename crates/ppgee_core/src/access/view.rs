//! Dashboard views.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// View reached when a requested view is denied, and after logout.
pub const DEFAULT_VIEW: View = View::Dashboard;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum View {
    Dashboard,
    Turmas,
    AlunoRegular,
    AlunoEspecial,
    Docentes,
    Publicacoes,
    DataManagement,
    Admin,
}

impl View {
    pub const ALL: [View; 8] = [
        Self::Dashboard,
        Self::Turmas,
        Self::AlunoRegular,
        Self::AlunoEspecial,
        Self::Docentes,
        Self::Publicacoes,
        Self::DataManagement,
        Self::Admin,
    ];

    /// Stable view id.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Turmas => "turmas",
            Self::AlunoRegular => "alunoRegular",
            Self::AlunoEspecial => "alunoEspecial",
            Self::Docentes => "docentes",
            Self::Publicacoes => "publicacoes",
            Self::DataManagement => "dataManagement",
            Self::Admin => "admin",
        }
    }

    /// Header title shown for the view.
    pub fn title(self) -> &'static str {
        match self {
            Self::Dashboard => "Painel PPGEE - Elétrica e Computação",
            Self::Turmas => "Visualização de Dados de Turmas",
            Self::AlunoRegular => "Visualização de Alunos Regulares",
            Self::AlunoEspecial => "Visualização de Alunos Especiais",
            Self::Docentes => "Visualização de Dados de Docentes",
            Self::Publicacoes => "Visualização de Dados de Publicações",
            Self::DataManagement => "Gerenciamento de Dados",
            Self::Admin => "Painel Administrativo",
        }
    }

    pub fn parse(value: &str) -> Result<Self, ViewError> {
        let normalized = value.trim();
        if normalized.is_empty() {
            return Err(ViewError::Empty);
        }
        Self::ALL
            .into_iter()
            .find(|view| view.as_str() == normalized)
            .ok_or_else(|| ViewError::Unsupported(normalized.to_string()))
    }
}

impl Display for View {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// View id parse errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewError {
    Empty,
    Unsupported(String),
}

impl Display for ViewError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "view must not be empty"),
            Self::Unsupported(value) => write!(f, "view is unsupported: {value}"),
        }
    }
}

impl Error for ViewError {}

#[cfg(test)]
mod tests {
    use super::{View, ViewError};

    #[test]
    fn parses_every_view_id() {
        for view in View::ALL {
            assert_eq!(View::parse(view.as_str()).expect("known view"), view);
        }
    }

    #[test]
    fn view_ids_are_case_sensitive() {
        assert_eq!(
            View::parse("DataManagement").expect_err("capitalized id must fail"),
            ViewError::Unsupported("DataManagement".to_string())
        );
        assert_eq!(View::parse(" ").expect_err("blank"), ViewError::Empty);
    }
}
