//! Current-user roles.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Fixed role enumeration for dashboard users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Read-only access to the public dashboards.
    #[serde(rename = "Visualizador")]
    Viewer,
    #[serde(rename = "Editor")]
    Editor,
    #[serde(rename = "Administrador")]
    Administrator,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Viewer => "Visualizador",
            Self::Editor => "Editor",
            Self::Administrator => "Administrador",
        }
    }

    /// Whether this role may mutate entity data at all.
    pub fn can_write(self) -> bool {
        !matches!(self, Self::Viewer)
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single active dashboard user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub role: Role,
}

impl User {
    /// Anonymous read-only user active before any login.
    pub fn viewer() -> Self {
        Self {
            name: "Visitante".to_string(),
            role: Role::Viewer,
        }
    }

    /// User switched in after a successful one-time-password login.
    pub fn administrator() -> Self {
        Self {
            name: "Administrador PPGEE".to_string(),
            role: Role::Administrator,
        }
    }
}
