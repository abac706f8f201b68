//! Capability tables for views and mutating operations.

use super::view::{View, DEFAULT_VIEW};
use crate::model::entity::EntityKind;
use crate::model::user::Role;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Mutating operation a synchronizer handler performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Add,
    Update,
    Delete,
    Import,
    Restore,
    Clear,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Import => "import",
            Self::Restore => "restore",
            Self::Clear => "clear",
        }
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const VIEWER_VIEWS: &[View] = &[
    View::Dashboard,
    View::Turmas,
    View::AlunoRegular,
    View::AlunoEspecial,
    View::Publicacoes,
];

const ALL_KINDS: &[EntityKind] = &EntityKind::ALL;

/// Per-record edits: which kinds each view edits in place.
const EDITABLE_KINDS: &[(View, &[EntityKind])] = &[
    (View::Dashboard, &[EntityKind::Graduates, EntityKind::Projetos]),
    (View::Turmas, &[EntityKind::Turmas]),
    (View::AlunoRegular, &[EntityKind::AlunosRegulares]),
    (View::Docentes, &[EntityKind::Docentes]),
    (
        View::Publicacoes,
        &[EntityKind::Periodicos, EntityKind::Conferencias],
    ),
    (View::Admin, &[EntityKind::Graduates, EntityKind::Projetos]),
];

/// Creation paths: single add and import, for every kind, in data management.
const CREATE_KINDS: &[(View, &[EntityKind])] = &[(View::DataManagement, ALL_KINDS)];

/// Whole-dataset operations.
const DATASET_VIEWS: &[View] = &[View::DataManagement];

/// Views reachable by `role`.
pub fn permitted_views(role: Role) -> &'static [View] {
    match role {
        Role::Viewer => VIEWER_VIEWS,
        Role::Editor | Role::Administrator => &View::ALL,
    }
}

/// Proof that a role reached a view through the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewGrant {
    role: Role,
    view: View,
}

impl ViewGrant {
    pub fn role(&self) -> Role {
        self.role
    }

    pub fn view(&self) -> View {
        self.view
    }

    /// Checks a per-kind operation (add, update, delete, import).
    pub fn authorize(&self, operation: Operation, kind: EntityKind) -> Result<(), AccessError> {
        self.check_role(operation)?;
        let table = match operation {
            Operation::Update | Operation::Delete => EDITABLE_KINDS,
            Operation::Add | Operation::Import => CREATE_KINDS,
            Operation::Restore | Operation::Clear => {
                return self.authorize_dataset(operation);
            }
        };
        let allowed = table
            .iter()
            .any(|(view, kinds)| *view == self.view && kinds.contains(&kind));
        if allowed {
            Ok(())
        } else {
            Err(AccessError::OperationNotOffered {
                view: self.view,
                operation,
                kind: Some(kind),
            })
        }
    }

    /// Checks a whole-dataset operation (restore, clear).
    pub fn authorize_dataset(&self, operation: Operation) -> Result<(), AccessError> {
        self.check_role(operation)?;
        if DATASET_VIEWS.contains(&self.view) {
            Ok(())
        } else {
            Err(AccessError::OperationNotOffered {
                view: self.view,
                operation,
                kind: None,
            })
        }
    }

    fn check_role(&self, operation: Operation) -> Result<(), AccessError> {
        if self.role.can_write() {
            Ok(())
        } else {
            Err(AccessError::ReadOnlyRole {
                role: self.role,
                operation,
            })
        }
    }
}

/// Stateless role gate consulted once per navigation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ViewRouter;

impl ViewRouter {
    /// Returns a grant for `requested` when `role` may see it, otherwise for
    /// the default view.
    pub fn route(role: Role, requested: View) -> ViewGrant {
        let view = if permitted_views(role).contains(&requested) {
            requested
        } else {
            info!(
                "event=view_redirect module=access status=ok role={} requested={} view={}",
                role, requested, DEFAULT_VIEW
            );
            DEFAULT_VIEW
        };
        ViewGrant { role, view }
    }

    /// Strict variant used by callers that must not be redirected.
    pub fn require(role: Role, requested: View) -> Result<ViewGrant, AccessError> {
        if permitted_views(role).contains(&requested) {
            Ok(ViewGrant {
                role,
                view: requested,
            })
        } else {
            Err(AccessError::ViewDenied {
                role,
                view: requested,
            })
        }
    }
}

/// Access gate rejection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    ViewDenied {
        role: Role,
        view: View,
    },
    ReadOnlyRole {
        role: Role,
        operation: Operation,
    },
    OperationNotOffered {
        view: View,
        operation: Operation,
        kind: Option<EntityKind>,
    },
}

impl Display for AccessError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ViewDenied { role, view } => {
                write!(f, "role `{role}` may not open view `{view}`")
            }
            Self::ReadOnlyRole { role, operation } => {
                write!(f, "role `{role}` may not {operation} records")
            }
            Self::OperationNotOffered {
                view,
                operation,
                kind: Some(kind),
            } => write!(f, "view `{view}` does not offer {operation} on {kind}"),
            Self::OperationNotOffered {
                view,
                operation,
                kind: None,
            } => write!(f, "view `{view}` does not offer {operation}"),
        }
    }
}

impl Error for AccessError {}

#[cfg(test)]
mod tests {
    use super::{permitted_views, AccessError, Operation, ViewRouter};
    use crate::access::View;
    use crate::model::entity::EntityKind;
    use crate::model::user::Role;

    #[test]
    fn viewer_requesting_admin_lands_on_dashboard() {
        let grant = ViewRouter::route(Role::Viewer, View::Admin);
        assert_eq!(grant.view(), View::Dashboard);
        assert_eq!(grant.role(), Role::Viewer);
    }

    #[test]
    fn viewer_is_redirected_from_every_restricted_view() {
        for view in [View::Docentes, View::DataManagement, View::Admin] {
            assert_eq!(ViewRouter::route(Role::Viewer, view).view(), View::Dashboard);
            assert!(ViewRouter::require(Role::Viewer, view).is_err());
        }
        for view in [View::Turmas, View::AlunoRegular, View::AlunoEspecial, View::Publicacoes] {
            assert_eq!(ViewRouter::route(Role::Viewer, view).view(), view);
        }
    }

    #[test]
    fn writing_roles_pass_through_unchanged() {
        for role in [Role::Editor, Role::Administrator] {
            assert_eq!(permitted_views(role).len(), View::ALL.len());
            for view in View::ALL {
                assert_eq!(ViewRouter::route(role, view).view(), view);
            }
        }
    }

    #[test]
    fn viewer_grant_never_authorizes_writes() {
        let grant = ViewRouter::route(Role::Viewer, View::Turmas);
        let err = grant
            .authorize(Operation::Update, EntityKind::Turmas)
            .expect_err("viewer must not update");
        assert_eq!(
            err,
            AccessError::ReadOnlyRole {
                role: Role::Viewer,
                operation: Operation::Update
            }
        );
    }

    #[test]
    fn edits_are_limited_to_kinds_the_view_shows() {
        let grant = ViewRouter::route(Role::Administrator, View::Publicacoes);
        assert!(grant.authorize(Operation::Delete, EntityKind::Periodicos).is_ok());
        assert!(grant.authorize(Operation::Delete, EntityKind::Turmas).is_err());
        assert!(grant.authorize(Operation::Add, EntityKind::Periodicos).is_err());
    }

    #[test]
    fn data_management_offers_creation_and_dataset_operations() {
        let grant = ViewRouter::route(Role::Editor, View::DataManagement);
        for kind in EntityKind::ALL {
            assert!(grant.authorize(Operation::Add, kind).is_ok());
            assert!(grant.authorize(Operation::Import, kind).is_ok());
        }
        assert!(grant.authorize_dataset(Operation::Restore).is_ok());
        assert!(grant.authorize_dataset(Operation::Clear).is_ok());

        let dashboard = ViewRouter::route(Role::Administrator, View::Dashboard);
        assert!(dashboard.authorize_dataset(Operation::Clear).is_err());
    }
}
