//! Client state synchronizer.
//!
//! # Responsibility
//! - Own the in-memory mirror of the eight collections.
//! - Dispatch repository calls and fold successful results into the mirror.
//! - Surface bulk failures (import, restore, clear) as blocking notices.
//!
//! # Invariants
//! - A failed operation leaves the mirror exactly as it was.
//! - Full refresh replaces all eight mirrors or none of them.
//! - A refresh that overlaps a clear-all is discarded, never applied.
//! - Mutating handlers require a `ViewGrant` that authorizes the operation.

mod mirror;
mod notice;
mod synchronizer;

pub use mirror::{Mirror, Mirrored};
pub use notice::{LogNotifier, Notice, NoticeLevel, Notifier};
pub use synchronizer::{ClearReport, RefreshOutcome, RestoreReport, Synchronizer};

use crate::access::AccessError;
use crate::backup::BackupError;
use crate::model::entity::EntityKind;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type SyncResult<T> = Result<T, SyncError>;

#[derive(Debug)]
pub enum SyncError {
    Access(AccessError),
    Repo(RepoError),
    /// Import rows could not be normalized to plain data.
    Import {
        kind: EntityKind,
        source: serde_json::Error,
    },
    Backup(BackupError),
    /// Mirror contents could not be encoded for export.
    Export(serde_json::Error),
    /// A fan-out worker panicked before reporting.
    WorkerPanicked { operation: &'static str },
}

impl Display for SyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Access(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Import { kind, source } => {
                write!(f, "cannot normalize {kind} import rows: {source}")
            }
            Self::Backup(err) => write!(f, "{err}"),
            Self::Export(err) => write!(f, "cannot export mirror: {err}"),
            Self::WorkerPanicked { operation } => {
                write!(f, "{operation} worker panicked")
            }
        }
    }
}

impl Error for SyncError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Access(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Import { source, .. } => Some(source),
            Self::Backup(err) => Some(err),
            Self::Export(err) => Some(err),
            Self::WorkerPanicked { .. } => None,
        }
    }
}

impl From<AccessError> for SyncError {
    fn from(value: AccessError) -> Self {
        Self::Access(value)
    }
}

impl From<RepoError> for SyncError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<BackupError> for SyncError {
    fn from(value: BackupError) -> Self {
        Self::Backup(value)
    }
}
