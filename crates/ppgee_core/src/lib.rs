//! Core domain logic for the PPGEE academic dashboard.
//! Record storage, the typed repositories, and the client state synchronizer
//! live here; the server and CLI crates are thin shells over this crate.

pub mod access;
pub mod auth;
pub mod backup;
pub mod db;
pub mod logging;
pub mod model;
pub mod ordering;
pub mod repo;
pub mod sanitize;
pub mod store;
pub mod sync;

pub use access::{AccessError, Operation, Session, View, ViewGrant, ViewRouter};
pub use auth::{AuthError, CredentialVerifier, TotpVerifier};
pub use backup::{BackupBundle, BackupError};
pub use logging::{
    default_log_level, init_logging, init_stderr_logging, logging_status, LoggingError,
};
pub use model::entity::{Entity, EntityKind};
pub use model::records::{
    AlunoEspecial, AlunoRegular, Conferencia, Docente, Graduate, Periodico, Projeto, Turma,
};
pub use model::user::{Role, User};
pub use model::Document;
pub use repo::{RepoError, RepoResult, Repositories, Repository};
pub use store::{
    DeleteAck, DocumentStore, MemoryDocumentStore, RecordStore, SqliteDocumentStore, StoreError,
};
pub use sync::{Mirror, Mirrored, Notice, Notifier, SyncError, SyncResult, Synchronizer};
