//! Administrative command line over a PPGEE SQLite store.
//!
//! Every mutating command runs as the administrator on the data management
//! view, through the same synchronizer handlers the dashboard uses.

use clap::{Parser, Subcommand};
use log::info;
use ppgee_core::model::entity::EntityKindError;
use ppgee_core::sync::{Notice, NoticeLevel, Notifier};
use ppgee_core::ordering::{sort_documents, CompareOptions, SortOrder};
use ppgee_core::{
    init_logging, init_stderr_logging, AlunoEspecial, AlunoRegular, Conferencia, Docente,
    EntityKind, Graduate, Mirrored, Periodico, Projeto, Repositories, Role, SqliteDocumentStore,
    Synchronizer, TotpVerifier, Turma, View, ViewGrant, ViewRouter,
};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "ppgee", version, about = "PPGEE dashboard data administration")]
struct Cli {
    /// SQLite database file.
    #[arg(long, global = true, env = "PPGEE_DB_PATH", default_value = "ppgee.sqlite3")]
    db: PathBuf,
    /// Absolute directory for rotating log files.
    #[arg(long, global = true, env = "PPGEE_LOG_DIR")]
    log_dir: Option<String>,
    #[arg(long, global = true, env = "PPGEE_LOG_LEVEL")]
    log_level: Option<String>,
    /// Maximum writes per committed batch.
    #[arg(long, global = true, env = "PPGEE_BATCH_LIMIT", default_value_t = ppgee_core::store::DEFAULT_MAX_BATCH_WRITES)]
    batch_limit: usize,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print a collection, one JSON record per line.
    List {
        #[arg(value_parser = parse_kind)]
        kind: EntityKind,
        /// Field to order by; empty values sort last.
        #[arg(long)]
        sort_by: Option<String>,
        #[arg(long, default_value_t = false)]
        desc: bool,
        /// Compare the sort field as dd/mm/yyyy dates.
        #[arg(long, default_value_t = false)]
        date: bool,
    },
    /// Bulk-create records from a JSON array file.
    Import {
        #[arg(value_parser = parse_kind)]
        kind: EntityKind,
        file: PathBuf,
    },
    /// Write a backup of every collection.
    Export {
        /// Output file; stdout when omitted.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Additively restore a backup file.
    Restore { file: PathBuf },
    /// Delete every record of every collection.
    Clear {
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
    /// Print the authenticator enrollment URI for a base32 secret.
    OtpUri {
        #[arg(long, env = "PPGEE_ADMIN_OTP_SECRET")]
        secret: String,
        #[arg(long, default_value = "admin")]
        account: String,
        #[arg(long, default_value = "PPGEE")]
        issuer: String,
    },
}

#[derive(Debug)]
enum CliError {
    Logging(ppgee_core::LoggingError),
    Store(ppgee_core::StoreError),
    Sync(ppgee_core::SyncError),
    Auth(ppgee_core::AuthError),
    Backup(ppgee_core::BackupError),
    Json(serde_json::Error),
    Io { path: PathBuf, source: std::io::Error },
    ClearNotConfirmed,
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Logging(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::Sync(err) => write!(f, "{err}"),
            Self::Auth(err) => write!(f, "{err}"),
            Self::Backup(err) => write!(f, "{err}"),
            Self::Json(err) => write!(f, "invalid JSON input: {err}"),
            Self::Io { path, source } => write!(f, "`{}`: {source}", path.display()),
            Self::ClearNotConfirmed => f.write_str("refusing to clear all data without --yes"),
        }
    }
}

impl Error for CliError {}

impl From<ppgee_core::StoreError> for CliError {
    fn from(err: ppgee_core::StoreError) -> Self {
        Self::Store(err)
    }
}

impl From<ppgee_core::SyncError> for CliError {
    fn from(err: ppgee_core::SyncError) -> Self {
        Self::Sync(err)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

/// Prints notices to stderr so they are seen even when stdout is piped.
struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn notify(&self, notice: &Notice) {
        let level = match notice.level {
            NoticeLevel::Info => "info",
            NoticeLevel::Error => "error",
        };
        eprintln!("[{level}] {}", notice.message);
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("ppgee: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    // Without a log directory only warnings reach the terminal by default.
    match &cli.log_dir {
        Some(log_dir) => init_logging(
            cli.log_level
                .as_deref()
                .unwrap_or(ppgee_core::default_log_level()),
            log_dir,
        ),
        None => init_stderr_logging(cli.log_level.as_deref().unwrap_or("warn")),
    }
    .map_err(CliError::Logging)?;

    match cli.command {
        Command::OtpUri {
            secret,
            account,
            issuer,
        } => {
            let verifier = TotpVerifier::from_base32(&secret).map_err(CliError::Auth)?;
            println!("{}", verifier.provisioning_uri(&account, &issuer));
            Ok(())
        }
        command => {
            let store = SqliteDocumentStore::open(&cli.db)?.with_max_batch_writes(cli.batch_limit);
            let sync = Synchronizer::with_notifier(
                Repositories::new(Arc::new(store)),
                Arc::new(StderrNotifier),
            );
            run_data_command(&sync, command)
        }
    }
}

fn run_data_command(sync: &Synchronizer, command: Command) -> Result<(), CliError> {
    let grant = ViewRouter::route(Role::Administrator, View::DataManagement);

    match command {
        Command::List {
            kind,
            sort_by,
            desc,
            date,
        } => {
            sync.refresh()?;
            let mut documents = sync.snapshot().documents(kind)?;
            if let Some(field) = sort_by {
                let order = if desc { SortOrder::Desc } else { SortOrder::Asc };
                sort_documents(&mut documents, &field, order, CompareOptions { date });
            }
            for document in &documents {
                println!("{}", serde_json::to_string(document)?);
            }
        }
        Command::Import { kind, file } => {
            let text = read_file(&file)?;
            let created = import(sync, &grant, kind, &text)?;
            info!(
                "event=cli_import module=cli status=ok collection={} rows={created}",
                kind.collection()
            );
            eprintln!("imported {created} {} record(s)", kind.collection());
        }
        Command::Export { out } => {
            sync.refresh()?;
            let text = sync
                .export_backup()?
                .to_json_pretty()
                .map_err(CliError::Backup)?;
            match out {
                Some(path) => write_file(&path, &text)?,
                None => println!("{text}"),
            }
        }
        Command::Restore { file } => {
            let text = read_file(&file)?;
            let report = sync.restore_json(&grant, &text)?;
            for (kind, count) in report.created {
                eprintln!("restored {count} {} record(s)", kind.collection());
            }
        }
        Command::Clear { yes } => {
            if !yes {
                return Err(CliError::ClearNotConfirmed);
            }
            let report = sync.clear_all(&grant)?;
            for (kind, count) in report.removed {
                eprintln!("removed {count} {} record(s)", kind.collection());
            }
        }
        // Handled before the store is opened.
        Command::OtpUri { .. } => {}
    }
    Ok(())
}

fn parse_kind(value: &str) -> Result<EntityKind, String> {
    EntityKind::parse(value).map_err(|err: EntityKindError| err.to_string())
}

fn import(
    sync: &Synchronizer,
    grant: &ViewGrant,
    kind: EntityKind,
    text: &str,
) -> Result<usize, CliError> {
    match kind {
        EntityKind::Graduates => import_rows::<Graduate>(sync, grant, text),
        EntityKind::Docentes => import_rows::<Docente>(sync, grant, text),
        EntityKind::Projetos => import_rows::<Projeto>(sync, grant, text),
        EntityKind::Turmas => import_rows::<Turma>(sync, grant, text),
        EntityKind::AlunosRegulares => import_rows::<AlunoRegular>(sync, grant, text),
        EntityKind::AlunosEspeciais => import_rows::<AlunoEspecial>(sync, grant, text),
        EntityKind::Periodicos => import_rows::<Periodico>(sync, grant, text),
        EntityKind::Conferencias => import_rows::<Conferencia>(sync, grant, text),
    }
}

fn import_rows<E: Mirrored>(
    sync: &Synchronizer,
    grant: &ViewGrant,
    text: &str,
) -> Result<usize, CliError> {
    let rows: Vec<E> = serde_json::from_str(text)?;
    Ok(sync.import(grant, rows)?.len())
}

fn read_file(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write_file(path: &Path, text: &str) -> Result<(), CliError> {
    fs::write(path, text).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::{import, Cli, Command};
    use clap::Parser;
    use ppgee_core::{
        EntityKind, MemoryDocumentStore, Repositories, Role, Synchronizer, View, ViewRouter,
    };
    use std::sync::Arc;

    #[test]
    fn parses_list_with_sort_flags() {
        let cli = Cli::try_parse_from([
            "ppgee", "--db", "/tmp/x.sqlite3", "list", "alunos-regulares", "--sort-by",
            "dataIngresso", "--desc", "--date",
        ])
        .unwrap();
        match cli.command {
            Command::List {
                kind,
                sort_by,
                desc,
                date,
            } => {
                assert_eq!(kind, EntityKind::AlunosRegulares);
                assert_eq!(sort_by.as_deref(), Some("dataIngresso"));
                assert!(desc);
                assert!(date);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_collection() {
        assert!(Cli::try_parse_from(["ppgee", "list", "alunos"]).is_err());
    }

    #[test]
    fn clear_defaults_to_unconfirmed() {
        let cli = Cli::try_parse_from(["ppgee", "clear"]).unwrap();
        assert!(matches!(cli.command, Command::Clear { yes: false }));
    }

    #[test]
    fn import_dispatches_by_kind_and_sanitizes_rows() {
        let sync = Synchronizer::new(Repositories::new(Arc::new(MemoryDocumentStore::new())));
        let grant = ViewRouter::route(Role::Administrator, View::DataManagement);

        let created = import(
            &sync,
            &grant,
            EntityKind::Docentes,
            r#"[{"nome":"Ana"},{"id":"d2","nome":"Bruno"}]"#,
        )
        .unwrap();

        assert_eq!(created, 2);
        let docentes = sync.records::<ppgee_core::Docente>();
        assert_eq!(docentes.len(), 2);
        assert!(docentes.iter().all(|docente| !docente.id.is_empty()));
    }
}
