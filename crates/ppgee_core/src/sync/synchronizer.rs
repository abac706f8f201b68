use super::mirror::{Mirror, Mirrored};
use super::notice::{LogNotifier, Notice, Notifier};
use super::{SyncError, SyncResult};
use crate::access::{Operation, ViewGrant};
use crate::backup::BackupBundle;
use crate::model::entity::EntityKind;
use crate::repo::{RepoResult, Repositories, Repository};
use crate::sanitize::sanitize_for_import;
use crate::store::DeleteAck;
use log::{debug, error, info, warn};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, ScopedJoinHandle};
use std::time::Instant;

/// Result of a full refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// All eight mirrors were replaced.
    Applied { records: usize },
    /// A clear-all started while the fetch was in flight; nothing was applied.
    Discarded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreReport {
    /// Records sent per collection present in the bundle.
    pub created: Vec<(EntityKind, usize)>,
    pub refresh: RefreshOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearReport {
    pub removed: Vec<(EntityKind, usize)>,
}

/// Owns the mirror and reconciles repository results into it.
pub struct Synchronizer {
    repos: Repositories,
    mirror: RwLock<Mirror>,
    generation: AtomicU64,
    notifier: Arc<dyn Notifier>,
}

impl Synchronizer {
    /// Starts with an empty mirror; call `refresh` to load.
    pub fn new(repos: Repositories) -> Self {
        Self::with_notifier(repos, Arc::new(LogNotifier))
    }

    pub fn with_notifier(repos: Repositories, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            repos,
            mirror: RwLock::new(Mirror::default()),
            generation: AtomicU64::new(0),
            notifier,
        }
    }

    pub fn repositories(&self) -> &Repositories {
        &self.repos
    }

    /// Copy of the current mirror.
    pub fn snapshot(&self) -> Mirror {
        self.mirror.read().clone()
    }

    pub fn records<E: Mirrored>(&self) -> Vec<E> {
        self.mirror.read().records::<E>().to_vec()
    }

    /// Bumped when a clear-all starts and again when it empties the mirror.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Creates one record and appends it to the mirror.
    pub fn add<E: Mirrored>(&self, grant: &ViewGrant, item: E) -> SyncResult<E> {
        grant.authorize(Operation::Add, E::KIND)?;
        let created = self
            .repo::<E>()
            .create(&item)
            .map_err(|err| failed(Operation::Add, E::KIND, err.into()))?;

        self.mirror.write().append([created.clone()]);
        debug!(
            "event=sync_add module=sync status=ok collection={} id={}",
            E::KIND.collection(),
            created.id()
        );
        Ok(created)
    }

    /// Merges `item` remotely and replaces the mirror entry with the same id.
    /// Records the mirror has not loaded yet are left out of it.
    pub fn update<E: Mirrored>(&self, grant: &ViewGrant, item: E) -> SyncResult<E> {
        grant.authorize(Operation::Update, E::KIND)?;
        let updated = self
            .repo::<E>()
            .update(&item)
            .map_err(|err| failed(Operation::Update, E::KIND, err.into()))?;

        let replaced = self.mirror.write().replace(updated.clone());
        debug!(
            "event=sync_update module=sync status=ok collection={} id={} mirrored={}",
            E::KIND.collection(),
            updated.id(),
            replaced
        );
        Ok(updated)
    }

    pub fn delete<E: Mirrored>(&self, grant: &ViewGrant, id: &str) -> SyncResult<DeleteAck> {
        grant.authorize(Operation::Delete, E::KIND)?;
        let ack = self
            .repo::<E>()
            .delete(id)
            .map_err(|err| failed(Operation::Delete, E::KIND, err.into()))?;

        let removed = self.mirror.write().remove::<E>(id);
        debug!(
            "event=sync_delete module=sync status=ok collection={} id={id} mirrored={}",
            E::KIND.collection(),
            removed
        );
        Ok(ack)
    }

    /// Sanitizes and bulk-creates `rows`, appending them on success.
    ///
    /// When a later chunk fails, earlier chunks stay committed remotely but
    /// the mirror is not touched; the error reports the committed count.
    pub fn import<E: Mirrored>(&self, grant: &ViewGrant, rows: Vec<E>) -> SyncResult<Vec<E>> {
        grant.authorize(Operation::Import, E::KIND)?;
        let started_at = Instant::now();
        let result = sanitize_for_import(rows)
            .map_err(|source| SyncError::Import {
                kind: E::KIND,
                source,
            })
            .and_then(|rows| Ok(self.repo::<E>().create_many(&rows)?));

        match result {
            Ok(created) => {
                self.mirror.write().append(created.iter().cloned());
                info!(
                    "event=sync_import module=sync status=ok collection={} rows={} duration_ms={}",
                    E::KIND.collection(),
                    created.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(created)
            }
            Err(err) => {
                let err = failed(Operation::Import, E::KIND, err);
                self.notifier.notify(&Notice::error(format!(
                    "Erro ao importar registros de {}: {err}",
                    E::KIND.label()
                )));
                Err(err)
            }
        }
    }

    /// Fetches all eight collections concurrently and replaces every mirror,
    /// or none when any fetch fails.
    pub fn refresh(&self) -> SyncResult<RefreshOutcome> {
        let started_at = Instant::now();
        let generation = self.generation();
        let fetched = self.fetch_all().map_err(|err| {
            error!("event=sync_refresh module=sync status=error error={err}");
            err
        })?;

        let mut mirror = self.mirror.write();
        if self.generation() != generation {
            warn!(
                "event=sync_refresh module=sync status=discarded started_generation={generation} generation={}",
                self.generation()
            );
            return Ok(RefreshOutcome::Discarded);
        }

        let records = fetched.total_len();
        *mirror = fetched;
        info!(
            "event=sync_refresh module=sync status=ok records={records} duration_ms={}",
            started_at.elapsed().as_millis()
        );
        Ok(RefreshOutcome::Applied { records })
    }

    /// Additive restore: bulk-creates every present array, then refreshes.
    pub fn restore(&self, grant: &ViewGrant, bundle: BackupBundle) -> SyncResult<RestoreReport> {
        grant.authorize_dataset(Operation::Restore)?;
        match self.restore_arrays(bundle) {
            Ok(report) => {
                info!(
                    "event=sync_restore module=sync status=ok collections={}",
                    report.created.len()
                );
                self.notifier.notify(&Notice::info(
                    "Backup restaurado com sucesso (dados adicionados).",
                ));
                Ok(report)
            }
            Err(err) => {
                error!("event=sync_restore module=sync status=error error={err}");
                self.notifier.notify(&Notice::error(format!(
                    "Ocorreu um erro ao restaurar os dados do backup: {err}"
                )));
                Err(err)
            }
        }
    }

    /// Parses untrusted backup text, then restores it.
    pub fn restore_json(&self, grant: &ViewGrant, text: &str) -> SyncResult<RestoreReport> {
        grant.authorize_dataset(Operation::Restore)?;
        match BackupBundle::parse(text) {
            Ok(bundle) => self.restore(grant, bundle),
            Err(err) => {
                let err = SyncError::from(err);
                warn!("event=sync_restore module=sync status=error error={err}");
                self.notifier.notify(&Notice::error(format!(
                    "Ocorreu um erro ao restaurar os dados do backup: {err}"
                )));
                Err(err)
            }
        }
    }

    /// Clears all eight collections concurrently, then empties the mirror.
    /// Refreshes in flight at any point during the clear are discarded.
    pub fn clear_all(&self, grant: &ViewGrant) -> SyncResult<ClearReport> {
        grant.authorize_dataset(Operation::Clear)?;
        self.generation.fetch_add(1, Ordering::SeqCst);

        let mut removed = Vec::with_capacity(EntityKind::ALL.len());
        let mut first_error = None;
        for (kind, result) in self.clear_remote() {
            match result {
                Ok(count) => removed.push((kind, count)),
                Err(err) => {
                    error!(
                        "event=sync_clear module=sync status=error collection={} error={err}",
                        kind.collection()
                    );
                    first_error.get_or_insert(err);
                }
            }
        }
        if let Some(err) = first_error {
            self.notifier
                .notify(&Notice::error("Erro ao limpar dados. Verifique o log."));
            return Err(err);
        }

        // Refreshes that listed while the remote clear ran are stale too.
        let mut mirror = self.mirror.write();
        self.generation.fetch_add(1, Ordering::SeqCst);
        *mirror = Mirror::default();
        drop(mirror);
        info!(
            "event=sync_clear module=sync status=ok removed={}",
            removed.iter().map(|(_, count)| count).sum::<usize>()
        );
        self.notifier
            .notify(&Notice::info("Todos os dados foram removidos."));
        Ok(ClearReport { removed })
    }

    /// Backup bundle of the current mirror.
    pub fn export_backup(&self) -> SyncResult<BackupBundle> {
        self.mirror.read().to_backup().map_err(SyncError::Export)
    }

    fn repo<E: Mirrored>(&self) -> Repository<E> {
        self.repos.of::<E>()
    }

    fn restore_arrays(&self, bundle: BackupBundle) -> SyncResult<RestoreReport> {
        let mut created = Vec::new();
        for (kind, records) in bundle.into_arrays() {
            let count = records.len();
            self.repos.create_many_documents(kind, records)?;
            created.push((kind, count));
        }
        let refresh = self.refresh()?;
        Ok(RestoreReport { created, refresh })
    }

    fn fetch_all(&self) -> SyncResult<Mirror> {
        let repos = &self.repos;
        thread::scope(|scope| {
            let graduates = scope.spawn(|| repos.graduates.list());
            let docentes = scope.spawn(|| repos.docentes.list());
            let projetos = scope.spawn(|| repos.projetos.list());
            let turmas = scope.spawn(|| repos.turmas.list());
            let alunos_regulares = scope.spawn(|| repos.alunos_regulares.list());
            let alunos_especiais = scope.spawn(|| repos.alunos_especiais.list());
            let periodicos = scope.spawn(|| repos.periodicos.list());
            let conferencias = scope.spawn(|| repos.conferencias.list());

            let graduates = join("refresh", graduates);
            let docentes = join("refresh", docentes);
            let projetos = join("refresh", projetos);
            let turmas = join("refresh", turmas);
            let alunos_regulares = join("refresh", alunos_regulares);
            let alunos_especiais = join("refresh", alunos_especiais);
            let periodicos = join("refresh", periodicos);
            let conferencias = join("refresh", conferencias);

            Ok(Mirror {
                graduates: graduates?,
                docentes: docentes?,
                projetos: projetos?,
                turmas: turmas?,
                alunos_regulares: alunos_regulares?,
                alunos_especiais: alunos_especiais?,
                periodicos: periodicos?,
                conferencias: conferencias?,
            })
        })
    }

    fn clear_remote(&self) -> Vec<(EntityKind, SyncResult<usize>)> {
        let repos = &self.repos;
        thread::scope(|scope| {
            let handles: Vec<_> = EntityKind::ALL
                .into_iter()
                .map(|kind| (kind, scope.spawn(move || repos.clear_kind(kind))))
                .collect();
            handles
                .into_iter()
                .map(|(kind, handle)| (kind, join("clear", handle)))
                .collect()
        })
    }
}

fn join<T>(operation: &'static str, handle: ScopedJoinHandle<'_, RepoResult<T>>) -> SyncResult<T> {
    match handle.join() {
        Ok(result) => Ok(result?),
        Err(_) => Err(SyncError::WorkerPanicked { operation }),
    }
}

fn failed(operation: Operation, kind: EntityKind, err: SyncError) -> SyncError {
    error!(
        "event=sync_{operation} module=sync status=error collection={} error={err}",
        kind.collection()
    );
    err
}
