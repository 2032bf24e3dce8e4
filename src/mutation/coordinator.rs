//! Serialized backup → apply → reload → commit/rollback of single files.

use std::time::Instant;

use tokio::sync::{watch, Mutex};
use uuid::Uuid;

use crate::error::AgentError;
use crate::mutation::types::{MutationKind, MutationReport, MutationRequest, MutationStage};
use crate::observability::metrics;
use crate::reload::ReloadSupervisor;
use crate::store::{BackupManager, ConfigName, ConfigStore};

/// Owns the right to mutate the configuration directory.
///
/// At most one mutation runs at a time. The lock is held from the backup
/// until the outcome is resolved, including the reload subprocess.
pub struct MutationCoordinator {
    store: ConfigStore,
    reloader: ReloadSupervisor,
    lock: Mutex<()>,
    stage: watch::Sender<MutationStage>,
}

impl MutationCoordinator {
    pub fn new(store: ConfigStore, reloader: ReloadSupervisor) -> Self {
        let (stage, _) = watch::channel(MutationStage::Idle);
        Self {
            store,
            reloader,
            lock: Mutex::new(()),
            stage,
        }
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    /// Current stage of the in-flight mutation, `Idle` if none.
    pub fn stage(&self) -> MutationStage {
        *self.stage.borrow()
    }

    /// Run one mutation to a terminal outcome.
    ///
    /// `InvalidName` and `NotFound` are returned before anything is touched.
    /// Apply and reload failures are returned after the backup was restored;
    /// `RollbackFailed` if the restore itself failed.
    pub async fn apply(&self, request: MutationRequest) -> Result<MutationReport, AgentError> {
        let name = ConfigName::parse(&request.filename)?;
        if request.kind.requires_existing() && !self.store.exists(&name).await? {
            return Err(AgentError::NotFound(name.to_string()));
        }

        let _exclusive = self.lock.lock().await;

        // A mutation that held the lock before us may have removed the target.
        if request.kind.requires_existing() && !self.store.exists(&name).await? {
            return Err(AgentError::NotFound(name.to_string()));
        }

        let id = Uuid::new_v4();
        let start = Instant::now();
        let _idle = StageReset(&self.stage);
        let mut backup = BackupManager::new(self.store.clone());

        self.enter(id, MutationStage::BackingUp);
        backup.snapshot(&name).await?;
        self.log_intent(id, &name, &request, &backup);

        self.enter(id, MutationStage::Applying);
        if let Err(e) = self.apply_change(&name, &request).await {
            return Err(self.roll_back(id, &name, request.kind, start, &mut backup, e).await);
        }

        self.enter(id, MutationStage::Reloading);
        if let Err(e) = self.reloader.reload().await {
            return Err(self.roll_back(id, &name, request.kind, start, &mut backup, e).await);
        }

        self.enter(id, MutationStage::Committing);
        backup.discard();
        metrics::record_mutation(request.kind, "committed", start.elapsed());
        tracing::info!(
            mutation_id = %id,
            filename = %name,
            kind = %request.kind,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Config mutation committed"
        );

        Ok(MutationReport {
            id,
            filename: name.to_string(),
            kind: request.kind,
        })
    }

    async fn apply_change(&self, name: &ConfigName, request: &MutationRequest) -> Result<(), AgentError> {
        match request.kind {
            MutationKind::Create | MutationKind::Update => self.store.write(name, request.content()).await,
            MutationKind::Delete => self.store.remove(name).await,
        }
    }

    /// Restore the backup and return the error to report to the caller.
    async fn roll_back(
        &self,
        id: Uuid,
        name: &ConfigName,
        kind: MutationKind,
        start: Instant,
        backup: &mut BackupManager,
        cause: AgentError,
    ) -> AgentError {
        self.enter(id, MutationStage::RollingBack);
        tracing::warn!(
            mutation_id = %id,
            filename = %name,
            kind = %kind,
            error = %cause,
            "Config mutation failed, rolling back"
        );

        let original = backup
            .slot()
            .map(|slot| String::from_utf8_lossy(&slot.content).into_owned());

        match backup.restore().await {
            Ok(()) => {
                let outcome = match &cause {
                    AgentError::ReloadFailed(_) => "rolled_back",
                    _ => "apply_failed",
                };
                metrics::record_mutation(kind, outcome, start.elapsed());
                cause
            }
            Err(restore) => {
                metrics::record_mutation(kind, "rollback_failed", start.elapsed());
                tracing::error!(
                    target: "ngx_agent::alert",
                    mutation_id = %id,
                    filename = %name,
                    kind = %kind,
                    cause = %cause,
                    restore_error = %restore,
                    original = original.as_deref().unwrap_or("<file did not exist>"),
                    "Rollback failed; on-disk config and running nginx may have diverged"
                );
                AgentError::RollbackFailed {
                    filename: name.to_string(),
                    cause: Box::new(cause),
                    restore: Box::new(restore),
                }
            }
        }
    }

    fn enter(&self, id: Uuid, stage: MutationStage) {
        tracing::debug!(mutation_id = %id, ?stage, "Mutation stage");
        self.stage.send_replace(stage);
    }

    fn log_intent(&self, id: Uuid, name: &ConfigName, request: &MutationRequest, backup: &BackupManager) {
        let previous = backup
            .slot()
            .map(|slot| String::from_utf8_lossy(&slot.content).into_owned());
        let content = match request.kind {
            MutationKind::Delete => None,
            _ => Some(String::from_utf8_lossy(request.content()).into_owned()),
        };

        tracing::info!(
            mutation_id = %id,
            filename = %name,
            kind = %request.kind,
            previous = previous.as_deref().unwrap_or("<none>"),
            content = content.as_deref().unwrap_or("<none>"),
            "Applying config mutation"
        );
    }
}

/// Puts the stage back to `Idle` however the mutation ends.
struct StageReset<'a>(&'a watch::Sender<MutationStage>);

impl Drop for StageReset<'_> {
    fn drop(&mut self) {
        self.0.send_replace(MutationStage::Idle);
    }
}
