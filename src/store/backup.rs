//! Single-slot backup of the file being mutated.
//!
//! A `BackupManager` lives for exactly one mutation attempt and is owned by
//! the task holding the mutation lock, so the slot is never shared.
//!
//! # Lifecycle
//! ```text
//! snapshot(name)
//!     file exists   → slot = Content { name, original bytes, mode }
//!     file missing  → slot = Created { name }   (rollback deletes)
//! restore()   → writes original bytes and mode back / deletes created file,
//!               clears slot
//! discard()   → clears slot, touches nothing
//! ```

use std::fs::Permissions;

use crate::error::AgentError;
use crate::store::files::ConfigStore;
use crate::store::naming::ConfigName;

/// Pre-mutation content of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupSlot {
    pub filename: ConfigName,
    pub content: Vec<u8>,
    pub permissions: Permissions,
}

#[derive(Debug)]
enum Pending {
    Content(BackupSlot),
    Created(ConfigName),
}

/// Holds at most one pending backup so a failed mutation can be undone.
#[derive(Debug)]
pub struct BackupManager {
    store: ConfigStore,
    pending: Option<Pending>,
}

impl BackupManager {
    pub fn new(store: ConfigStore) -> Self {
        Self {
            store,
            pending: None,
        }
    }

    /// Record the current state of `name`, replacing any previous slot.
    pub async fn snapshot(&mut self, name: &ConfigName) -> Result<(), AgentError> {
        self.pending = match self.store.read(name).await {
            Ok(content) => {
                let permissions = self.store.permissions(name).await?;
                tracing::debug!(filename = %name, bytes = content.len(), "Config file backed up");
                Some(Pending::Content(BackupSlot {
                    filename: name.clone(),
                    content,
                    permissions,
                }))
            }
            Err(AgentError::NotFound(_)) => {
                tracing::debug!(filename = %name, "No existing file, rollback will delete");
                Some(Pending::Created(name.clone()))
            }
            Err(e) => return Err(e),
        };
        Ok(())
    }

    /// Undo the mutation recorded by the last `snapshot`. The slot is cleared
    /// whether or not the restore succeeds.
    pub async fn restore(&mut self) -> Result<(), AgentError> {
        match self.pending.take() {
            Some(Pending::Content(slot)) => {
                self.store.write(&slot.filename, &slot.content).await?;
                // A deleted file comes back with the default mode otherwise.
                self.store.set_permissions(&slot.filename, slot.permissions).await?;
                tracing::info!(filename = %slot.filename, "Config file restored from backup");
            }
            Some(Pending::Created(name)) => match self.store.remove(&name).await {
                Ok(()) => tracing::info!(filename = %name, "Created config file removed"),
                Err(AgentError::NotFound(_)) => {}
                Err(e) => return Err(e),
            },
            None => {}
        }
        Ok(())
    }

    /// Drop the backup after a confirmed mutation. No-op without a slot.
    pub fn discard(&mut self) {
        if self.pending.take().is_some() {
            tracing::debug!("Backup discarded");
        }
    }

    /// The recorded original content, if the file existed at snapshot time.
    pub fn slot(&self) -> Option<&BackupSlot> {
        match &self.pending {
            Some(Pending::Content(slot)) => Some(slot),
            _ => None,
        }
    }
}
