//! Filesystem access to the nginx configuration directory.
//!
//! # Responsibilities
//! - List files carrying the configured extension, with their content
//! - Read, write and remove single files addressed by a validated `ConfigName`
//!
//! # Design Decisions
//! - Writes go to a dot-prefixed temporary sibling and are renamed into place,
//!   so a concurrent `list` sees either the old or the new content
//! - The temporary file takes the replaced file's mode and owner and is
//!   fsynced before the rename
//! - A symlinked config is written through: the link stays, its target is
//!   replaced. Links resolving outside the directory are refused
//! - Temporary files never carry the config extension and are never listed
//! - `list` fails as a whole on the first unreadable file

use std::fs::{Metadata, Permissions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::error::AgentError;
use crate::store::naming::ConfigName;

/// A configuration file and its content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    pub filename: String,
    pub content: Vec<u8>,
}

/// Handle on the configuration directory.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    dir: PathBuf,
    extension: String,
}

impl ConfigStore {
    /// Create a store over `dir`, listing files ending in `.{extension}`.
    pub fn new(dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.into(),
        }
    }

    /// List config files in directory-entry order.
    pub async fn list(&self) -> Result<Vec<ConfigFile>, AgentError> {
        let dir_label = self.dir.display().to_string();
        let mut entries = fs::read_dir(&self.dir)
            .await
            .map_err(|e| AgentError::io("read directory", &dir_label, e))?;

        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| AgentError::io("read directory", &dir_label, e))?
        {
            let path = entry.path();
            if !self.has_config_extension(&path) {
                continue;
            }

            let filename = entry.file_name().to_string_lossy().into_owned();
            let metadata = fs::metadata(&path)
                .await
                .map_err(|e| AgentError::io("stat", &filename, e))?;
            if !metadata.is_file() {
                continue;
            }

            let content = fs::read(&path)
                .await
                .map_err(|e| AgentError::io("read", &filename, e))?;
            files.push(ConfigFile { filename, content });
        }

        Ok(files)
    }

    /// Read the content of one file.
    pub async fn read(&self, name: &ConfigName) -> Result<Vec<u8>, AgentError> {
        let path = self.locate(name).await?;
        fs::read(path)
            .await
            .map_err(|e| not_found_or_io(e, "read", name))
    }

    /// Permission bits of an existing file.
    pub async fn permissions(&self, name: &ConfigName) -> Result<Permissions, AgentError> {
        let path = self.locate(name).await?;
        fs::metadata(path)
            .await
            .map(|meta| meta.permissions())
            .map_err(|e| not_found_or_io(e, "stat", name))
    }

    pub async fn set_permissions(&self, name: &ConfigName, permissions: Permissions) -> Result<(), AgentError> {
        let path = self.locate(name).await?;
        fs::set_permissions(path, permissions)
            .await
            .map_err(|e| not_found_or_io(e, "chmod", name))
    }

    pub async fn exists(&self, name: &ConfigName) -> Result<bool, AgentError> {
        fs::try_exists(name.resolve(&self.dir))
            .await
            .map_err(|e| AgentError::io("stat", name.as_str(), e))
    }

    /// Create or overwrite a file.
    pub async fn write(&self, name: &ConfigName, content: &[u8]) -> Result<(), AgentError> {
        let target = self.locate(name).await?;
        let existing = match fs::metadata(&target).await {
            Ok(meta) => Some(meta),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(AgentError::io("stat", name.as_str(), e)),
        };

        let staging = self.staging_path(&target, name);
        if let Err(e) = replace(&staging, &target, content, existing.as_ref()).await {
            let _ = fs::remove_file(&staging).await;
            return Err(AgentError::io("write", name.as_str(), e));
        }

        Ok(())
    }

    /// Delete a file.
    pub async fn remove(&self, name: &ConfigName) -> Result<(), AgentError> {
        fs::remove_file(name.resolve(&self.dir))
            .await
            .map_err(|e| not_found_or_io(e, "remove", name))
    }

    /// Where reads and writes of `name` land: the entry itself, or the file
    /// a symlink entry points at.
    async fn locate(&self, name: &ConfigName) -> Result<PathBuf, AgentError> {
        let path = name.resolve(&self.dir);
        match fs::symlink_metadata(&path).await {
            Ok(meta) if meta.file_type().is_symlink() => {}
            Ok(_) => return Ok(path),
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(path),
            Err(e) => return Err(AgentError::io("stat", name.as_str(), e)),
        }

        let resolved = fs::canonicalize(&path)
            .await
            .map_err(|e| AgentError::io("resolve link", name.as_str(), e))?;
        let root = fs::canonicalize(&self.dir)
            .await
            .map_err(|e| AgentError::io("resolve directory", self.dir.display().to_string(), e))?;

        if !resolved.starts_with(&root) {
            tracing::warn!(
                filename = %name,
                target = %resolved.display(),
                "Config symlink points outside the config directory"
            );
            return Err(AgentError::InvalidName(name.to_string()));
        }
        Ok(resolved)
    }

    fn staging_path(&self, target: &Path, name: &ConfigName) -> PathBuf {
        let parent = target.parent().unwrap_or(&self.dir);
        let stem = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| name.to_string());
        parent.join(format!(".{}.{}.tmp", stem, Uuid::new_v4().simple()))
    }

    fn has_config_extension(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext == self.extension.as_str())
            .unwrap_or(false)
    }
}

/// Write `content` to `staging`, carry over the replaced file's mode and
/// owner, flush it to disk and rename it over `target`.
async fn replace(
    staging: &Path,
    target: &Path,
    content: &[u8],
    existing: Option<&Metadata>,
) -> std::io::Result<()> {
    let mut file = fs::File::create(staging).await?;
    file.write_all(content).await?;

    if let Some(meta) = existing {
        #[cfg(unix)]
        copy_owner(staging, meta).await;
        // After chown, which clears setuid/setgid.
        file.set_permissions(meta.permissions()).await?;
    }

    file.sync_all().await?;
    drop(file);
    fs::rename(staging, target).await
}

/// Best effort: only root can give a file away.
#[cfg(unix)]
async fn copy_owner(staging: &Path, meta: &Metadata) {
    use std::os::unix::fs::MetadataExt;

    let (uid, gid) = (meta.uid(), meta.gid());
    let path = staging.to_path_buf();
    let result = tokio::task::spawn_blocking(move || std::os::unix::fs::chown(&path, Some(uid), Some(gid))).await;
    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::debug!(uid, gid, error = %e, "Could not carry over file owner"),
        Err(e) => tracing::debug!(error = %e, "Owner copy task failed"),
    }
}

fn not_found_or_io(err: std::io::Error, op: &'static str, name: &ConfigName) -> AgentError {
    if err.kind() == ErrorKind::NotFound {
        AgentError::NotFound(name.to_string())
    } else {
        AgentError::io(op, name.as_str(), err)
    }
}
