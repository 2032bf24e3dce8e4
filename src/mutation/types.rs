//! Mutation request and state types.

use uuid::Uuid;

/// What a mutation does to its target file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    /// Write a file; an existing file is overwritten.
    Create,
    /// Overwrite an existing file.
    Update,
    /// Remove an existing file.
    Delete,
}

impl MutationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MutationKind::Create => "create",
            MutationKind::Update => "update",
            MutationKind::Delete => "delete",
        }
    }

    /// Update and Delete need the target to exist before anything is touched.
    pub fn requires_existing(self) -> bool {
        !matches!(self, MutationKind::Create)
    }
}

impl std::fmt::Display for MutationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single-file mutation, alive for one HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRequest {
    pub filename: String,
    pub kind: MutationKind,
    pub new_content: Option<Vec<u8>>,
}

impl MutationRequest {
    pub fn create(filename: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            kind: MutationKind::Create,
            new_content: Some(content.into()),
        }
    }

    pub fn update(filename: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            kind: MutationKind::Update,
            new_content: Some(content.into()),
        }
    }

    pub fn delete(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            kind: MutationKind::Delete,
            new_content: None,
        }
    }

    /// Content to write; absent content on a write is treated as empty.
    pub fn content(&self) -> &[u8] {
        self.new_content.as_deref().unwrap_or_default()
    }
}

/// Where the coordinator is in the backup → apply → reload sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationStage {
    Idle,
    BackingUp,
    Applying,
    Reloading,
    Committing,
    RollingBack,
}

impl MutationStage {
    pub fn as_str(self) -> &'static str {
        match self {
            MutationStage::Idle => "idle",
            MutationStage::BackingUp => "backing_up",
            MutationStage::Applying => "applying",
            MutationStage::Reloading => "reloading",
            MutationStage::Committing => "committing",
            MutationStage::RollingBack => "rolling_back",
        }
    }
}

/// Result of a committed mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationReport {
    pub id: Uuid,
    pub filename: String,
    pub kind: MutationKind,
}
