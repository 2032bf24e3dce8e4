//! Configuration directory subsystem.
//!
//! # Data Flow
//! ```text
//! raw filename from request
//!     → naming.rs (ConfigName::parse, rejects traversal)
//!     → files.rs (ConfigStore: list / read / write / remove)
//!
//! During a mutation:
//!     backup.rs (BackupManager) snapshots the target through ConfigStore
//!     and restores or discards it once the outcome is known
//! ```

pub mod backup;
pub mod files;
pub mod naming;

pub use backup::{BackupManager, BackupSlot};
pub use files::{ConfigFile, ConfigStore};
pub use naming::ConfigName;
