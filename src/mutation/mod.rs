//! Mutation protocol.
//!
//! # State Machine
//! ```text
//! Idle → BackingUp → Applying → Reloading → Committing → Idle
//!                       │           │
//!                       └───────────┴──▶ RollingBack → Idle
//! ```
//!
//! # Design Decisions
//! - One mutation at a time, process-wide; the lock spans the reload subprocess
//! - The backup slot is local to the mutation holding the lock
//! - Name and existence checks happen before the lock, with no side effects
//! - Reads (`ConfigStore::list`) never take the lock

pub mod coordinator;
pub mod types;

pub use coordinator::MutationCoordinator;
pub use types::{MutationKind, MutationReport, MutationRequest, MutationStage};
