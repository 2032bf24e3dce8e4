//! Reload subsystem.
//!
//! # Responsibilities
//! - Invoke `nginx -s reload` (or the configured equivalent)
//! - Map exit status, stderr and timeouts onto `ReloadFailed`
//!
//! # Design Decisions
//! - Every reload has a deadline; a hung nginx must not hold the mutation lock forever
//! - The child is killed when the deadline passes

pub mod supervisor;

pub use supervisor::ReloadSupervisor;
