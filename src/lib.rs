//! Nginx configuration agent library.
//!
//! Edits files in an nginx configuration directory over HTTP and reloads
//! nginx after every change, restoring the previous file when the reload
//! is rejected.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod mutation;
pub mod observability;
pub mod reload;
pub mod store;

pub use config::AgentConfig;
pub use error::AgentError;
pub use http::AgentServer;
pub use lifecycle::Shutdown;
pub use mutation::{MutationCoordinator, MutationRequest};
