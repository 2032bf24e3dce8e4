//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! built-in defaults (schema.rs)
//!     → optional TOML file (loader.rs)
//!     → NGX_CONF_API_* env vars / flags (args.rs)
//!     → validation.rs (semantic checks)
//!     → AgentConfig (validated, immutable for the process lifetime)
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup; there is no runtime reload of agent settings
//! - All fields have defaults to allow running with no file at all
//! - Validation separates syntactic (serde) from semantic checks

pub mod args;
pub mod loader;
pub mod schema;
pub mod validation;

pub use args::AgentArgs;
pub use loader::{resolve_config, ConfigError};
pub use schema::AgentConfig;
pub use schema::ListenerConfig;
pub use schema::LoggingConfig;
pub use schema::NginxConfig;
pub use schema::ObservabilityConfig;
