//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, port valid)
//! - Check that timeouts nest (a reload must fit inside a request)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AgentConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::AgentConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_config(config: &AgentConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.port == 0 {
        errors.push(ValidationError::new("listener.port", "must be non-zero"));
    }
    if config.listener.host.trim().is_empty() {
        errors.push(ValidationError::new("listener.host", "must not be empty"));
    }

    if config.nginx.config_dir.trim().is_empty() {
        errors.push(ValidationError::new("nginx.config_dir", "must not be empty"));
    }
    if config.nginx.binary_path.trim().is_empty() {
        errors.push(ValidationError::new("nginx.binary_path", "must not be empty"));
    }
    if config.nginx.reload_timeout_secs == 0 {
        errors.push(ValidationError::new("nginx.reload_timeout_secs", "must be greater than 0"));
    }
    let ext = &config.nginx.config_extension;
    if ext.is_empty() || ext.starts_with('.') || ext.contains('/') {
        errors.push(ValidationError::new(
            "nginx.config_extension",
            "must be a bare extension such as \"conf\"",
        ));
    }

    if config.timeouts.request_secs <= config.nginx.reload_timeout_secs {
        errors.push(ValidationError::new(
            "timeouts.request_secs",
            format!(
                "must exceed nginx.reload_timeout_secs ({})",
                config.nginx.reload_timeout_secs
            ),
        ));
    }

    if config.logging.max_files == 0 {
        errors.push(ValidationError::new("logging.max_files", "must be greater than 0"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("invalid socket address {:?}", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
