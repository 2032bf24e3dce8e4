//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the agent.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the nginx config agent.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AgentConfig {
    /// Listener configuration (host, port).
    pub listener: ListenerConfig,

    /// Managed nginx instance.
    pub nginx: NginxConfig,

    /// Log level and log file location.
    pub logging: LoggingConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Metrics exporter settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Host or IP to bind.
    pub host: String,

    /// TCP port to bind.
    pub port: u16,
}

impl ListenerConfig {
    /// `host:port` suitable for `TcpListener::bind`.
    pub fn bind_address(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

/// The nginx process whose configuration directory is managed.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NginxConfig {
    /// Directory holding the managed config files.
    pub config_dir: String,

    /// Path to the nginx executable.
    pub binary_path: String,

    /// Arguments passed to the executable to trigger a reload.
    pub reload_args: Vec<String>,

    /// Upper bound on a single reload.
    pub reload_timeout_secs: u64,

    /// Extension (without dot) of the files returned by listing.
    pub config_extension: String,
}

impl Default for NginxConfig {
    fn default() -> Self {
        Self {
            config_dir: "/etc/nginx/conf.d/".to_string(),
            binary_path: "/usr/sbin/nginx".to_string(),
            reload_args: vec!["-s".to_string(), "reload".to_string()],
            reload_timeout_secs: 30,
            config_extension: "conf".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory for rolling log files. Empty disables the file sink.
    pub log_dir: String,

    /// Default filter when `RUST_LOG` is unset.
    pub level: String,

    /// Rolled files kept on disk.
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: "/var/log/nginx/agent".to_string(),
            level: "info".to_string(),
            max_files: 5,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total request timeout in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 60 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Expose a Prometheus scrape endpoint.
    pub metrics_enabled: bool,

    /// Bind address of the scrape endpoint.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9105".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_stock_nginx_layout() {
        let config = AgentConfig::default();
        assert_eq!(config.nginx.config_dir, "/etc/nginx/conf.d/");
        assert_eq!(config.nginx.binary_path, "/usr/sbin/nginx");
        assert_eq!(config.nginx.reload_args, ["-s", "reload"]);
        assert_eq!(config.listener.bind_address(), "0.0.0.0:5000");
        assert_eq!(config.logging.log_dir, "/var/log/nginx/agent");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: AgentConfig = toml::from_str(
            r#"
            [listener]
            port = 8088

            [nginx]
            config_dir = "/srv/nginx/sites"
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.port, 8088);
        assert_eq!(config.listener.host, "0.0.0.0");
        assert_eq!(config.nginx.config_dir, "/srv/nginx/sites");
        assert_eq!(config.nginx.reload_timeout_secs, 30);
    }

    #[test]
    fn test_ipv6_bind_address() {
        let listener = ListenerConfig {
            host: "::1".into(),
            port: 5000,
        };
        assert_eq!(listener.bind_address(), "[::1]:5000");
    }
}
