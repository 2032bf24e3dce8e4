//! Command-line flags and environment overrides.
//!
//! Each setting is taken from its flag, else from its `NGX_CONF_API_*`
//! environment variable, else left as loaded from file or defaults.

use std::path::PathBuf;

use clap::Parser;

use crate::config::schema::AgentConfig;

#[derive(Debug, Clone, Default, Parser)]
#[command(name = "ngx-agent", version, about = "HTTP agent that edits nginx config files and reloads nginx")]
pub struct AgentArgs {
    /// Optional TOML configuration file
    #[arg(long, env = "NGX_CONF_API_CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Nginx configuration directory
    #[arg(long = "config-dir", alias = "configDir", env = "NGX_CONF_API_CONFIG_DIR")]
    pub config_dir: Option<String>,

    /// Path to the nginx executable
    #[arg(long = "nginx-path", alias = "nginxPath", env = "NGX_CONF_API_NGINX_PATH")]
    pub nginx_path: Option<String>,

    /// Log directory
    #[arg(long = "log-dir", alias = "logDir", env = "NGX_CONF_API_LOG_DIR")]
    pub log_dir: Option<String>,

    /// Host to listen on
    #[arg(long, env = "NGX_CONF_API_HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(long, env = "NGX_CONF_API_PORT")]
    pub port: Option<u16>,
}

impl AgentArgs {
    /// Overwrite the settings given on the command line or in the environment.
    pub fn apply(&self, config: &mut AgentConfig) {
        if let Some(dir) = &self.config_dir {
            config.nginx.config_dir = dir.clone();
        }
        if let Some(path) = &self.nginx_path {
            config.nginx.binary_path = path.clone();
        }
        if let Some(dir) = &self.log_dir {
            config.logging.log_dir = dir.clone();
        }
        if let Some(host) = &self.host {
            config.listener.host = host.clone();
        }
        if let Some(port) = self.port {
            config.listener.port = port;
        }
    }
}
