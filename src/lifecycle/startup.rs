//! Startup orchestration.
//!
//! # Responsibilities
//! - Check the configuration directory before accepting traffic
//! - Start the metrics exporter when enabled
//! - Bind the listener and serve until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener starts last (traffic only when ready)

use std::net::SocketAddr;
use std::path::Path;

use tokio::net::TcpListener;

use crate::config::AgentConfig;
use crate::http::AgentServer;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;

/// Run the agent until `shutdown` fires.
pub async fn run(config: AgentConfig, shutdown: &Shutdown) -> Result<(), std::io::Error> {
    let config_dir = Path::new(&config.nginx.config_dir);
    if !config_dir.is_dir() {
        tracing::warn!(
            config_dir = %config_dir.display(),
            "Configuration directory does not exist; listing will fail until it is created"
        );
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(config.listener.bind_address()).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        nginx = %config.nginx.binary_path,
        reload_timeout_secs = config.nginx.reload_timeout_secs,
        "Listening for connections"
    );

    let server = AgentServer::new(config);
    server.run(listener, shutdown.subscribe()).await
}
