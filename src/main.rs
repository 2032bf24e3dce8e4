//! Nginx Config Agent
//!
//! Local HTTP agent that edits the files of an nginx configuration directory
//! and makes the running nginx pick them up.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌────────────────────────────────────────────────────┐
//!                     │                   NGX AGENT                         │
//!                     │                                                     │
//!   HTTP request      │  ┌────────┐    ┌──────────────────────┐             │
//!   ──────────────────┼─▶│  http  │───▶│ MutationCoordinator  │ (one at a   │
//!                     │  │ router │    │  lock held throughout│  time)      │
//!                     │  └───┬────┘    └──┬──────────┬────────┘             │
//!                     │      │ list       │          │                      │
//!                     │      ▼            ▼          ▼                      │
//!                     │  ┌──────────────────┐  ┌─────────────────┐          │
//!                     │  │   ConfigStore    │  │ ReloadSupervisor│──────────┼──▶ nginx -s reload
//!                     │  │  + BackupManager │  │ (bounded wait)  │          │
//!                     │  └────────┬─────────┘  └─────────────────┘          │
//!                     │           ▼                                         │
//!                     │   /etc/nginx/conf.d/*.conf                          │
//!                     └────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use clap::Parser;

use ngx_config_agent::config::{resolve_config, AgentArgs};
use ngx_config_agent::lifecycle::{signals, startup, Shutdown};
use ngx_config_agent::observability::logging::init_logging;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = AgentArgs::parse();
    let config = resolve_config(&args)?;

    let _logging = init_logging(&config.logging)?;

    tracing::info!("ngx-agent v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        config_dir = %config.nginx.config_dir,
        nginx_path = %config.nginx.binary_path,
        log_dir = %config.logging.log_dir,
        bind_address = %config.listener.bind_address(),
        "Configuration loaded"
    );

    let shutdown = Arc::new(Shutdown::new());
    signals::spawn_signal_listener(shutdown.clone());

    startup::run(config, &shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
