//! Metrics collection and exposition.
//!
//! # Metrics
//! - `ngx_agent_mutations_total` (counter): mutations by kind and outcome
//!   (`committed`, `rolled_back`, `apply_failed`, `rollback_failed`)
//! - `ngx_agent_mutation_duration_seconds` (histogram): lock-held time per mutation
//! - `ngx_agent_reloads_total` (counter): reload attempts by result
//! - `ngx_agent_reload_duration_seconds` (histogram): reload subprocess latency
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::mutation::MutationKind;

/// Install the Prometheus recorder and its HTTP scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_mutation(kind: MutationKind, outcome: &'static str, elapsed: Duration) {
    counter!("ngx_agent_mutations_total", "kind" => kind.as_str(), "outcome" => outcome).increment(1);
    histogram!("ngx_agent_mutation_duration_seconds", "kind" => kind.as_str())
        .record(elapsed.as_secs_f64());
}

pub fn record_reload(success: bool, start: Instant) {
    let result = if success { "success" } else { "failure" };
    counter!("ngx_agent_reloads_total", "result" => result).increment(1);
    histogram!("ngx_agent_reload_duration_seconds").record(start.elapsed().as_secs_f64());
}
