//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! store / reload / mutation / http
//!     → logging.rs (structured events to stdout and the rolling log file)
//!     → metrics.rs (mutation and reload counters, latency histograms)
//!
//! Consumers:
//!     → operators reconstructing config history from the log file
//!     → Prometheus scrape (optional)
//! ```

pub mod logging;
pub mod metrics;
