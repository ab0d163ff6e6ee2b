//! Telemetry helpers shared by the Greentic interactive messaging crates.
//!
//! Provides subscriber installation, span field helpers and metric recorders backed by the
//! `metrics` facade. Without an installed recorder the metric calls are no-ops.

use anyhow::Result;

mod config;
mod context;
mod metrics;
mod tracing_init;

pub use config::TelemetryConfig;
pub use context::TelemetryLabels;
pub use crate::metrics::{record_counter, record_histogram, with_common_fields};
pub use tracing_init::init_telemetry;

/// Installs the subscriber configured from `RUST_LOG`, `LOG_FORMAT` and the `OTEL_*` variables.
pub fn install(service_name: &str) -> Result<()> {
    init_telemetry(TelemetryConfig::from_env(
        service_name,
        env!("CARGO_PKG_VERSION"),
    ))
}
