use std::sync::OnceLock;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::layer::Layer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::TelemetryConfig;

static INIT: OnceLock<()> = OnceLock::new();

/// Installs the global subscriber once; later calls are no-ops.
///
/// Logs go to stderr so command output on stdout stays machine readable.
pub fn init_telemetry(cfg: TelemetryConfig) -> Result<()> {
    if INIT.get().is_some() {
        return Ok(());
    }

    let fmt_layer = if cfg.json_logs {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .boxed()
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cfg.default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .ok();

    INIT.set(()).ok();
    info!(
        service = %cfg.service_name,
        version = %cfg.service_version,
        environment = %cfg.environment,
        "telemetry initialised"
    );
    Ok(())
}
