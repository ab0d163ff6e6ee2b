use std::env;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    pub service_name: String,
    pub service_version: String,
    pub environment: String,
    pub json_logs: bool,
    /// Filter used when `RUST_LOG` is unset.
    pub default_filter: String,
}

impl TelemetryConfig {
    pub fn from_env(default_service_name: &str, default_service_version: &str) -> Self {
        Self::from_lookup(
            |key| env::var(key).ok(),
            default_service_name,
            default_service_version,
        )
    }

    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        default_service_name: &str,
        default_service_version: &str,
    ) -> Self {
        let service_name = lookup("OTEL_SERVICE_NAME")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| default_service_name.to_string());
        let service_version = lookup("OTEL_SERVICE_VERSION")
            .unwrap_or_else(|| default_service_version.to_string());
        let environment = lookup("OTEL_RESOURCE_ATTRIBUTES")
            .and_then(parse_environment_from_resource)
            .or_else(|| lookup("DEPLOYMENT_ENV"))
            .unwrap_or_else(|| "dev".into());
        let json_logs = lookup("LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        Self {
            service_name,
            service_version,
            environment,
            json_logs,
            default_filter: "info".into(),
        }
    }
}

fn parse_environment_from_resource(value: String) -> Option<String> {
    for kv in value.split(',') {
        let mut parts = kv.splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == "deployment.environment" {
            return Some(val.to_string());
        }
    }
    None
}
