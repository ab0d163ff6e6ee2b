use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Component, Path, PathBuf};

mod assertions;
mod recording;

pub use assertions::{assert_node_path, find_node, message_contains_text};
pub use recording::{DEFAULT_SENDER, RecordedDelivery, RecordingTelemetry, RecordingTransport};

fn workspace_root() -> Result<PathBuf> {
    // workspace root is two levels up from this crate's manifest (libs/testutil)
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .map(Path::to_path_buf)
        .ok_or_else(|| anyhow!("workspace root not found"))
}

/// Loads a JSON or YAML fixture addressed relative to the workspace root.
pub fn load_fixture_value(path: &str) -> Result<Value> {
    let absolute = absolute_path(path)?;
    let content = fs::read_to_string(&absolute)
        .with_context(|| format!("failed to read {}", absolute.display()))?;
    let extension = absolute
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    match extension.as_str() {
        "json" => serde_json::from_str(&content)
            .with_context(|| format!("failed to parse json {}", absolute.display())),
        "yaml" | "yml" => {
            let yaml: serde_yaml_bw::Value = serde_yaml_bw::from_str(&content)
                .with_context(|| format!("failed to parse yaml {}", absolute.display()))?;
            serde_json::to_value(yaml)
                .with_context(|| format!("failed to convert yaml {}", absolute.display()))
        }
        other => Err(anyhow!("unsupported fixture extension: {other}")),
    }
}

fn absolute_path<P>(path: P) -> Result<PathBuf>
where
    P: AsRef<Path>,
{
    let root = workspace_root()?;
    let relative = path.as_ref();
    if relative.is_absolute() {
        anyhow::bail!("fixture paths must be relative: {}", relative.display());
    }
    if relative
        .components()
        .any(|component| !matches!(component, Component::Normal(_) | Component::CurDir))
    {
        anyhow::bail!(
            "fixture path escapes workspace root ({}): {}",
            root.display(),
            relative.display()
        );
    }
    Ok(root.join(relative))
}

pub fn to_json_value<T>(value: &T) -> Result<Value>
where
    T: Serialize,
{
    serde_json::to_value(value).context("failed to convert to json value")
}

#[macro_export]
macro_rules! load_fixture {
    ($path:expr $(,)?) => {{
        $crate::load_fixture_value($path)
            .unwrap_or_else(|err| panic!("failed to load fixture {}: {}", $path, err))
    }};
}

#[macro_export]
macro_rules! assert_snapshot_json {
    ($name:expr, $value:expr $(,)?) => {{
        let snapshot_value = $crate::to_json_value(&$value)
            .unwrap_or_else(|err| panic!("failed to serialise snapshot {}: {}", $name, err));
        insta::assert_json_snapshot!($name, snapshot_value);
    }};
}
