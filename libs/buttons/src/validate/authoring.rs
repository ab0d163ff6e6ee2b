use serde_json::Value;

use super::ValidationReport;
use crate::types::{AuthoringButton, QUICK_REPLY};

/// Above this many buttons the receiving client is likely to truncate; reported as a warning.
pub const SOFT_BUTTON_LIMIT: usize = 25;

#[derive(Debug, Clone, PartialEq)]
pub struct AuthoringCheck {
    pub report: ValidationReport,
    /// The input list with fix-ups applied.
    pub cleaned: Vec<Value>,
}

/// Permissive pre-check of raw authoring buttons.
///
/// Only structurally unusable input is an error. Unknown shapes are passed through with a
/// warning so new button kinds keep working without a release.
pub fn validate_authoring_buttons(buttons: Option<&Value>) -> AuthoringCheck {
    let mut report = ValidationReport::default();
    let entries = match buttons {
        None | Some(Value::Null) => {
            return AuthoringCheck {
                report,
                cleaned: Vec::new(),
            };
        }
        Some(Value::Array(entries)) => entries,
        Some(_) => {
            report.error("buttons must be an array");
            return AuthoringCheck {
                report,
                cleaned: Vec::new(),
            };
        }
    };

    if entries.is_empty() {
        report.warn("buttons array is empty; the message will render without buttons");
    }
    if entries.len() > SOFT_BUTTON_LIMIT {
        report.warn(format!(
            "{} buttons exceeds the soft limit of {SOFT_BUTTON_LIMIT}; clients may truncate",
            entries.len()
        ));
    }

    let cleaned = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| check_entry(index, entry, &mut report))
        .collect();

    AuthoringCheck { report, cleaned }
}

fn check_entry(index: usize, entry: &Value, report: &mut ValidationReport) -> Value {
    let Some(button) = AuthoringButton::from_value(entry) else {
        report.error(format!("button[{index}] must be an object"));
        return entry.clone();
    };

    match button {
        AuthoringButton::NativeFlow(native) => {
            if let Err(err) = serde_json::from_str::<Value>(&native.button_params_json) {
                report.error(format!(
                    "button[{index}] ({}) buttonParamsJson is not valid JSON: {err}",
                    native.name
                ));
            }
            entry.clone()
        }
        AuthoringButton::Simple { .. } | AuthoringButton::Legacy { .. } => entry.clone(),
        AuthoringButton::Opaque(mut obj) => {
            let Some(params) = obj.get("buttonParamsJson").cloned() else {
                report.warn(format!(
                    "button[{index}] has an unrecognised shape; passing it through unchanged"
                ));
                return Value::Object(obj);
            };

            if let Some(raw) = params.as_str() {
                if let Some(name) = obj.get("name").and_then(Value::as_str) {
                    if let Err(err) = serde_json::from_str::<Value>(raw) {
                        report.error(format!(
                            "button[{index}] ({name}) buttonParamsJson is not valid JSON: {err}"
                        ));
                    }
                }
            } else {
                match serde_json::to_string(&params) {
                    Ok(encoded) => {
                        report.warn(format!(
                            "button[{index}] buttonParamsJson was not a string; re-encoded as JSON"
                        ));
                        obj.insert("buttonParamsJson".into(), Value::String(encoded));
                    }
                    Err(err) => {
                        report.error(format!(
                            "button[{index}] buttonParamsJson could not be encoded: {err}"
                        ));
                    }
                }
            }

            let has_name = obj
                .get("name")
                .and_then(Value::as_str)
                .is_some_and(|name| !name.is_empty());
            if !has_name {
                report.warn(format!(
                    "button[{index}] has no name; defaulting to {QUICK_REPLY}"
                ));
                obj.insert("name".into(), Value::String(QUICK_REPLY.into()));
            }

            Value::Object(obj)
        }
    }
}
