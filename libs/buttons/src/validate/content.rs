use serde_json::{Map, Value};

use super::ValidationReport;
use crate::types::QUICK_REPLY;

#[derive(Debug, Clone, PartialEq)]
pub struct ContentCheck {
    pub report: ValidationReport,
    /// The content with defaults filled in; identical to the input when nothing was missing.
    pub content: Value,
}

/// Final pass on converted content, run immediately before the envelope is built.
///
/// Plain messages pass untouched. For `interactiveMessage` only a missing `nativeFlowMessage`,
/// a non-sequence `buttons`, or a non-string `buttonParamsJson` is fatal.
pub fn validate_converted_content(content: &Value) -> ContentCheck {
    let mut report = ValidationReport::default();
    let mut content = content.clone();

    let Some(message) = content
        .as_object_mut()
        .and_then(|obj| obj.get_mut("interactiveMessage"))
        .filter(|message| !message.is_null())
    else {
        return ContentCheck { report, content };
    };

    let Some(native_flow) = message
        .get_mut("nativeFlowMessage")
        .and_then(Value::as_object_mut)
    else {
        report.error("interactiveMessage is missing nativeFlowMessage");
        return ContentCheck { report, content };
    };

    let Some(buttons) = native_flow.get_mut("buttons").and_then(Value::as_array_mut) else {
        report.error("nativeFlowMessage.buttons must be an array");
        return ContentCheck { report, content };
    };

    if buttons.is_empty() {
        report.warn("nativeFlowMessage.buttons is empty");
    }

    for (index, button) in buttons.iter_mut().enumerate() {
        match button.as_object_mut() {
            Some(obj) => check_button(index, obj, &mut report),
            None => report.warn(format!("buttons[{index}] is not an object; passing it through")),
        }
    }

    ContentCheck { report, content }
}

fn check_button(index: usize, button: &mut Map<String, Value>, report: &mut ValidationReport) {
    match button.get("buttonParamsJson") {
        None | Some(Value::Null) => report.warn(format!(
            "buttons[{index}] has no buttonParamsJson; it will likely not render"
        )),
        Some(Value::String(raw)) => {
            if serde_json::from_str::<Value>(raw).is_err() {
                report.warn(format!("buttons[{index}] buttonParamsJson is not valid JSON"));
            }
        }
        Some(_) => report.error(format!(
            "buttons[{index}] buttonParamsJson must be a string"
        )),
    }

    let named = button
        .get("name")
        .and_then(Value::as_str)
        .is_some_and(|name| !name.is_empty());
    if !named {
        report.warn(format!(
            "buttons[{index}] has no name; defaulting to {QUICK_REPLY}"
        ));
        button.insert("name".into(), Value::String(QUICK_REPLY.into()));
    }
}
