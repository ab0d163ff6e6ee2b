use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::ValidationReport;
use crate::types::INTERACTIVE_BUTTONS_KEY;

/// Names accepted by the basic-buttons entry point. The `{id, text}` shape bypasses this list.
pub const BASIC_ALLOWED_NAMES: &[&str] = &[
    "cta_url",
    "cta_copy",
    "cta_call",
    "cta_catalog",
    "send_location",
];

/// Names accepted by the full-control interactive entry point.
pub const INTERACTIVE_ALLOWED_NAMES: &[&str] = &[
    "quick_reply",
    "cta_url",
    "cta_copy",
    "cta_call",
    "cta_catalog",
    "cta_reminder",
    "cta_cancel_reminder",
    "address_message",
    "send_location",
    "open_webview",
    "mpm",
    "wa_payment_transaction_details",
    "automated_greeting_message_view_catalog",
    "galaxy_message",
    "single_select",
];

/// Fields that must be present in `buttonParamsJson`, per button name.
pub const REQUIRED_FIELDS: &[(&str, &[&str])] = &[
    ("cta_url", &["display_text", "url"]),
    ("cta_copy", &["display_text", "copy_code"]),
    ("cta_call", &["display_text", "phone_number"]),
    ("cta_catalog", &["business_phone_number"]),
    ("cta_reminder", &["display_text"]),
    ("cta_cancel_reminder", &["display_text"]),
    ("address_message", &["display_text"]),
    ("send_location", &["display_text"]),
    ("open_webview", &["title", "link"]),
    ("mpm", &["product_id"]),
    ("wa_payment_transaction_details", &["transaction_id"]),
    (
        "automated_greeting_message_view_catalog",
        &["business_phone_number", "catalog_product_id"],
    ),
    ("galaxy_message", &["flow_token", "flow_id"]),
    ("single_select", &["title", "sections"]),
    ("quick_reply", &["display_text", "id"]),
];

pub fn required_fields(name: &str) -> &'static [&'static str] {
    REQUIRED_FIELDS
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, fields)| *fields)
        .unwrap_or(&[])
}

/// The two entry points that carry raw authoring buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryPoint {
    BasicButtons,
    Interactive,
}

impl EntryPoint {
    pub fn allowed_names(self) -> &'static [&'static str] {
        match self {
            EntryPoint::BasicButtons => BASIC_ALLOWED_NAMES,
            EntryPoint::Interactive => INTERACTIVE_ALLOWED_NAMES,
        }
    }

    pub fn buttons_key(self) -> &'static str {
        match self {
            EntryPoint::BasicButtons => "buttons",
            EntryPoint::Interactive => INTERACTIVE_BUTTONS_KEY,
        }
    }

    /// Label used in error contexts and logs.
    pub fn context(self) -> &'static str {
        match self {
            EntryPoint::BasicButtons => "sendButtons",
            EntryPoint::Interactive => "sendInteractiveMessage",
        }
    }
}

/// Strict check for the basic-buttons payload `{ text, footer?, title?, subtitle?, buttons }`.
pub fn validate_basic_payload(payload: &Value) -> ValidationReport {
    validate_payload(EntryPoint::BasicButtons, payload)
}

/// Strict check for full-control content `{ text, footer?, title?, interactiveButtons, .. }`.
pub fn validate_interactive_payload(payload: &Value) -> ValidationReport {
    validate_payload(EntryPoint::Interactive, payload)
}

fn validate_payload(entry: EntryPoint, payload: &Value) -> ValidationReport {
    let mut report = ValidationReport::default();
    let Some(obj) = payload.as_object() else {
        report.error("payload must be an object");
        return report;
    };

    match obj.get("text").and_then(Value::as_str) {
        Some(text) if !text.trim().is_empty() => {}
        _ => report.error("text must be a non-empty string"),
    }
    for key in ["footer", "title", "subtitle"] {
        if let Some(value) = obj.get(key) {
            if !value.is_null() && !value.is_string() {
                report.error(format!("{key} must be a string when provided"));
            }
        }
    }

    let key = entry.buttons_key();
    match obj.get(key).and_then(Value::as_array) {
        Some(buttons) if !buttons.is_empty() => {
            for (index, button) in buttons.iter().enumerate() {
                validate_entry(entry, index, button, &mut report);
            }
        }
        _ => report.error(format!("{key} must be a non-empty array")),
    }

    report
}

fn validate_entry(entry: EntryPoint, index: usize, button: &Value, report: &mut ValidationReport) {
    let Some(obj) = button.as_object() else {
        report.error(format!("button[{index}] must be an object"));
        return;
    };

    if obj.contains_key("name") {
        validate_named_entry(entry, index, obj, report);
    } else if obj.contains_key("id") || obj.contains_key("text") {
        let id_ok = obj.get("id").is_some_and(Value::is_string);
        let text_ok = obj.get("text").is_some_and(Value::is_string);
        if !id_ok || !text_ok {
            report.error(format!(
                "button[{index}] must provide string `id` and `text` for the quick reply shape"
            ));
        }
    } else {
        report.error(format!(
            "button[{index}] must be either {{ id, text }} or {{ name, buttonParamsJson }}"
        ));
    }
}

fn validate_named_entry(
    entry: EntryPoint,
    index: usize,
    obj: &Map<String, Value>,
    report: &mut ValidationReport,
) {
    let Some(name) = obj.get("name").and_then(Value::as_str) else {
        report.error(format!("button[{index}] name must be a string"));
        return;
    };
    let allowed = entry.allowed_names();
    if !allowed.contains(&name) {
        report.error(format!(
            "button[{index}] name \"{name}\" is not allowed for {}; allowed: {}",
            entry.context(),
            allowed.join(", ")
        ));
        return;
    }

    let raw = match obj.get("buttonParamsJson") {
        Some(Value::String(raw)) => raw,
        Some(_) => {
            report.error(format!(
                "button[{index}] ({name}) buttonParamsJson must be a JSON-encoded string"
            ));
            return;
        }
        None => {
            report.error(format!("button[{index}] ({name}) is missing buttonParamsJson"));
            return;
        }
    };
    let params = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(params)) => params,
        Ok(_) => {
            report.error(format!(
                "button[{index}] ({name}) buttonParamsJson must encode an object"
            ));
            return;
        }
        Err(err) => {
            report.error(format!(
                "button[{index}] ({name}) buttonParamsJson is not valid JSON: {err}"
            ));
            return;
        }
    };

    validate_params(index, name, &params, report);
}

fn validate_params(
    index: usize,
    name: &str,
    params: &Map<String, Value>,
    report: &mut ValidationReport,
) {
    for field in required_fields(name) {
        if params.get(*field).is_none_or(Value::is_null) {
            report.error(format!(
                "button[{index}] ({name}) is missing required field \"{field}\" in buttonParamsJson"
            ));
        }
    }

    match name {
        "open_webview" => {
            if let Some(link) = params.get("link").filter(|link| !link.is_null()) {
                let has_url = link
                    .as_object()
                    .and_then(|link| link.get("url"))
                    .is_some_and(|url| !url.is_null());
                if !has_url {
                    report.error(format!(
                        "button[{index}] (open_webview) link must be an object with a url"
                    ));
                }
            }
        }
        "single_select" => {
            if let Some(sections) = params.get("sections").filter(|s| !s.is_null()) {
                let non_empty = sections.as_array().is_some_and(|s| !s.is_empty());
                if !non_empty {
                    report.error(format!(
                        "button[{index}] (single_select) sections must be a non-empty array"
                    ));
                }
            }
        }
        _ => {}
    }
}

/// A known-good payload for the entry point, attached to validation failures.
pub fn example_payload(entry: EntryPoint) -> Value {
    match entry {
        EntryPoint::BasicButtons => json!({
            "text": "Choose an option",
            "footer": "Reply below",
            "buttons": [
                { "id": "opt_1", "text": "Option 1" },
                {
                    "name": "cta_url",
                    "buttonParamsJson": "{\"display_text\":\"Open site\",\"url\":\"https://example.com\"}"
                }
            ]
        }),
        EntryPoint::Interactive => json!({
            "text": "Choose an option",
            "footer": "Reply below",
            "interactiveButtons": [
                {
                    "name": "quick_reply",
                    "buttonParamsJson": "{\"display_text\":\"Yes\",\"id\":\"yes\"}"
                },
                {
                    "name": "cta_copy",
                    "buttonParamsJson": "{\"display_text\":\"Copy code\",\"copy_code\":\"PROMO10\"}"
                }
            ]
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interactive(buttons: Value) -> Value {
        json!({ "text": "Hello", "interactiveButtons": buttons })
    }

    #[test]
    fn examples_pass_their_own_validators() {
        assert!(validate_basic_payload(&example_payload(EntryPoint::BasicButtons)).is_valid());
        assert!(
            validate_interactive_payload(&example_payload(EntryPoint::Interactive)).is_valid()
        );
    }

    #[test]
    fn every_allowed_name_has_required_fields() {
        for name in INTERACTIVE_ALLOWED_NAMES {
            assert!(!required_fields(name).is_empty(), "{name} has no entry");
        }
        assert_eq!(INTERACTIVE_ALLOWED_NAMES.len(), 15);
        for name in BASIC_ALLOWED_NAMES {
            assert!(INTERACTIVE_ALLOWED_NAMES.contains(name));
        }
    }

    #[test]
    fn basic_accepts_legacy_shape() {
        let report = validate_basic_payload(&json!({
            "text": "Pick one",
            "buttons": [{ "id": "q1", "text": "Yes" }]
        }));
        assert!(report.is_valid(), "{:?}", report.errors);
    }

    #[test]
    fn basic_rejects_quick_reply_name() {
        let report = validate_basic_payload(&json!({
            "text": "Pick one",
            "buttons": [{
                "name": "quick_reply",
                "buttonParamsJson": "{\"display_text\":\"Yes\",\"id\":\"1\"}"
            }]
        }));
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("not allowed for sendButtons"));
    }

    #[test]
    fn collects_every_defect() {
        let report = validate_basic_payload(&json!({
            "footer": 42,
            "buttons": []
        }));
        assert!(report.errors.len() >= 3, "{:?}", report.errors);

        let report = validate_basic_payload(&json!({
            "buttons": [
                { "name": "galaxy_message", "buttonParamsJson": "{}" },
                { "name": "cta_url", "buttonParamsJson": "{not json" }
            ]
        }));
        assert_eq!(report.errors.len(), 3, "{:?}", report.errors);
    }

    #[test]
    fn single_select_requires_sections() {
        let report = validate_interactive_payload(&interactive(json!([
            { "name": "single_select", "buttonParamsJson": "{\"title\":\"T\"}" }
        ])));
        assert!(!report.is_valid());
        assert!(report.errors.iter().any(|e| e.contains("sections")));

        let report = validate_interactive_payload(&interactive(json!([
            { "name": "single_select", "buttonParamsJson": "{\"title\":\"T\",\"sections\":[]}" }
        ])));
        assert!(report.errors.iter().any(|e| e.contains("non-empty array")));
    }

    #[test]
    fn open_webview_link_needs_url() {
        let report = validate_interactive_payload(&interactive(json!([
            {
                "name": "open_webview",
                "buttonParamsJson": "{\"title\":\"Docs\",\"link\":\"https://x\"}"
            }
        ])));
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("link must be an object with a url"));

        let report = validate_interactive_payload(&interactive(json!([
            {
                "name": "open_webview",
                "buttonParamsJson": "{\"title\":\"Docs\",\"link\":{\"url\":\"https://x\"}}"
            }
        ])));
        assert!(report.is_valid());
    }

    #[test]
    fn legacy_shape_requires_both_strings() {
        let report = validate_interactive_payload(&interactive(json!([{ "id": "only" }])));
        assert_eq!(report.errors.len(), 1);

        let report = validate_interactive_payload(&interactive(json!([{ "id": 1, "text": "x" }])));
        assert_eq!(report.errors.len(), 1);
    }

    #[test]
    fn rejects_non_object_payload_and_entries() {
        assert!(!validate_interactive_payload(&json!("text")).is_valid());
        let report = validate_interactive_payload(&interactive(json!(["loose", { "foo": 1 }])));
        assert_eq!(report.errors.len(), 2);
    }

    #[test]
    fn non_string_params_are_rejected() {
        let report = validate_interactive_payload(&interactive(json!([
            { "name": "cta_url", "buttonParamsJson": { "display_text": "x", "url": "y" } }
        ])));
        assert!(report.errors[0].contains("JSON-encoded string"));
    }
}
