use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::normalize::normalize_button;
use crate::types::{AuthoringButton, INTERACTIVE_BUTTONS_KEY, QUICK_REPLY};

/// Keys that only exist at authoring time and must not reach the wire.
const AUTHORING_KEYS: [&str; 5] = [INTERACTIVE_BUTTONS_KEY, "title", "subtitle", "text", "footer"];

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InteractiveMessage {
    native_flow_message: NativeFlowMessage,
    #[serde(skip_serializing_if = "Option::is_none")]
    header: Option<Header>,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<TextPart>,
    #[serde(skip_serializing_if = "Option::is_none")]
    footer: Option<TextPart>,
}

#[derive(Serialize)]
struct NativeFlowMessage {
    buttons: Vec<Value>,
}

#[derive(Serialize)]
struct Header {
    title: String,
}

#[derive(Serialize)]
struct TextPart {
    text: String,
}

/// Maps authoring content into the canonical `interactiveMessage` structure.
///
/// Content without `interactiveButtons` is returned unchanged so already-canonical messages can
/// be passed straight through. Keys other than the authoring ones are preserved. String
/// `buttonParamsJson` values are copied verbatim; structured ones are JSON-encoded.
pub fn convert_content(content: &Value) -> Value {
    let Some(obj) = content.as_object() else {
        return content.clone();
    };
    let buttons = match obj.get(INTERACTIVE_BUTTONS_KEY).and_then(Value::as_array) {
        Some(buttons) if !buttons.is_empty() => buttons,
        _ => return content.clone(),
    };

    let header = string_field(obj, "title")
        .or_else(|| string_field(obj, "subtitle"))
        .map(|title| Header { title });
    let message = InteractiveMessage {
        native_flow_message: NativeFlowMessage {
            buttons: buttons
                .iter()
                .enumerate()
                .map(|(index, button)| wire_button(index, button))
                .collect(),
        },
        header,
        body: string_field(obj, "text").map(|text| TextPart { text }),
        footer: string_field(obj, "footer").map(|text| TextPart { text }),
    };

    let mut converted: Map<String, Value> = obj
        .iter()
        .filter(|(key, _)| !AUTHORING_KEYS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    converted.insert(
        "interactiveMessage".into(),
        serde_json::to_value(message).unwrap_or(Value::Null),
    );
    Value::Object(converted)
}

fn wire_button(index: usize, button: &Value) -> Value {
    let Some(button) = AuthoringButton::from_value(button) else {
        return json!({ "name": QUICK_REPLY });
    };
    match normalize_button(index, &button) {
        AuthoringButton::NativeFlow(native) => json!({
            "name": native.name,
            "buttonParamsJson": native.button_params_json,
        }),
        AuthoringButton::Opaque(obj) => {
            let name = obj
                .get("name")
                .and_then(Value::as_str)
                .filter(|name| !name.is_empty())
                .unwrap_or(QUICK_REPLY);
            let mut wire = Map::new();
            wire.insert("name".into(), Value::String(name.to_string()));
            match obj.get("buttonParamsJson") {
                None | Some(Value::Null) => {}
                Some(Value::String(raw)) => {
                    wire.insert("buttonParamsJson".into(), Value::String(raw.clone()));
                }
                // the wire only carries encoded params
                Some(other) => {
                    wire.insert("buttonParamsJson".into(), Value::String(other.to_string()));
                }
            }
            Value::Object(wire)
        }
        other @ (AuthoringButton::Simple { .. } | AuthoringButton::Legacy { .. }) => {
            // normalize_button never leaves these shapes behind
            other.to_value()
        }
    }
}

fn string_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_interactive_message() {
        let content = json!({
            "text": "Pick one",
            "footer": "Thanks",
            "title": "Menu",
            "mentions": ["123@s.whatsapp.net"],
            "interactiveButtons": [
                {"name": "cta_url", "buttonParamsJson": "{\"display_text\":\"Open\",\"url\":\"https://x\"}"}
            ]
        });
        let converted = convert_content(&content);
        assert_eq!(
            converted,
            json!({
                "mentions": ["123@s.whatsapp.net"],
                "interactiveMessage": {
                    "nativeFlowMessage": {
                        "buttons": [
                            {"name": "cta_url", "buttonParamsJson": "{\"display_text\":\"Open\",\"url\":\"https://x\"}"}
                        ]
                    },
                    "header": {"title": "Menu"},
                    "body": {"text": "Pick one"},
                    "footer": {"text": "Thanks"}
                }
            })
        );
    }

    #[test]
    fn subtitle_fills_header_when_title_missing() {
        let converted = convert_content(&json!({
            "subtitle": "Sub",
            "interactiveButtons": [{"id": "a", "text": "A"}]
        }));
        let message = &converted["interactiveMessage"];
        assert_eq!(message["header"], json!({"title": "Sub"}));
        assert!(message.get("body").is_none());
        assert!(message.get("footer").is_none());
    }

    #[test]
    fn legacy_buttons_are_normalized_on_the_way() {
        let converted = convert_content(&json!({
            "text": "t",
            "interactiveButtons": [{"id": "q1", "text": "Yes"}]
        }));
        assert_eq!(
            converted["interactiveMessage"]["nativeFlowMessage"]["buttons"][0],
            json!({"name": "quick_reply", "buttonParamsJson": "{\"display_text\":\"Yes\",\"id\":\"q1\"}"})
        );
    }

    #[test]
    fn opaque_buttons_default_name_and_encode_params() {
        let converted = convert_content(&json!({
            "interactiveButtons": [
                {"buttonParamsJson": {"raw": true}},
                {"label": "x"},
                {"name": "galaxy_message", "buttonParamsJson": ""}
            ]
        }));
        let buttons = &converted["interactiveMessage"]["nativeFlowMessage"]["buttons"];
        assert_eq!(
            buttons[0],
            json!({"name": "quick_reply", "buttonParamsJson": "{\"raw\":true}"})
        );
        assert_eq!(buttons[1], json!({"name": "quick_reply"}));
        assert_eq!(
            buttons[2],
            json!({"name": "galaxy_message", "buttonParamsJson": ""})
        );
    }

    #[test]
    fn content_without_buttons_is_identity() {
        let plain = json!({"text": "hello"});
        assert_eq!(convert_content(&plain), plain);

        let empty = json!({"text": "hello", "interactiveButtons": []});
        assert_eq!(convert_content(&empty), empty);

        let canonical = json!({"buttonsMessage": {"contentText": "x"}});
        assert_eq!(convert_content(&canonical), canonical);
    }
}
