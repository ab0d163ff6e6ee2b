use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value, json};

/// Button name used when an authoring shape does not carry one.
pub const QUICK_REPLY: &str = "quick_reply";

/// Authoring key holding the button list on interactive content.
pub const INTERACTIVE_BUTTONS_KEY: &str = "interactiveButtons";

/// A native flow button as it travels on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeFlowButton {
    pub name: String,
    pub button_params_json: String,
}

impl NativeFlowButton {
    pub fn new(name: impl Into<String>, button_params_json: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            button_params_json: button_params_json.into(),
        }
    }

    /// Parsed `buttonParamsJson`, when it is valid JSON.
    pub fn params(&self) -> Option<Value> {
        serde_json::from_str(&self.button_params_json).ok()
    }
}

/// The authoring-time shapes a button may arrive in.
///
/// Shapes are recognised once, by [`AuthoringButton::from_value`], and every consumer matches on
/// the variant instead of probing keys again.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthoringButton {
    /// `{ name, buttonParamsJson }` with both present.
    NativeFlow(NativeFlowButton),
    /// `{ id?, text?, displayText? }`.
    Simple {
        id: Option<String>,
        text: Option<String>,
        display_text: Option<String>,
    },
    /// `{ buttonId, buttonText: { displayText } }`.
    Legacy {
        button_id: String,
        display_text: String,
    },
    /// Anything else; forwarded as-is.
    Opaque(Map<String, Value>),
}

impl AuthoringButton {
    /// Recognises the authoring shape of a JSON value. Returns `None` for non-objects.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;

        let name = text_field(obj, "name");
        let params = obj
            .get("buttonParamsJson")
            .and_then(Value::as_str)
            .filter(|raw| !raw.is_empty());
        if let (Some(name), Some(params)) = (name, params) {
            return Some(AuthoringButton::NativeFlow(NativeFlowButton::new(
                name, params,
            )));
        }

        let id = text_field(obj, "id");
        let text = text_field(obj, "text");
        if id.is_some() || text.is_some() {
            return Some(AuthoringButton::Simple {
                id,
                text,
                display_text: text_field(obj, "displayText"),
            });
        }

        let button_id = text_field(obj, "buttonId");
        let display_text = obj
            .get("buttonText")
            .and_then(Value::as_object)
            .and_then(|button_text| text_field(button_text, "displayText"));
        if let (Some(button_id), Some(display_text)) = (button_id, display_text) {
            return Some(AuthoringButton::Legacy {
                button_id,
                display_text,
            });
        }

        Some(AuthoringButton::Opaque(obj.clone()))
    }

    pub fn quick_reply(id: impl Into<String>, text: impl Into<String>) -> Self {
        AuthoringButton::Simple {
            id: Some(id.into()),
            text: Some(text.into()),
            display_text: None,
        }
    }

    /// Name of the button when the shape carries one.
    pub fn name(&self) -> Option<&str> {
        match self {
            AuthoringButton::NativeFlow(button) => Some(button.name.as_str()),
            AuthoringButton::Opaque(obj) => obj.get("name").and_then(Value::as_str),
            AuthoringButton::Simple { .. } | AuthoringButton::Legacy { .. } => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            AuthoringButton::NativeFlow(button) => json!({
                "name": button.name,
                "buttonParamsJson": button.button_params_json,
            }),
            AuthoringButton::Simple {
                id,
                text,
                display_text,
            } => {
                let mut obj = Map::new();
                if let Some(id) = id {
                    obj.insert("id".into(), Value::String(id.clone()));
                }
                if let Some(text) = text {
                    obj.insert("text".into(), Value::String(text.clone()));
                }
                if let Some(display_text) = display_text {
                    obj.insert("displayText".into(), Value::String(display_text.clone()));
                }
                Value::Object(obj)
            }
            AuthoringButton::Legacy {
                button_id,
                display_text,
            } => json!({
                "buttonId": button_id,
                "buttonText": { "displayText": display_text },
            }),
            AuthoringButton::Opaque(obj) => Value::Object(obj.clone()),
        }
    }
}

impl Serialize for AuthoringButton {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for AuthoringButton {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        AuthoringButton::from_value(&value)
            .ok_or_else(|| serde::de::Error::custom("button must be a JSON object"))
    }
}

/// Reads a non-empty textual field. Numbers are accepted and rendered as text.
pub(crate) fn text_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
