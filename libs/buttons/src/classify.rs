use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The interactive category of a canonical message body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonType {
    List,
    Buttons,
    NativeFlow,
}

impl ButtonType {
    pub fn as_str(self) -> &'static str {
        match self {
            ButtonType::List => "list",
            ButtonType::Buttons => "buttons",
            ButtonType::NativeFlow => "native_flow",
        }
    }
}

impl fmt::Display for ButtonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Borrowed view over the interactive part of a canonical body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InteractiveBody<'a> {
    List(&'a Value),
    Buttons(&'a Value),
    NativeFlow { buttons: &'a [Value] },
}

impl<'a> InteractiveBody<'a> {
    /// `listMessage` wins over `buttonsMessage`, which wins over `interactiveMessage`.
    pub fn parse(body: &'a Value) -> Option<Self> {
        let obj = body.as_object()?;
        let present = move |key: &str| obj.get(key).filter(|value| !value.is_null());

        if let Some(list) = present("listMessage") {
            return Some(InteractiveBody::List(list));
        }
        if let Some(buttons) = present("buttonsMessage") {
            return Some(InteractiveBody::Buttons(buttons));
        }
        let native_flow = present("interactiveMessage")?
            .get("nativeFlowMessage")
            .filter(|value| !value.is_null())?;
        let buttons = native_flow
            .get("buttons")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        Some(InteractiveBody::NativeFlow { buttons })
    }

    pub fn button_type(&self) -> ButtonType {
        match self {
            InteractiveBody::List(_) => ButtonType::List,
            InteractiveBody::Buttons(_) => ButtonType::Buttons,
            InteractiveBody::NativeFlow { .. } => ButtonType::NativeFlow,
        }
    }

    /// Name of the first native flow button, if any.
    pub fn first_button_name(&self) -> Option<&'a str> {
        match *self {
            InteractiveBody::NativeFlow { buttons } => {
                buttons.first()?.get("name").and_then(Value::as_str)
            }
            InteractiveBody::List(_) | InteractiveBody::Buttons(_) => None,
        }
    }
}

/// Returns the interactive category of a canonical body, or `None` for plain messages.
///
/// ```
/// use gsm_buttons::{ButtonType, classify_button_type};
/// use serde_json::json;
///
/// let body = json!({"interactiveMessage": {"nativeFlowMessage": {"buttons": []}}});
/// assert_eq!(classify_button_type(&body), Some(ButtonType::NativeFlow));
/// assert_eq!(classify_button_type(&json!({"conversation": "hi"})), None);
/// ```
pub fn classify_button_type(body: &Value) -> Option<ButtonType> {
    InteractiveBody::parse(body).map(|view| view.button_type())
}
