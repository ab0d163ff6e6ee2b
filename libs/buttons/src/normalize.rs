use serde::Serialize;
use serde_json::Value;

use crate::types::{AuthoringButton, NativeFlowButton, QUICK_REPLY};

#[derive(Serialize)]
struct QuickReplyParams<'a> {
    display_text: &'a str,
    id: &'a str,
}

/// Rewrites every recognised authoring shape into a native flow button.
///
/// Canonical buttons and unknown shapes come back unchanged; the output always has the same
/// length as the input.
///
/// ```
/// use gsm_buttons::{AuthoringButton, normalize_buttons};
///
/// let out = normalize_buttons(&[AuthoringButton::quick_reply("q1", "Yes")]);
/// match &out[0] {
///     AuthoringButton::NativeFlow(button) => {
///         assert_eq!(button.name, "quick_reply");
///         assert_eq!(button.button_params_json, r#"{"display_text":"Yes","id":"q1"}"#);
///     }
///     other => panic!("unexpected {other:?}"),
/// }
/// ```
pub fn normalize_buttons(buttons: &[AuthoringButton]) -> Vec<AuthoringButton> {
    buttons
        .iter()
        .enumerate()
        .map(|(index, button)| normalize_button(index, button))
        .collect()
}

/// Normalizes the button at zero-based `index`; generated labels and ids are one-based.
pub fn normalize_button(index: usize, button: &AuthoringButton) -> AuthoringButton {
    let position = index + 1;
    match button {
        AuthoringButton::NativeFlow(_) | AuthoringButton::Opaque(_) => button.clone(),
        AuthoringButton::Simple {
            id,
            text,
            display_text,
        } => {
            let label = text
                .clone()
                .or_else(|| display_text.clone())
                .unwrap_or_else(|| format!("Button {position}"));
            let id = id.clone().unwrap_or_else(|| format!("quick_{position}"));
            AuthoringButton::NativeFlow(quick_reply_button(&label, &id))
        }
        AuthoringButton::Legacy {
            button_id,
            display_text,
        } => AuthoringButton::NativeFlow(quick_reply_button(display_text, button_id)),
    }
}

/// Normalizes a raw JSON button list. Non-object entries are kept as they are.
pub fn normalize_button_values(buttons: &[Value]) -> Vec<Value> {
    buttons
        .iter()
        .enumerate()
        .map(|(index, value)| match AuthoringButton::from_value(value) {
            Some(button) => normalize_button(index, &button).to_value(),
            None => value.clone(),
        })
        .collect()
}

pub(crate) fn quick_reply_button(display_text: &str, id: &str) -> NativeFlowButton {
    let params = QuickReplyParams { display_text, id };
    let encoded = serde_json::to_string(&params).unwrap_or_else(|_| "{}".into());
    NativeFlowButton::new(QUICK_REPLY, encoded)
}
