//! Convenience entry points layered on [`Dispatcher::send_interactive_message`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::{info, warn};

use crate::dispatch::{Dispatcher, SendOptions};
use crate::error::{PreconditionError, SendError};
use crate::normalize::normalize_button_values;
use crate::telemetry::DispatchEvent;
use crate::transport::Envelope;
use crate::types::{AuthoringButton, INTERACTIVE_BUTTONS_KEY, text_field};
use crate::validate::{
    EntryPoint, ValidationReport, example_payload, validate_authoring_buttons,
    validate_basic_payload,
};

const TEMPLATE_CONTEXT: &str = "sendTemplateButtons";
const CARDS_CONTEXT: &str = "sendCards";

/// A reply button inside a `buttonsMessage`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateButton {
    pub button_id: String,
    pub button_text: ButtonText,
    #[serde(rename = "type")]
    pub kind: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonText {
    pub display_text: String,
}

impl TemplateButton {
    pub fn new(button_id: impl Into<String>, display_text: impl Into<String>) -> Self {
        Self {
            button_id: button_id.into(),
            button_text: ButtonText {
                display_text: display_text.into(),
            },
            kind: 1,
        }
    }

    /// Maps any authoring shape to a reply button; missing parts fall back to one-based defaults.
    pub fn from_authoring(index: usize, value: &Value) -> Self {
        let position = index + 1;
        let (id, label) = match AuthoringButton::from_value(value) {
            Some(AuthoringButton::Legacy {
                button_id,
                display_text,
            }) => (Some(button_id), Some(display_text)),
            Some(AuthoringButton::Simple {
                id,
                text,
                display_text,
            }) => (id, text.or(display_text)),
            Some(AuthoringButton::NativeFlow(button)) => match button.params() {
                Some(Value::Object(params)) => (
                    text_field(&params, "id"),
                    text_field(&params, "display_text"),
                ),
                _ => (None, None),
            },
            Some(AuthoringButton::Opaque(_)) | None => (None, None),
        };
        Self::new(
            id.unwrap_or_else(|| format!("btn_{position}")),
            label.unwrap_or_else(|| format!("Button {position}")),
        )
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ButtonsMessage {
    content_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    footer_text: Option<String>,
    buttons: Vec<TemplateButton>,
    header_type: u8,
}

/// Input of [`Dispatcher::send_cards`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CardsPayload {
    pub text: Option<String>,
    pub footer: Option<String>,
    pub cards: Vec<Value>,
    pub header_image_url: Option<String>,
    pub header_video_url: Option<String>,
    pub header_image: Option<Value>,
    pub header_video: Option<Value>,
    pub media_caption: Option<String>,
}

impl CardsPayload {
    /// Header media to send ahead of the cards. Images take priority over videos.
    pub fn header_media(&self) -> Option<(&'static str, Value)> {
        let image = media_source(self.header_image_url.as_deref(), self.header_image.as_ref());
        if let Some(image) = image {
            return Some(("image", image));
        }
        media_source(self.header_video_url.as_deref(), self.header_video.as_ref())
            .map(|video| ("video", video))
    }

    /// One reply button per card: `id ?? card_{n}` labelled `title ?? body ?? Card {n}`.
    pub fn buttons(&self) -> Vec<TemplateButton> {
        self.cards
            .iter()
            .enumerate()
            .map(|(index, card)| {
                let position = index + 1;
                let card = card.as_object();
                let id = card.and_then(|card| text_field(card, "id"));
                let label = card.and_then(|card| {
                    text_field(card, "title").or_else(|| text_field(card, "body"))
                });
                TemplateButton::new(
                    id.unwrap_or_else(|| format!("card_{position}")),
                    label.unwrap_or_else(|| format!("Card {position}")),
                )
            })
            .collect()
    }
}

fn media_source(url: Option<&str>, media: Option<&Value>) -> Option<Value> {
    if let Some(url) = url.filter(|url| !url.trim().is_empty()) {
        return Some(json!({ "url": url }));
    }
    match media? {
        Value::Null => None,
        Value::String(url) if url.trim().is_empty() => None,
        Value::String(url) => Some(json!({ "url": url })),
        other => Some(other.clone()),
    }
}

fn buttons_message(text: String, footer: Option<String>, buttons: Vec<TemplateButton>) -> Value {
    let message = ButtonsMessage {
        content_text: text,
        footer_text: footer,
        buttons,
        header_type: 1,
    };
    json!({ "buttonsMessage": message })
}

impl Dispatcher {
    /// Sends `{ text, footer?, title?, subtitle?, buttons }` restricted to the basic button set.
    pub async fn send_basic_buttons(
        &self,
        destination: &str,
        payload: &Value,
        options: SendOptions,
    ) -> Result<Envelope, SendError> {
        let entry = EntryPoint::BasicButtons;
        let mut report = validate_basic_payload(payload);
        let authoring = validate_authoring_buttons(payload.get(entry.buttons_key()));
        report.merge(authoring.report);
        self.check(entry.context(), report)
            .map_err(|err| err.with_example(example_payload(entry)))?;

        let mut content: Map<String, Value> = payload.as_object().cloned().unwrap_or_default();
        content.remove(entry.buttons_key());
        content.insert(
            INTERACTIVE_BUTTONS_KEY.into(),
            Value::Array(normalize_button_values(&authoring.cleaned)),
        );
        self.send_interactive_message(destination, &Value::Object(content), options)
            .await
    }

    /// Sends `{ text, footer?, buttons }` as a legacy `buttonsMessage`.
    pub async fn send_template_buttons(
        &self,
        destination: &str,
        payload: &Value,
        options: SendOptions,
    ) -> Result<Envelope, SendError> {
        let buttons = match payload.get("buttons").and_then(Value::as_array) {
            Some(buttons) if !buttons.is_empty() => buttons,
            _ => {
                return Err(self.reject(TEMPLATE_CONTEXT, "buttons must be a non-empty array"));
            }
        };
        let buttons = buttons
            .iter()
            .enumerate()
            .map(|(index, button)| TemplateButton::from_authoring(index, button))
            .collect();
        let text = payload
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let footer = payload
            .get("footer")
            .and_then(Value::as_str)
            .map(str::to_string);

        let content = buttons_message(text, footer, buttons);
        self.send_interactive_message(destination, &content, options)
            .await
    }

    /// Sends a card list as reply buttons, preceded by optional header media.
    ///
    /// A failed media send is logged and the cards go out without it.
    pub async fn send_cards(
        &self,
        destination: &str,
        payload: &Value,
        options: SendOptions,
    ) -> Result<Envelope, SendError> {
        if destination.trim().is_empty() {
            return Err(PreconditionError::EmptyDestination.into());
        }
        let payload: CardsPayload = serde_json::from_value(payload.clone())
            .map_err(|err| self.reject(CARDS_CONTEXT, format!("invalid cards payload: {err}")))?;
        if payload.cards.is_empty() {
            return Err(self.reject(CARDS_CONTEXT, "cards must be a non-empty array"));
        }

        let mut caption_used = false;
        if let Some((kind, media)) = payload.header_media() {
            let mut content = Map::new();
            content.insert(kind.into(), media);
            if let Some(caption) = &payload.media_caption {
                content.insert("caption".into(), Value::String(caption.clone()));
            }
            match self
                .transport()
                .send_plain(destination, Value::Object(content))
                .await
            {
                Ok(envelope) => {
                    info!(target: "gsm.buttons.cards", kind, msg_id = %envelope.key.id, "header media sent");
                    caption_used = payload.media_caption.is_some();
                }
                Err(err) => {
                    warn!(target: "gsm.buttons.cards", kind, error = %err, "header media send failed; continuing without it");
                    self.telemetry().emit(DispatchEvent::HeaderMediaFailed {
                        destination: destination.to_string(),
                        error: err.to_string(),
                    });
                }
            }
        }

        let text = if caption_used {
            String::new()
        } else {
            payload.text.clone().unwrap_or_default()
        };
        let content = buttons_message(text, payload.footer.clone(), payload.buttons());
        self.send_interactive_message(destination, &content, options)
            .await
    }

    fn reject(&self, context: &str, error: impl Into<String>) -> SendError {
        let mut report = ValidationReport::default();
        report.error(error);
        self.fail(context, report).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_buttons_from_every_shape() {
        let shapes = [
            json!({"buttonId": "b1", "buttonText": {"displayText": "One"}}),
            json!({"id": "s2", "text": "Two"}),
            json!({"displayText": "Three", "id": "s3"}),
            json!({"name": "quick_reply", "buttonParamsJson": "{\"display_text\":\"Four\",\"id\":\"n4\"}"}),
            json!({"label": "mystery"}),
            json!("not an object"),
        ];
        let mapped: Vec<TemplateButton> = shapes
            .iter()
            .enumerate()
            .map(|(index, shape)| TemplateButton::from_authoring(index, shape))
            .collect();

        assert_eq!(mapped[0], TemplateButton::new("b1", "One"));
        assert_eq!(mapped[1], TemplateButton::new("s2", "Two"));
        assert_eq!(mapped[2], TemplateButton::new("s3", "Three"));
        assert_eq!(mapped[3], TemplateButton::new("n4", "Four"));
        assert_eq!(mapped[4], TemplateButton::new("btn_5", "Button 5"));
        assert_eq!(mapped[5], TemplateButton::new("btn_6", "Button 6"));
    }

    #[test]
    fn template_button_wire_shape() {
        let value = serde_json::to_value(TemplateButton::new("b1", "One")).unwrap();
        assert_eq!(
            value,
            json!({"buttonId": "b1", "buttonText": {"displayText": "One"}, "type": 1})
        );
    }

    #[test]
    fn cards_map_to_buttons_with_fallbacks() {
        let payload: CardsPayload = serde_json::from_value(json!({
            "cards": [
                {"id": "c1", "title": "First"},
                {"body": "Second body"},
                {},
                7
            ]
        }))
        .unwrap();
        assert_eq!(
            payload.buttons(),
            vec![
                TemplateButton::new("c1", "First"),
                TemplateButton::new("card_2", "Second body"),
                TemplateButton::new("card_3", "Card 3"),
                TemplateButton::new("card_4", "Card 4"),
            ]
        );
    }

    #[test]
    fn image_takes_priority_over_video() {
        let payload: CardsPayload = serde_json::from_value(json!({
            "cards": [{}],
            "headerVideoUrl": "https://x/v.mp4",
            "headerImage": {"url": "https://x/i.png", "mimetype": "image/png"}
        }))
        .unwrap();
        let (kind, media) = payload.header_media().unwrap();
        assert_eq!(kind, "image");
        assert_eq!(media["mimetype"], json!("image/png"));

        let payload: CardsPayload =
            serde_json::from_value(json!({"cards": [{}], "headerVideo": "https://x/v.mp4"}))
                .unwrap();
        assert_eq!(
            payload.header_media(),
            Some(("video", json!({"url": "https://x/v.mp4"})))
        );

        let payload: CardsPayload =
            serde_json::from_value(json!({"cards": [{}], "headerImageUrl": "  "})).unwrap();
        assert_eq!(payload.header_media(), None);
    }

    #[test]
    fn buttons_message_omits_missing_footer() {
        let value = buttons_message("Hi".into(), None, vec![TemplateButton::new("a", "A")]);
        assert_eq!(
            value,
            json!({"buttonsMessage": {
                "contentText": "Hi",
                "buttons": [{"buttonId": "a", "buttonText": {"displayText": "A"}, "type": 1}],
                "headerType": 1
            }})
        );
    }
}
