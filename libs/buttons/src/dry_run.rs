//! An in-memory [`Transport`] that records what would have been sent.

use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::anyhow;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::debug;
use uuid::Uuid;

use crate::transport::{
    DeliveryRequest, Envelope, EnvelopeOptions, LocalEcho, MessageKey, Transport,
};

const GROUP_SUFFIX: &str = "@g.us";

/// Wrapper keys whose `message` field holds the actual body.
const WRAPPER_KEYS: [&str; 4] = [
    "ephemeralMessage",
    "viewOnceMessage",
    "viewOnceMessageV2",
    "documentWithCaptionMessage",
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DryRunConfig {
    pub sender_id: Option<String>,
    pub emit_own_events: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Delivery {
    pub destination: String,
    pub message: Value,
    pub request: DeliveryRequest,
}

#[derive(Default)]
struct DryRunEcho {
    lock: Arc<tokio::sync::Mutex<()>>,
    echoed: Mutex<Vec<Envelope>>,
}

#[async_trait::async_trait]
impl LocalEcho for DryRunEcho {
    fn event_lock(&self) -> Arc<tokio::sync::Mutex<()>> {
        self.lock.clone()
    }

    async fn echo_locally(&self, envelope: Envelope) -> anyhow::Result<()> {
        debug!(target: "gsm.buttons.echo", msg_id = %envelope.key.id, "dry-run echo");
        self.echoed
            .lock()
            .map_err(|_| anyhow!("echo log poisoned"))?
            .push(envelope);
        Ok(())
    }
}

/// Builds envelopes and records deliveries without any network access.
///
/// Destinations ending in `@g.us` are treated as groups. The builder honours two extra options:
/// `ephemeralExpiration` wraps the body in `ephemeralMessage` and `viewOnce: true` wraps it in
/// `viewOnceMessage`.
pub struct DryRunTransport {
    config: DryRunConfig,
    deliveries: Mutex<Vec<Delivery>>,
    plain_sends: Mutex<Vec<Envelope>>,
    echo: Arc<DryRunEcho>,
}

impl DryRunTransport {
    pub fn new(config: DryRunConfig) -> Self {
        Self {
            config,
            deliveries: Mutex::new(Vec::new()),
            plain_sends: Mutex::new(Vec::new()),
            echo: Arc::new(DryRunEcho::default()),
        }
    }

    pub fn deliveries(&self) -> Vec<Delivery> {
        recover(&self.deliveries).clone()
    }

    pub fn plain_sends(&self) -> Vec<Envelope> {
        recover(&self.plain_sends).clone()
    }

    pub fn echoed(&self) -> Vec<Envelope> {
        recover(&self.echo.echoed).clone()
    }
}

fn recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait::async_trait]
impl Transport for DryRunTransport {
    fn sender_id(&self) -> Option<String> {
        self.config.sender_id.clone()
    }

    fn build_envelope(
        &self,
        destination: &str,
        content: &Value,
        options: &EnvelopeOptions,
    ) -> anyhow::Result<Envelope> {
        let mut message = content.clone();
        if options
            .extra
            .get("viewOnce")
            .and_then(Value::as_bool)
            .unwrap_or(false)
        {
            message = json!({ "viewOnceMessage": { "message": message } });
        }
        if let Some(expiration) = options.extra.get("ephemeralExpiration") {
            let expiration = expiration
                .as_u64()
                .ok_or_else(|| anyhow!("ephemeralExpiration must be a positive integer"))?;
            message = json!({
                "ephemeralMessage": {
                    "message": message,
                    "contextInfo": { "expiration": expiration }
                }
            });
        }

        Ok(Envelope {
            key: MessageKey {
                remote_jid: destination.to_string(),
                from_me: true,
                id: options.message_id.clone(),
            },
            message,
            message_timestamp: options.timestamp,
        })
    }

    fn normalize_body(&self, message: &Value) -> Value {
        let mut current = message;
        loop {
            let inner = WRAPPER_KEYS.iter().find_map(|key| {
                current
                    .get(*key)
                    .and_then(|wrapper| wrapper.get("message"))
                    .filter(|inner| inner.is_object())
            });
            match inner {
                Some(inner) => current = inner,
                None => return current.clone(),
            }
        }
    }

    fn is_group(&self, destination: &str) -> bool {
        destination.ends_with(GROUP_SUFFIX)
    }

    fn generate_message_id(&self, _sender_id: &str) -> String {
        let mut id = Uuid::new_v4().simple().to_string().to_uppercase();
        id.truncate(18);
        format!("3EB0{id}")
    }

    async fn deliver(
        &self,
        destination: &str,
        message: &Value,
        request: DeliveryRequest,
    ) -> anyhow::Result<()> {
        debug!(target: "gsm.buttons.dispatch", destination, msg_id = %request.message_id, "dry-run delivery");
        self.deliveries
            .lock()
            .map_err(|_| anyhow!("delivery log poisoned"))?
            .push(Delivery {
                destination: destination.to_string(),
                message: message.clone(),
                request,
            });
        Ok(())
    }

    async fn send_plain(&self, destination: &str, content: Value) -> anyhow::Result<Envelope> {
        let sender = self.config.sender_id.clone().unwrap_or_default();
        let envelope = Envelope {
            key: MessageKey {
                remote_jid: destination.to_string(),
                from_me: true,
                id: self.generate_message_id(&sender),
            },
            message: content,
            message_timestamp: time::OffsetDateTime::now_utc().unix_timestamp(),
        };
        self.plain_sends
            .lock()
            .map_err(|_| anyhow!("send log poisoned"))?
            .push(envelope.clone());
        Ok(envelope)
    }

    fn echo_own_messages(&self) -> bool {
        self.config.emit_own_events
    }

    fn local_echo(&self) -> Option<Arc<dyn LocalEcho>> {
        Some(self.echo.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport() -> DryRunTransport {
        DryRunTransport::new(DryRunConfig {
            sender_id: Some("bot@s.whatsapp.net".into()),
            emit_own_events: false,
        })
    }

    #[test]
    fn groups_are_detected_by_suffix() {
        let transport = transport();
        assert!(transport.is_group("12345-678@g.us"));
        assert!(!transport.is_group("15550001111@s.whatsapp.net"));
    }

    #[test]
    fn message_ids_are_unique_and_prefixed() {
        let transport = transport();
        let first = transport.generate_message_id("bot");
        let second = transport.generate_message_id("bot");
        assert!(first.starts_with("3EB0"));
        assert_eq!(first.len(), 22);
        assert_ne!(first, second);
    }

    #[test]
    fn wrappers_are_applied_and_stripped() {
        let transport = transport();
        let mut options = EnvelopeOptions {
            sender_id: "bot".into(),
            message_id: "ID1".into(),
            timestamp: 42,
            extra: Default::default(),
        };
        options.extra.insert("viewOnce".into(), json!(true));
        options
            .extra
            .insert("ephemeralExpiration".into(), json!(86400));

        let body = json!({"listMessage": {"title": "x"}});
        let envelope = transport.build_envelope("1@s.whatsapp.net", &body, &options).unwrap();
        assert!(envelope.message.get("ephemeralMessage").is_some());
        assert_eq!(envelope.key.id, "ID1");
        assert_eq!(envelope.message_timestamp, 42);
        assert_eq!(transport.normalize_body(&envelope.message), body);
    }

    #[test]
    fn bad_ephemeral_expiration_is_a_builder_error() {
        let transport = transport();
        let mut options = EnvelopeOptions::default();
        options
            .extra
            .insert("ephemeralExpiration".into(), json!("soon"));
        assert!(
            transport
                .build_envelope("1@s.whatsapp.net", &json!({}), &options)
                .is_err()
        );
    }

    #[tokio::test]
    async fn records_deliveries_and_plain_sends() {
        let transport = transport();
        transport
            .deliver(
                "1@s.whatsapp.net",
                &json!({"conversation": "hi"}),
                DeliveryRequest {
                    message_id: "ID".into(),
                    ..DeliveryRequest::default()
                },
            )
            .await
            .unwrap();
        transport
            .send_plain("1@s.whatsapp.net", json!({"image": {"url": "https://x"}}))
            .await
            .unwrap();

        assert_eq!(transport.deliveries().len(), 1);
        assert_eq!(transport.deliveries()[0].request.message_id, "ID");
        assert_eq!(transport.plain_sends().len(), 1);
    }
}
