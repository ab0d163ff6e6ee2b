use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use gsm_buttons::{
    DeliveryRequest, DispatchEvent, Envelope, EnvelopeOptions, LocalEcho, MessageKey,
    TelemetryHook, Transport,
};
use serde::Serialize;
use serde_json::Value;

pub const DEFAULT_SENDER: &str = "15550000000@s.whatsapp.net";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedDelivery {
    pub destination: String,
    pub message: Value,
    pub request: DeliveryRequest,
}

#[derive(Default)]
struct RecordingEcho {
    lock: Arc<tokio::sync::Mutex<()>>,
    echoed: Mutex<Vec<Envelope>>,
}

#[async_trait::async_trait]
impl LocalEcho for RecordingEcho {
    fn event_lock(&self) -> Arc<tokio::sync::Mutex<()>> {
        self.lock.clone()
    }

    async fn echo_locally(&self, envelope: Envelope) -> anyhow::Result<()> {
        self.echoed.lock().unwrap().push(envelope);
        Ok(())
    }
}

/// Transport double that records every call.
///
/// Message ids are `MSG-1`, `MSG-2`, ... so recorded output is stable across runs.
pub struct RecordingTransport {
    sender: Option<String>,
    echo_enabled: bool,
    local_echo_available: bool,
    fail_delivery: bool,
    fail_plain_send: bool,
    next_id: AtomicUsize,
    envelope_options: Mutex<Vec<EnvelopeOptions>>,
    deliveries: Mutex<Vec<RecordedDelivery>>,
    plain_sends: Mutex<Vec<(String, Value)>>,
    echo: Arc<RecordingEcho>,
}

impl Default for RecordingTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self {
            sender: Some(DEFAULT_SENDER.to_string()),
            echo_enabled: false,
            local_echo_available: true,
            fail_delivery: false,
            fail_plain_send: false,
            next_id: AtomicUsize::new(1),
            envelope_options: Mutex::new(Vec::new()),
            deliveries: Mutex::new(Vec::new()),
            plain_sends: Mutex::new(Vec::new()),
            echo: Arc::new(RecordingEcho::default()),
        }
    }

    pub fn without_sender(mut self) -> Self {
        self.sender = None;
        self
    }

    pub fn with_echo(mut self) -> Self {
        self.echo_enabled = true;
        self
    }

    pub fn without_local_echo(mut self) -> Self {
        self.local_echo_available = false;
        self
    }

    pub fn failing_delivery(mut self) -> Self {
        self.fail_delivery = true;
        self
    }

    pub fn failing_plain_send(mut self) -> Self {
        self.fail_plain_send = true;
        self
    }

    pub fn deliveries(&self) -> Vec<RecordedDelivery> {
        self.deliveries.lock().unwrap().clone()
    }

    pub fn last_delivery(&self) -> RecordedDelivery {
        self.deliveries()
            .pop()
            .unwrap_or_else(|| panic!("no delivery was recorded"))
    }

    pub fn plain_sends(&self) -> Vec<(String, Value)> {
        self.plain_sends.lock().unwrap().clone()
    }

    pub fn envelope_options(&self) -> Vec<EnvelopeOptions> {
        self.envelope_options.lock().unwrap().clone()
    }

    pub fn echoed(&self) -> Vec<Envelope> {
        self.echo.echoed.lock().unwrap().clone()
    }

    pub fn event_lock(&self) -> Arc<tokio::sync::Mutex<()>> {
        self.echo.lock.clone()
    }

    /// Polls until at least `count` echoes were recorded or `timeout` elapses.
    pub async fn wait_for_echoes(&self, count: usize, timeout: Duration) -> Vec<Envelope> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let echoed = self.echoed();
            if echoed.len() >= count || tokio::time::Instant::now() >= deadline {
                return echoed;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    fn next_message_id(&self) -> String {
        format!("MSG-{}", self.next_id.fetch_add(1, Ordering::SeqCst))
    }
}

#[async_trait::async_trait]
impl Transport for RecordingTransport {
    fn sender_id(&self) -> Option<String> {
        self.sender.clone()
    }

    fn build_envelope(
        &self,
        destination: &str,
        content: &Value,
        options: &EnvelopeOptions,
    ) -> anyhow::Result<Envelope> {
        self.envelope_options.lock().unwrap().push(options.clone());
        Ok(Envelope {
            key: MessageKey {
                remote_jid: destination.to_string(),
                from_me: true,
                id: options.message_id.clone(),
            },
            message: content.clone(),
            message_timestamp: options.timestamp,
        })
    }

    fn normalize_body(&self, message: &Value) -> Value {
        message
            .get("ephemeralMessage")
            .and_then(|wrapper| wrapper.get("message"))
            .unwrap_or(message)
            .clone()
    }

    fn is_group(&self, destination: &str) -> bool {
        destination.ends_with("@g.us")
    }

    fn generate_message_id(&self, _sender_id: &str) -> String {
        self.next_message_id()
    }

    async fn deliver(
        &self,
        destination: &str,
        message: &Value,
        request: DeliveryRequest,
    ) -> anyhow::Result<()> {
        if self.fail_delivery {
            return Err(anyhow!("connection closed"));
        }
        self.deliveries.lock().unwrap().push(RecordedDelivery {
            destination: destination.to_string(),
            message: message.clone(),
            request,
        });
        Ok(())
    }

    async fn send_plain(&self, destination: &str, content: Value) -> anyhow::Result<Envelope> {
        if self.fail_plain_send {
            return Err(anyhow!("media upload failed"));
        }
        self.plain_sends
            .lock()
            .unwrap()
            .push((destination.to_string(), content.clone()));
        Ok(Envelope {
            key: MessageKey {
                remote_jid: destination.to_string(),
                from_me: true,
                id: self.next_message_id(),
            },
            message: content,
            message_timestamp: 0,
        })
    }

    fn echo_own_messages(&self) -> bool {
        self.echo_enabled
    }

    fn local_echo(&self) -> Option<Arc<dyn LocalEcho>> {
        if self.local_echo_available {
            Some(self.echo.clone())
        } else {
            None
        }
    }
}

/// Telemetry hook that keeps every event for later assertions.
#[derive(Default)]
pub struct RecordingTelemetry {
    events: Mutex<Vec<DispatchEvent>>,
}

impl RecordingTelemetry {
    pub fn events(&self) -> Vec<DispatchEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl TelemetryHook for RecordingTelemetry {
    fn emit(&self, event: DispatchEvent) {
        self.events.lock().unwrap().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn knobs_change_behaviour() {
        let transport = RecordingTransport::new()
            .without_sender()
            .failing_delivery()
            .failing_plain_send()
            .without_local_echo();
        assert!(transport.sender_id().is_none());
        assert!(transport.local_echo().is_none());
        assert!(
            transport
                .deliver("1@s.whatsapp.net", &json!({}), DeliveryRequest::default())
                .await
                .is_err()
        );
        assert!(transport.send_plain("1@s.whatsapp.net", json!({})).await.is_err());
    }

    #[test]
    fn ids_are_sequential() {
        let transport = RecordingTransport::new();
        assert_eq!(transport.generate_message_id("x"), "MSG-1");
        assert_eq!(transport.generate_message_id("x"), "MSG-2");
    }
}
