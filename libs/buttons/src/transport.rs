use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::node::BinaryNode;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageKey {
    pub remote_jid: String,
    pub from_me: bool,
    pub id: String,
}

/// A message ready for delivery, as produced by the transport's builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub key: MessageKey,
    pub message: Value,
    pub message_timestamp: i64,
}

/// Inputs to [`Transport::build_envelope`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvelopeOptions {
    pub sender_id: String,
    pub message_id: String,
    /// Unix seconds.
    pub timestamp: i64,
    /// Caller options the dispatcher does not interpret, forwarded to the builder.
    pub extra: Map<String, Value>,
}

/// Side-channel metadata handed to [`Transport::deliver`] alongside the message body.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryRequest {
    pub message_id: String,
    pub use_cached_group_metadata: bool,
    pub additional_attributes: BTreeMap<String, String>,
    pub status_jid_list: Vec<String>,
    pub additional_nodes: Vec<BinaryNode>,
    pub ai: bool,
}

/// The delivery capability the dispatcher sits in front of.
///
/// Connection handling, retries and persistence belong to the implementation.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Identity of the logged-in account, if a session is established.
    fn sender_id(&self) -> Option<String>;

    fn build_envelope(
        &self,
        destination: &str,
        content: &Value,
        options: &EnvelopeOptions,
    ) -> anyhow::Result<Envelope>;

    /// Strips transport wrappers (ephemeral, view-once, ...) so the body can be classified.
    fn normalize_body(&self, message: &Value) -> Value;

    fn is_group(&self, destination: &str) -> bool;

    fn generate_message_id(&self, sender_id: &str) -> String;

    async fn deliver(
        &self,
        destination: &str,
        message: &Value,
        request: DeliveryRequest,
    ) -> anyhow::Result<()>;

    /// Sends an ordinary message; used for media that precedes a card list.
    async fn send_plain(&self, destination: &str, content: Value) -> anyhow::Result<Envelope>;

    /// Whether sent messages should be echoed back into the local event stream.
    fn echo_own_messages(&self) -> bool {
        false
    }

    fn local_echo(&self) -> Option<Arc<dyn LocalEcho>> {
        None
    }
}

/// Appends a sent message to the local event stream.
#[async_trait::async_trait]
pub trait LocalEcho: Send + Sync {
    /// Lock serializing writes to the local event stream.
    fn event_lock(&self) -> Arc<Mutex<()>>;

    async fn echo_locally(&self, envelope: Envelope) -> anyhow::Result<()>;
}
