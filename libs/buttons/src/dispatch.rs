use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use gsm_telemetry::{TelemetryLabels, record_counter, record_histogram, with_common_fields};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;
use tracing::{Instrument, debug, field, info, info_span, warn};

use crate::classify::classify_button_type;
use crate::convert::convert_content;
use crate::echo::EchoQueue;
use crate::error::{CapabilityError, PreconditionError, SendError, ValidationError};
use crate::node::BinaryNode;
use crate::synth::{bot_node, synthesize_node_tree};
use crate::telemetry::{DispatchEvent, NullTelemetry, TelemetryHook};
use crate::transport::{DeliveryRequest, Envelope, EnvelopeOptions, Transport};
use crate::types::INTERACTIVE_BUTTONS_KEY;
use crate::validate::{
    EntryPoint, ValidationReport, example_payload, validate_converted_content,
    validate_interactive_payload,
};

const SENT_COUNTER: &str = "interactive_messages_sent";
const VALIDATION_FAILURE_COUNTER: &str = "interactive_validation_failures";
const DISPATCH_LATENCY_HISTOGRAM: &str = "interactive_dispatch_seconds";
const CONVERTED_CONTEXT: &str = "interactiveMessage";

/// Per-call options. Unknown keys are kept in `extra` and forwarded to the envelope builder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SendOptions {
    pub additional_nodes: Vec<BinaryNode>,
    pub additional_attributes: BTreeMap<String, String>,
    pub status_jid_list: Vec<String>,
    pub use_cached_group_metadata: bool,
    #[serde(alias = "AI")]
    pub ai: bool,
    /// Unix seconds; defaults to the current time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Validates, converts and delivers interactive messages through a [`Transport`].
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    telemetry: Arc<dyn TelemetryHook>,
    echo: OnceLock<EchoQueue>,
}

#[derive(Default)]
pub struct DispatcherBuilder {
    transport: Option<Arc<dyn Transport>>,
    telemetry: Option<Arc<dyn TelemetryHook>>,
}

impl DispatcherBuilder {
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn telemetry(mut self, telemetry: Arc<dyn TelemetryHook>) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    pub fn build(self) -> Result<Dispatcher, PreconditionError> {
        let transport = self.transport.ok_or(PreconditionError::MissingTransport)?;
        Ok(Dispatcher {
            transport,
            telemetry: self.telemetry.unwrap_or_else(|| Arc::new(NullTelemetry)),
            echo: OnceLock::new(),
        })
    }
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            telemetry: Arc::new(NullTelemetry),
            echo: OnceLock::new(),
        }
    }

    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::default()
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Full-control send: arbitrary authoring or canonical content.
    ///
    /// Returns once the transport has accepted the message. A local echo, when enabled, is queued
    /// afterwards and never awaited.
    pub async fn send_interactive_message(
        &self,
        destination: &str,
        content: &Value,
        options: SendOptions,
    ) -> Result<Envelope, SendError> {
        let span = info_span!(
            "buttons.dispatch",
            account = field::Empty,
            chat_id = field::Empty,
            msg_id = field::Empty,
            button_type = field::Empty
        );
        let started = Instant::now();
        let result = self
            .dispatch(destination, content, options, &span)
            .instrument(span.clone())
            .await;
        if let Err(err) = &result {
            warn!(target: "gsm.buttons.dispatch", parent: &span, error = %err, "interactive send failed");
        }
        record_histogram(
            DISPATCH_LATENCY_HISTOGRAM,
            started.elapsed().as_secs_f64(),
            &TelemetryLabels::default(),
        );
        result
    }

    async fn dispatch(
        &self,
        destination: &str,
        content: &Value,
        options: SendOptions,
        span: &tracing::Span,
    ) -> Result<Envelope, SendError> {
        if destination.trim().is_empty() {
            return Err(PreconditionError::EmptyDestination.into());
        }

        let has_authoring_buttons = content
            .get(INTERACTIVE_BUTTONS_KEY)
            .is_some_and(|buttons| !buttons.is_null());
        if has_authoring_buttons {
            let report = validate_interactive_payload(content);
            self.check(EntryPoint::Interactive.context(), report)
                .map_err(|err| err.with_example(example_payload(EntryPoint::Interactive)))?;
        }

        let converted = convert_content(content);
        let checked = validate_converted_content(&converted);
        self.check(CONVERTED_CONTEXT, checked.report)?;
        let content = checked.content;

        let sender_id = self.transport.sender_id().ok_or(CapabilityError::new(
            "sender_id",
            "the transport has no authenticated account",
        ))?;
        let group = self.transport.is_group(destination);
        let local_echo = if self.transport.echo_own_messages() && !group {
            Some(self.transport.local_echo().ok_or(CapabilityError::new(
                "local_echo",
                "echo of own messages is enabled but the transport cannot append locally",
            ))?)
        } else {
            None
        };

        let message_id = options
            .message_id
            .clone()
            .unwrap_or_else(|| self.transport.generate_message_id(&sender_id));
        let timestamp = options
            .timestamp
            .unwrap_or_else(|| OffsetDateTime::now_utc().unix_timestamp());
        let envelope = self
            .transport
            .build_envelope(
                destination,
                &content,
                &EnvelopeOptions {
                    sender_id: sender_id.clone(),
                    message_id,
                    timestamp,
                    extra: options.extra,
                },
            )
            .map_err(SendError::Transport)?;
        with_common_fields(span, &sender_id, Some(destination), Some(&envelope.key.id));

        let body = self.transport.normalize_body(&envelope.message);
        let button_type = classify_button_type(&body);
        let mut nodes = options.additional_nodes;
        if let Some(kind) = button_type {
            span.record("button_type", field::display(kind.as_str()));
            nodes.push(synthesize_node_tree(&body));
            if !group {
                nodes.push(bot_node());
            }
        }
        let node_count = nodes.len();

        self.transport
            .deliver(
                destination,
                &envelope.message,
                DeliveryRequest {
                    message_id: envelope.key.id.clone(),
                    use_cached_group_metadata: options.use_cached_group_metadata,
                    additional_attributes: options.additional_attributes,
                    status_jid_list: options.status_jid_list,
                    additional_nodes: nodes,
                    ai: options.ai,
                },
            )
            .await
            .map_err(SendError::Transport)?;

        info!(
            target: "gsm.buttons.dispatch",
            button_type = %button_type.map(|kind| kind.as_str()).unwrap_or("plain"),
            nodes = node_count,
            group,
            "message delivered"
        );
        record_counter(
            SENT_COUNTER,
            1,
            &TelemetryLabels::new(sender_id).with_extra(
                "button_type",
                button_type.map(|kind| kind.as_str()).unwrap_or("plain"),
            ),
        );
        self.telemetry.emit(DispatchEvent::Delivered {
            message_id: envelope.key.id.clone(),
            button_type,
            nodes: node_count,
            group,
        });

        if let Some(echo) = local_echo {
            let queue = self.echo.get_or_init(EchoQueue::spawn);
            if queue.enqueue(echo, envelope.clone()) {
                debug!(target: "gsm.buttons.echo", msg_id = %envelope.key.id, "local echo queued");
                self.telemetry.emit(DispatchEvent::EchoScheduled {
                    message_id: envelope.key.id.clone(),
                });
            } else {
                warn!(target: "gsm.buttons.echo", msg_id = %envelope.key.id, "echo worker stopped; skipping local echo");
            }
        }

        Ok(envelope)
    }

    /// Logs warnings and turns a failed report into a [`ValidationError`].
    pub(crate) fn check(
        &self,
        context: &str,
        report: ValidationReport,
    ) -> Result<(), ValidationError> {
        if !report.is_valid() {
            return Err(self.fail(context, report));
        }
        if !report.warnings.is_empty() {
            report.log_warnings(context);
            self.telemetry.emit(DispatchEvent::ValidationWarnings {
                context: context.to_string(),
                warnings: report.warnings,
            });
        }
        Ok(())
    }

    pub(crate) fn fail(&self, context: &str, report: ValidationReport) -> ValidationError {
        warn!(
            target: "gsm.buttons.validate",
            context,
            errors = report.errors.len(),
            "validation failed"
        );
        record_counter(
            VALIDATION_FAILURE_COUNTER,
            1,
            &TelemetryLabels::default().with_extra("context", context),
        );
        self.telemetry.emit(DispatchEvent::ValidationFailed {
            context: context.to_string(),
            errors: report.errors.len(),
        });
        report.into_error(context)
    }

    pub(crate) fn telemetry(&self) -> &dyn TelemetryHook {
        self.telemetry.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn send_options_accept_camel_case_and_ai_alias() {
        let options: SendOptions = serde_json::from_value(json!({
            "additionalAttributes": {"edit": "1"},
            "statusJidList": ["1@s.whatsapp.net"],
            "useCachedGroupMetadata": true,
            "AI": true,
            "timestamp": 1700000000,
            "messageId": "ABC",
            "quoted": {"key": {"id": "Q"}}
        }))
        .unwrap();

        assert!(options.ai);
        assert!(options.use_cached_group_metadata);
        assert_eq!(options.additional_attributes["edit"], "1");
        assert_eq!(options.timestamp, Some(1_700_000_000));
        assert_eq!(options.message_id.as_deref(), Some("ABC"));
        assert_eq!(options.extra["quoted"], json!({"key": {"id": "Q"}}));
        assert!(!options.extra.contains_key("AI"));
    }

    #[test]
    fn send_options_default_from_empty_object() {
        let options: SendOptions = serde_json::from_value(json!({})).unwrap();
        assert_eq!(options, SendOptions::default());
    }

    #[test]
    fn builder_requires_a_transport() {
        let err = Dispatcher::builder().build().err();
        assert_eq!(err, Some(PreconditionError::MissingTransport));
    }
}
