//! Interactive button normalization, validation and protocol node synthesis.
//!
//! Authoring input arrives in several generations of button shapes. This crate validates it,
//! rewrites it into a single `interactiveMessage` wire structure, derives the `biz` node tree the
//! receiving client needs to render it, and hands the result to a [`Transport`] through the
//! [`Dispatcher`].
pub mod classify;
pub mod convert;
pub mod dispatch;
#[cfg(feature = "dry-run")]
pub mod dry_run;
pub mod echo;
pub mod error;
pub mod node;
pub mod normalize;
pub mod senders;
pub mod synth;
pub mod telemetry;
pub mod transport;
pub mod types;
pub mod validate;

pub use classify::{ButtonType, InteractiveBody, classify_button_type};
pub use convert::convert_content;
pub use dispatch::{Dispatcher, DispatcherBuilder, SendOptions};
#[cfg(feature = "dry-run")]
pub use dry_run::{Delivery, DryRunConfig, DryRunTransport};
pub use echo::EchoQueue;
pub use error::{CapabilityError, PreconditionError, SendError, ValidationError};
pub use node::BinaryNode;
pub use normalize::{normalize_button, normalize_button_values, normalize_buttons};
pub use senders::{ButtonText, CardsPayload, TemplateButton};
pub use synth::{bot_node, synthesize_node_tree};
pub use telemetry::{DispatchEvent, NullTelemetry, TelemetryHook};
pub use transport::{
    DeliveryRequest, Envelope, EnvelopeOptions, LocalEcho, MessageKey, Transport,
};
pub use types::{AuthoringButton, INTERACTIVE_BUTTONS_KEY, NativeFlowButton, QUICK_REPLY};
pub use validate::{
    AuthoringCheck, ContentCheck, EntryPoint, ValidationReport, example_payload,
    validate_authoring_buttons, validate_basic_payload, validate_converted_content,
    validate_interactive_payload,
};
