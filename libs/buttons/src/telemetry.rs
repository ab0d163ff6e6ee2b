use crate::classify::ButtonType;

#[derive(Debug, Clone, PartialEq)]
pub enum DispatchEvent {
    ValidationWarnings {
        context: String,
        warnings: Vec<String>,
    },
    ValidationFailed {
        context: String,
        errors: usize,
    },
    Delivered {
        message_id: String,
        button_type: Option<ButtonType>,
        nodes: usize,
        group: bool,
    },
    HeaderMediaFailed {
        destination: String,
        error: String,
    },
    EchoScheduled {
        message_id: String,
    },
}

pub trait TelemetryHook: Send + Sync {
    fn emit(&self, event: DispatchEvent);
}

#[derive(Debug, Default)]
pub struct NullTelemetry;

impl TelemetryHook for NullTelemetry {
    fn emit(&self, _event: DispatchEvent) {}
}
