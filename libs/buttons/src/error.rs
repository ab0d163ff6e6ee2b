use std::fmt;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::validate::ValidationReport;

/// Raised when a strict or structural check rejects a payload.
///
/// Carries every violation found, never just the first one, so callers can fix a payload in a
/// single pass. The optional `example` holds a known-good payload for the entry point that was
/// used.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    pub context: String,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
}

impl ValidationError {
    pub fn new(context: impl Into<String>, errors: Vec<String>, warnings: Vec<String>) -> Self {
        Self {
            context: context.into(),
            errors,
            warnings,
            example: None,
        }
    }

    pub fn from_report(context: impl Into<String>, report: ValidationReport) -> Self {
        Self::new(context, report.errors, report.warnings)
    }

    pub fn with_example(mut self, example: Value) -> Self {
        self.example = Some(example);
        self
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: validation failed with {} error(s)",
            self.context,
            self.errors.len()
        )?;
        for error in &self.errors {
            write!(f, "\n  - {error}")?;
        }
        if !self.warnings.is_empty() {
            write!(f, "\nwarnings:")?;
            for warning in &self.warnings {
                write!(f, "\n  - {warning}")?;
            }
        }
        if let Some(example) = &self.example {
            write!(f, "\nexample payload: {example}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// The transport cannot provide something the dispatch sequence needs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("transport capability `{capability}` is unavailable: {hint}")]
pub struct CapabilityError {
    pub capability: &'static str,
    pub hint: &'static str,
}

impl CapabilityError {
    pub fn new(capability: &'static str, hint: &'static str) -> Self {
        Self { capability, hint }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreconditionError {
    #[error("a transport handle is required before sending")]
    MissingTransport,
    #[error("destination is empty")]
    EmptyDestination,
}

#[derive(Debug, Error)]
pub enum SendError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Capability(#[from] CapabilityError),
    #[error(transparent)]
    Precondition(#[from] PreconditionError),
    #[error(transparent)]
    Transport(anyhow::Error),
}

impl SendError {
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            SendError::Validation(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn display_lists_every_error_and_warning() {
        let err = ValidationError::new(
            "sendButtons",
            vec!["text must be a non-empty string".into(), "buttons empty".into()],
            vec!["too many buttons".into()],
        );
        let rendered = err.to_string();
        assert!(rendered.starts_with("sendButtons: validation failed with 2 error(s)"));
        assert!(rendered.contains("  - text must be a non-empty string"));
        assert!(rendered.contains("  - buttons empty"));
        assert!(rendered.contains("warnings:\n  - too many buttons"));
    }

    #[test]
    fn serializes_example_only_when_present() {
        let err = ValidationError::new("ctx", vec!["bad".into()], vec![]);
        assert!(err.to_json().get("example").is_none());

        let err = err.with_example(json!({"text": "hi"}));
        assert_eq!(err.to_json()["example"], json!({"text": "hi"}));
    }

    #[test]
    fn capability_error_names_the_capability() {
        let err = CapabilityError::new("sender_id", "authenticate the transport first");
        assert_eq!(
            err.to_string(),
            "transport capability `sender_id` is unavailable: authenticate the transport first"
        );
    }
}
