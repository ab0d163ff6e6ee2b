//! Validation passes applied before and after content conversion.
//!
//! Every validator here is pure: it reports problems through a [`ValidationReport`] and returns
//! any corrected structure as a new value instead of mutating its input.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ValidationError;

pub mod authoring;
pub mod content;
pub mod strict;

pub use authoring::{AuthoringCheck, SOFT_BUTTON_LIMIT, validate_authoring_buttons};
pub use content::{ContentCheck, validate_converted_content};
pub use strict::{
    BASIC_ALLOWED_NAMES, EntryPoint, INTERACTIVE_ALLOWED_NAMES, REQUIRED_FIELDS, example_payload,
    required_fields, validate_basic_payload, validate_interactive_payload,
};

/// Errors block the operation; warnings are advisory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

impl ValidationReport {
    pub fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
        self.valid = false;
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn merge(&mut self, other: ValidationReport) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        self.valid = self.errors.is_empty();
    }

    pub fn log_warnings(&self, context: &str) {
        for warning in &self.warnings {
            warn!(target: "gsm.buttons.validate", context, "{warning}");
        }
    }

    /// Converts a failed report into the error raised to callers.
    pub fn into_error(self, context: impl Into<String>) -> ValidationError {
        ValidationError::from_report(context, self)
    }
}
