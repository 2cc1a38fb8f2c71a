//! # Validation Errors
//!
//! Structured, path-addressable error types produced by schema validation.
//!
//! ## Error Model
//!
//! - [`ValidationError`] is a single violation. Its `path` locates the
//!   offending member, outer segment first. Composite schemas prefix the
//!   path of a child error with their own key or index as the error
//!   propagates upward.
//! - [`ValidationFailure`] is the aggregate error returned by
//!   [`Parse::parse`](crate::Parse::parse). It carries the violations plus a
//!   transport status code and converts to the wire error body.
//!
//! Validation is fail-fast: one error per nesting level, never an
//! accumulated list. `ValidationFailure` holds a `Vec` so that callers that
//! merge failures from several sources keep a single type.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Default transport status for a validation failure.
pub const DEFAULT_FAILURE_STATUS: u16 = 400;

/// Top-level `error` string of the wire validation body.
pub const VALIDATION_ERROR_TITLE: &str = "Validation Error";

/// Runtime type name of a value as reported on the wire.
///
/// Absent values are `"undefined"`. `null`, arrays and objects are all
/// `"object"`.
pub fn type_of(value: Option<&Value>) -> &'static str {
    match value {
        None => "undefined",
        Some(Value::Null) | Some(Value::Array(_)) | Some(Value::Object(_)) => "object",
        Some(Value::Bool(_)) => "boolean",
        Some(Value::Number(_)) => "number",
        Some(Value::String(_)) => "string",
    }
}

/// Descriptive kind name used in type-mismatch messages.
///
/// Unlike [`type_of`], distinguishes `null` and arrays so messages such as
/// `Expected object, received array` stay useful.
pub(crate) fn kind_of(value: Option<&Value>) -> &'static str {
    match value {
        None => "undefined",
        Some(Value::Null) => "null",
        Some(Value::Array(_)) => "array",
        Some(Value::Object(_)) => "object",
        Some(Value::Bool(_)) => "boolean",
        Some(Value::Number(_)) => "number",
        Some(Value::String(_)) => "string",
    }
}

/// A single validation violation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Descent path to the offending member, outermost segment first.
    pub path: Vec<String>,
    /// Human-readable message (a refinement's default or custom message).
    pub message: String,
    /// The input value that failed. `None` when the value was absent.
    pub received: Option<Value>,
    /// Description of what the schema expected.
    pub expected: String,
}

impl ValidationError {
    /// Create an error at the current (empty) path.
    pub fn new(
        message: impl Into<String>,
        received: Option<&Value>,
        expected: impl Into<String>,
    ) -> Self {
        Self {
            path: Vec::new(),
            message: message.into(),
            received: received.cloned(),
            expected: expected.into(),
        }
    }

    /// Type mismatch: the input's runtime type is not `expected`.
    pub(crate) fn type_mismatch(expected: &str, received: Option<&Value>) -> Self {
        let message = format!("Expected {expected}, received {}", kind_of(received));
        Self::new(message, received, expected)
    }

    /// Prefix the path with `segment`. Called while an error propagates out
    /// of a child schema.
    pub fn at(mut self, segment: impl Into<String>) -> Self {
        self.path.insert(0, segment.into());
        self
    }

    /// Dot-joined path, or `"root"` for a top-level error.
    pub fn path_string(&self) -> String {
        if self.path.is_empty() {
            "root".to_string()
        } else {
            self.path.join(".")
        }
    }

    /// Runtime type name of the received value.
    pub fn received_type(&self) -> &'static str {
        type_of(self.received.as_ref())
    }

    /// The wire representation of this error.
    pub fn to_detail(&self) -> ErrorDetail {
        ErrorDetail {
            path: self.path_string(),
            message: self.message.clone(),
            received: self.received_type().to_string(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path_string(), self.message)
    }
}

impl std::error::Error for ValidationError {}

/// One entry of the wire `details` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Dot-joined path, `"root"` when empty.
    pub path: String,
    /// Violation message.
    pub message: String,
    /// Runtime type name of the received value.
    pub received: String,
}

/// Wire body of a validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrorBody {
    /// Always [`VALIDATION_ERROR_TITLE`].
    pub error: String,
    /// One entry per violation.
    pub details: Vec<ErrorDetail>,
}

/// Aggregate validation failure, returned by `parse`.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("validation failed with {} error(s): {}", .errors.len(), summary(.errors))]
pub struct ValidationFailure {
    errors: Vec<ValidationError>,
    status: u16,
}

fn summary(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationFailure {
    /// Wrap a list of violations with the default status.
    pub fn new(errors: Vec<ValidationError>) -> Self {
        Self {
            errors,
            status: DEFAULT_FAILURE_STATUS,
        }
    }

    /// Override the transport status code.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Transport status code (400 unless overridden).
    pub fn status(&self) -> u16 {
        self.status
    }

    /// The violations.
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// The first violation, if any.
    pub fn first(&self) -> Option<&ValidationError> {
        self.errors.first()
    }

    /// Consumes self and returns the violations.
    pub fn into_errors(self) -> Vec<ValidationError> {
        self.errors
    }

    /// Build the wire body `{ error: "Validation Error", details: [...] }`.
    pub fn to_body(&self) -> ValidationErrorBody {
        ValidationErrorBody {
            error: VALIDATION_ERROR_TITLE.to_string(),
            details: self.errors.iter().map(ValidationError::to_detail).collect(),
        }
    }
}

impl From<ValidationError> for ValidationFailure {
    fn from(error: ValidationError) -> Self {
        Self::new(vec![error])
    }
}

/// Error from [`Parse::parse_into`](crate::Parse::parse_into).
#[derive(Debug, Error)]
pub enum ParseError {
    /// The input did not satisfy the schema.
    #[error(transparent)]
    Invalid(#[from] ValidationFailure),

    /// The validated value did not deserialize into the requested type.
    /// This is a mismatch between the schema and the Rust type, not bad input.
    #[error("validated value does not match target type: {0}")]
    Shape(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn type_of_matches_runtime_names() {
        assert_eq!(type_of(None), "undefined");
        assert_eq!(type_of(Some(&Value::Null)), "object");
        assert_eq!(type_of(Some(&json!([1]))), "object");
        assert_eq!(type_of(Some(&json!({}))), "object");
        assert_eq!(type_of(Some(&json!("x"))), "string");
        assert_eq!(type_of(Some(&json!(1.5))), "number");
        assert_eq!(type_of(Some(&json!(false))), "boolean");
    }

    #[test]
    fn path_is_prefixed_outer_to_inner() {
        let err = ValidationError::new("bad", Some(&json!(123)), "string")
            .at("1")
            .at("tags");
        assert_eq!(err.path, vec!["tags", "1"]);
        assert_eq!(err.path_string(), "tags.1");
    }

    #[test]
    fn empty_path_renders_as_root() {
        let err = ValidationError::type_mismatch("string", Some(&json!(5)));
        assert_eq!(err.path_string(), "root");
        assert_eq!(err.message, "Expected string, received number");
        assert_eq!(err.to_string(), "root: Expected string, received number");
    }

    #[test]
    fn failure_body_uses_wire_format() {
        let failure = ValidationFailure::from(
            ValidationError::new("Please provide a valid email", Some(&json!("bad")), "string")
                .at("email"),
        );
        assert_eq!(failure.status(), 400);
        let body = serde_json::to_value(failure.to_body()).unwrap();
        assert_eq!(
            body,
            json!({
                "error": "Validation Error",
                "details": [
                    { "path": "email", "message": "Please provide a valid email", "received": "string" }
                ]
            })
        );
    }

    #[test]
    fn failure_status_override() {
        let failure = ValidationFailure::new(vec![]).with_status(422);
        assert_eq!(failure.status(), 422);
        assert!(failure.first().is_none());
    }

    #[test]
    fn failure_display_lists_errors() {
        let failure = ValidationFailure::new(vec![
            ValidationError::new("too short", None, "string").at("name"),
        ]);
        let text = failure.to_string();
        assert!(text.contains("1 error(s)"));
        assert!(text.contains("name: too short"));
    }
}
