//! # Array Schema
//!
//! Validates a JSON array: length refinements against the whole sequence
//! first, then every element against the item schema in index order. The
//! first element failure stops validation and its path is prefixed with
//! the element index.

use serde_json::Value;

use crate::error::ValidationError;
use crate::primitives::Check;
use crate::schema::{Parse, Schema};

#[derive(Debug, Clone)]
pub(crate) enum ArrayRule {
    Min(usize),
    Max(usize),
    Nonempty,
}

impl ArrayRule {
    fn holds(&self, len: usize) -> bool {
        match self {
            Self::Min(n) => len >= *n,
            Self::Max(n) => len <= *n,
            Self::Nonempty => len > 0,
        }
    }

    fn default_message(&self) -> String {
        match self {
            Self::Min(n) => format!("Array must contain at least {n} element(s)"),
            Self::Max(n) => format!("Array must contain at most {n} element(s)"),
            Self::Nonempty => "Array must not be empty".to_string(),
        }
    }
}

/// Array validator over a single item schema.
#[derive(Debug, Clone)]
pub struct ArraySchema {
    pub(crate) item: Box<Schema>,
    pub(crate) checks: Vec<Check<ArrayRule>>,
}

impl ArraySchema {
    /// Create an array schema whose elements must satisfy `item`.
    pub fn new(item: impl Into<Schema>) -> Self {
        Self {
            item: Box::new(item.into()),
            checks: Vec::new(),
        }
    }

    /// The element schema.
    pub fn item(&self) -> &Schema {
        &self.item
    }

    fn check(mut self, rule: ArrayRule) -> Self {
        self.checks.push(Check {
            rule,
            message: None,
        });
        self
    }

    /// At least `len` elements.
    pub fn min(self, len: usize) -> Self {
        self.check(ArrayRule::Min(len))
    }

    /// At most `len` elements.
    pub fn max(self, len: usize) -> Self {
        self.check(ArrayRule::Max(len))
    }

    /// At least one element.
    pub fn nonempty(self) -> Self {
        self.check(ArrayRule::Nonempty)
    }

    /// Override the message of the most recently added length refinement.
    pub fn message(mut self, message: impl Into<String>) -> Self {
        if let Some(last) = self.checks.last_mut() {
            last.message = Some(message.into());
        }
        self
    }
}

impl Parse for ArraySchema {
    fn validate(&self, input: Option<&Value>) -> Result<Option<Value>, ValidationError> {
        let Some(Value::Array(items)) = input else {
            return Err(ValidationError::type_mismatch("array", input));
        };

        for check in &self.checks {
            if !check.rule.holds(items.len()) {
                let message = check
                    .message
                    .clone()
                    .unwrap_or_else(|| check.rule.default_message());
                return Err(ValidationError::new(message, input, "array"));
            }
        }

        let mut output = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let validated = self
                .item
                .validate(Some(item))
                .map_err(|e| e.at(index.to_string()))?;
            // Arrays cannot hold undefined; it serializes as null.
            output.push(validated.unwrap_or(Value::Null));
        }

        Ok(Some(Value::Array(output)))
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;
    use serde_json::json;

    #[test]
    fn rejects_non_arrays() {
        let err = f::array(f::string()).safe_parse(&json!({})).unwrap_err();
        assert_eq!(err.message, "Expected array, received object");
    }

    #[test]
    fn element_failure_is_prefixed_with_index() {
        let schema = f::array(f::string());
        let err = schema.safe_parse(&json!(["ok", 123, true])).unwrap_err();
        assert_eq!(err.path, vec!["1"]);
        assert_eq!(err.received, Some(json!(123)));
    }

    #[test]
    fn length_checks_run_before_elements() {
        let schema = f::array(f::string()).max(1);
        let err = schema.safe_parse(&json!([1, 2])).unwrap_err();
        assert!(err.path.is_empty());
        assert_eq!(err.message, "Array must contain at most 1 element(s)");
    }

    #[test]
    fn nonempty_and_custom_message() {
        let schema = f::array(f::number()).nonempty().message("Pick at least one");
        assert_eq!(
            schema.safe_parse(&json!([])).unwrap_err().message,
            "Pick at least one"
        );
        assert!(schema.safe_parse(&json!([1])).is_ok());
    }

    #[test]
    fn output_holds_transformed_items() {
        let schema = f::array(f::string().trim().to_uppercase()).min(1);
        assert_eq!(
            schema.safe_parse(&json!([" a ", "b"])).unwrap(),
            json!(["A", "B"])
        );
    }

    #[test]
    fn optional_items_become_null() {
        let schema = f::array(f::number().optional());
        assert_eq!(
            schema.safe_parse(&json!([1, null])).unwrap(),
            json!([1, null])
        );
    }
}
