//! # Enum, Union and Optional Schemas
//!
//! - [`EnumSchema`]: a string from a fixed, ordered allow-list.
//! - [`UnionSchema`]: ordered alternatives; the first one that succeeds
//!   wins. When every alternative fails, the individual errors are dropped
//!   and a single combined error is reported.
//! - [`OptionalSchema`]: `null` and absent input succeed as undefined (or
//!   the configured default); anything else goes to the inner schema.

use serde_json::Value;

use crate::error::ValidationError;
use crate::schema::{Parse, Schema};

/// String enumeration validator.
#[derive(Debug, Clone)]
pub struct EnumSchema {
    pub(crate) values: Vec<String>,
}

impl EnumSchema {
    /// Create an enum over `values`, keeping their order.
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// The allowed values in declaration order.
    pub fn values(&self) -> &[String] {
        &self.values
    }
}

impl Parse for EnumSchema {
    fn validate(&self, input: Option<&Value>) -> Result<Option<Value>, ValidationError> {
        match input {
            Some(Value::String(s)) if self.values.iter().any(|v| v == s) => {
                Ok(Some(Value::String(s.clone())))
            }
            _ => Err(ValidationError::new(
                format!(
                    "Invalid enum value. Expected one of: {}",
                    self.values.join(", ")
                ),
                input,
                self.values.join(" | "),
            )),
        }
    }
}

/// Ordered, first-match union.
#[derive(Debug, Clone)]
pub struct UnionSchema {
    pub(crate) alternatives: Vec<Schema>,
}

impl UnionSchema {
    /// Create a union over `alternatives`, tried in order.
    pub fn new(alternatives: Vec<Schema>) -> Self {
        Self { alternatives }
    }

    /// Append another alternative.
    pub fn or(mut self, alternative: impl Into<Schema>) -> Self {
        self.alternatives.push(alternative.into());
        self
    }

    /// The alternatives in the order they are tried.
    pub fn alternatives(&self) -> &[Schema] {
        &self.alternatives
    }

    fn expected(&self) -> String {
        self.alternatives
            .iter()
            .map(Schema::type_name)
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

impl Parse for UnionSchema {
    fn validate(&self, input: Option<&Value>) -> Result<Option<Value>, ValidationError> {
        for alternative in &self.alternatives {
            if let Ok(validated) = alternative.validate(input) {
                return Ok(validated);
            }
        }
        Err(ValidationError::new(
            "Invalid input: no union alternative matched",
            input,
            self.expected(),
        ))
    }
}

/// Optional wrapper with an optional default.
#[derive(Debug, Clone)]
pub struct OptionalSchema {
    pub(crate) inner: Box<Schema>,
    pub(crate) default: Option<Value>,
}

impl OptionalSchema {
    /// Wrap `inner`. Prefer [`IntoSchema::optional`](crate::IntoSchema::optional),
    /// which does not double-wrap.
    pub fn new(inner: impl Into<Schema>) -> Self {
        Self {
            inner: Box::new(inner.into()),
            default: None,
        }
    }

    /// A new schema that yields `value` instead of undefined for `null` or
    /// absent input. The default is returned as-is, not validated.
    pub fn default_value(&self, value: impl Into<Value>) -> Self {
        Self {
            inner: self.inner.clone(),
            default: Some(value.into()),
        }
    }

    /// The wrapped schema.
    pub fn inner(&self) -> &Schema {
        &self.inner
    }

    /// The configured default, if any.
    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }
}

impl Parse for OptionalSchema {
    fn validate(&self, input: Option<&Value>) -> Result<Option<Value>, ValidationError> {
        match input {
            None | Some(Value::Null) => Ok(self.default.clone()),
            Some(_) => self.inner.validate(input),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;
    use serde_json::json;

    #[test]
    fn enum_lists_allowed_values() {
        let schema = f::enumeration(["admin", "user"]);
        assert_eq!(schema.safe_parse(&json!("user")).unwrap(), json!("user"));
        let err = schema.safe_parse(&json!("root")).unwrap_err();
        assert_eq!(err.message, "Invalid enum value. Expected one of: admin, user");
        assert_eq!(err.expected, "admin | user");
        assert!(schema.safe_parse(&json!(1)).is_err());
    }

    #[test]
    fn optional_enum() {
        let schema = f::enumeration(["a", "b"]).optional();
        assert_eq!(schema.validate(None).unwrap(), None);
        assert_eq!(schema.safe_parse(&json!(null)).unwrap(), json!(null));
        assert!(schema.safe_parse(&json!("a")).is_ok());
        assert!(schema.safe_parse(&json!("b")).is_ok());
        assert!(schema.safe_parse(&json!("c")).is_err());
    }

    #[test]
    fn union_is_ordered_first_match() {
        let schema = f::union([f::string().into_schema(), f::number().into_schema()]);
        assert_eq!(schema.safe_parse(&json!("x")).unwrap(), json!("x"));
        assert_eq!(schema.safe_parse(&json!(5)).unwrap(), json!(5));
        // "5" matches the string alternative first, so it is not coerced.
        assert_eq!(schema.safe_parse(&json!("5")).unwrap(), json!("5"));
    }

    #[test]
    fn union_failure_discards_alternative_errors() {
        let schema = f::union([
            f::string().min(3).into_schema(),
            f::number().into_schema(),
        ]);
        let err = schema.safe_parse(&json!(true)).unwrap_err();
        assert_eq!(err.expected, "string | number");
        assert_eq!(err.message, "Invalid input: no union alternative matched");
        assert!(err.path.is_empty());

        // The string alternative's min-length message is not surfaced.
        let err = schema.safe_parse(&json!("ab")).unwrap_err();
        assert_eq!(err.message, "Invalid input: no union alternative matched");
    }

    #[test]
    fn optional_default_replaces_null_and_absent() {
        let schema = f::number().optional().default_value(20);
        assert_eq!(schema.safe_parse(&json!(null)).unwrap(), json!(20));
        assert_eq!(schema.validate(None).unwrap(), Some(json!(20)));
        assert_eq!(schema.safe_parse(&json!("5")).unwrap(), json!(5));
    }

    #[test]
    fn default_value_returns_new_schema() {
        let plain = f::string().optional();
        let defaulted = plain.default_value("guest");
        assert!(plain.default().is_none());
        assert_eq!(defaulted.default(), Some(&json!("guest")));
    }

    #[test]
    fn optional_still_validates_present_values() {
        let schema = f::string().email().optional();
        assert!(schema.safe_parse(&json!("nope")).is_err());
    }
}
