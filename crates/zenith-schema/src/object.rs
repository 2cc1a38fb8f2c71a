//! # Object Schema
//!
//! Validates a JSON object against a declared shape (field name → schema,
//! kept in declaration order).
//!
//! ## Validation Order
//!
//! 1. The input must be an object (not `null`, not an array).
//! 2. **Strict mode:** the first input key that is not declared fails with
//!    path `[key]`.
//! 3. Every declared field, in declaration order. The first failure stops
//!    validation and is prefixed with the field name. Absent optional
//!    fields are left out of the output.
//! 4. **Passthrough mode:** undeclared keys are copied to the output
//!    unchanged. Otherwise they are stripped.
//!
//! Strict is checked before passthrough, so a schema with both modes
//! enabled behaves as strict.
//!
//! ## Derived Schemas
//!
//! [`partial`](ObjectSchema::partial), [`pick`](ObjectSchema::pick),
//! [`omit`](ObjectSchema::omit), [`extend`](ObjectSchema::extend) and
//! [`merge`](ObjectSchema::merge) borrow the receiver and return a new
//! schema with its own copy of the shape.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::error::ValidationError;
use crate::schema::{IntoSchema, Parse, Schema};

/// Object validator.
#[derive(Debug, Clone, Default)]
pub struct ObjectSchema {
    pub(crate) shape: IndexMap<String, Schema>,
    pub(crate) strict: bool,
    pub(crate) passthrough: bool,
}

impl ObjectSchema {
    /// Create an object schema with an empty shape.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a field. Redeclaring a name replaces its schema and keeps
    /// the original position.
    pub fn field(mut self, name: impl Into<String>, schema: impl Into<Schema>) -> Self {
        self.shape.insert(name.into(), schema.into());
        self
    }

    /// Reject undeclared keys.
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Keep undeclared keys in the output.
    pub fn passthrough(mut self) -> Self {
        self.passthrough = true;
        self
    }

    /// The declared fields in declaration order.
    pub fn shape(&self) -> &IndexMap<String, Schema> {
        &self.shape
    }

    /// Declared field names in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.shape.keys().map(String::as_str)
    }

    /// Whether strict mode is enabled.
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Whether passthrough mode is enabled.
    pub fn is_passthrough(&self) -> bool {
        self.passthrough
    }

    fn with_shape(&self, shape: IndexMap<String, Schema>) -> Self {
        Self {
            shape,
            strict: self.strict,
            passthrough: self.passthrough,
        }
    }

    /// Every field wrapped in `optional()`. Applying it twice yields the
    /// same shape.
    pub fn partial(&self) -> Self {
        let shape = self
            .shape
            .iter()
            .map(|(name, schema)| (name.clone(), schema.clone().optional().into_schema()))
            .collect();
        self.with_shape(shape)
    }

    /// Only the listed fields, in declaration order. Unknown names are
    /// ignored.
    pub fn pick(&self, keys: &[&str]) -> Self {
        let shape = self
            .shape
            .iter()
            .filter(|(name, _)| keys.contains(&name.as_str()))
            .map(|(name, schema)| (name.clone(), schema.clone()))
            .collect();
        self.with_shape(shape)
    }

    /// Every field except the listed ones.
    pub fn omit(&self, keys: &[&str]) -> Self {
        let shape = self
            .shape
            .iter()
            .filter(|(name, _)| !keys.contains(&name.as_str()))
            .map(|(name, schema)| (name.clone(), schema.clone()))
            .collect();
        self.with_shape(shape)
    }

    /// Add the fields of `more`. Same-named fields take `more`'s schema.
    /// Keeps the receiver's strict/passthrough modes.
    pub fn extend(&self, more: &ObjectSchema) -> Self {
        let mut shape = self.shape.clone();
        for (name, schema) in &more.shape {
            shape.insert(name.clone(), schema.clone());
        }
        self.with_shape(shape)
    }

    /// Shape union with `other`, whose fields override same-named ones.
    /// The result takes `other`'s strict/passthrough modes.
    pub fn merge(&self, other: &ObjectSchema) -> Self {
        let mut merged = self.extend(other);
        merged.strict = other.strict;
        merged.passthrough = other.passthrough;
        merged
    }
}

impl Parse for ObjectSchema {
    fn validate(&self, input: Option<&Value>) -> Result<Option<Value>, ValidationError> {
        let Some(Value::Object(fields)) = input else {
            return Err(ValidationError::type_mismatch("object", input));
        };

        if self.strict {
            if let Some((key, value)) = fields.iter().find(|(k, _)| !self.shape.contains_key(*k)) {
                return Err(ValidationError::new(
                    format!("Unrecognized key: \"{key}\""),
                    Some(value),
                    "never",
                )
                .at(key.clone()));
            }
        }

        let mut output = Map::with_capacity(self.shape.len());
        for (name, schema) in &self.shape {
            let validated = schema
                .validate(fields.get(name))
                .map_err(|e| e.at(name.clone()))?;
            if let Some(value) = validated {
                output.insert(name.clone(), value);
            }
        }

        if self.passthrough {
            for (key, value) in fields {
                if !self.shape.contains_key(key) {
                    output.insert(key.clone(), value.clone());
                }
            }
        }

        Ok(Some(Value::Object(output)))
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;
    use serde_json::json;

    fn user() -> ObjectSchema {
        f::object()
            .field("name", f::string().min(2))
            .field("email", f::string().email())
    }

    #[test]
    fn rejects_null_and_arrays() {
        let schema = user();
        assert_eq!(
            schema.safe_parse(&json!(null)).unwrap_err().message,
            "Expected object, received null"
        );
        assert_eq!(
            schema.safe_parse(&json!([])).unwrap_err().message,
            "Expected object, received array"
        );
    }

    #[test]
    fn first_failing_field_in_declaration_order_wins() {
        let err = user()
            .safe_parse(&json!({ "email": "bad", "name": "A" }))
            .unwrap_err();
        assert_eq!(err.path, vec!["name"]);
    }

    #[test]
    fn missing_required_field_reports_undefined() {
        let err = user().safe_parse(&json!({ "name": "Ada" })).unwrap_err();
        assert_eq!(err.path, vec!["email"]);
        assert_eq!(err.received, None);
        assert_eq!(err.received_type(), "undefined");
        assert_eq!(err.message, "Expected string, received undefined");
    }

    #[test]
    fn unknown_keys_are_stripped_by_default() {
        let out = user()
            .safe_parse(&json!({ "name": "Ada", "email": "a@b.co", "extra": 1 }))
            .unwrap();
        assert_eq!(out, json!({ "name": "Ada", "email": "a@b.co" }));
    }

    #[test]
    fn strict_rejects_first_unknown_key() {
        let err = user()
            .strict()
            .safe_parse(&json!({ "name": "Ada", "email": "a@b.co", "role": "x", "z": 1 }))
            .unwrap_err();
        assert_eq!(err.path, vec!["role"]);
        assert_eq!(err.message, "Unrecognized key: \"role\"");
    }

    #[test]
    fn strict_runs_before_field_validation() {
        let err = user()
            .strict()
            .safe_parse(&json!({ "name": "A", "extra": true }))
            .unwrap_err();
        assert_eq!(err.path, vec!["extra"]);
    }

    #[test]
    fn passthrough_keeps_unknown_keys() {
        let out = user()
            .passthrough()
            .safe_parse(&json!({ "name": "Ada", "email": "a@b.co", "extra": [1] }))
            .unwrap();
        assert_eq!(out["extra"], json!([1]));
    }

    #[test]
    fn strict_wins_over_passthrough() {
        let schema = user().passthrough().strict();
        assert!(schema
            .safe_parse(&json!({ "name": "Ada", "email": "a@b.co", "extra": 1 }))
            .is_err());
    }

    #[test]
    fn absent_optional_fields_are_omitted() {
        let schema = user().field("age", f::number().optional());
        let out = schema
            .safe_parse(&json!({ "name": "Ada", "email": "a@b.co", "age": null }))
            .unwrap();
        assert!(out.get("age").is_none());
    }

    #[test]
    fn output_follows_declaration_order() {
        let out = user()
            .safe_parse(&json!({ "email": "a@b.co", "name": "Ada" }))
            .unwrap();
        let keys: Vec<&String> = out.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["name", "email"]);
    }

    #[test]
    fn partial_makes_every_field_optional() {
        let partial = user().partial();
        assert!(partial.shape().values().all(Schema::is_optional));
        assert_eq!(partial.safe_parse(&json!({})).unwrap(), json!({}));
        // Present values are still validated.
        assert!(partial.safe_parse(&json!({ "email": "bad" })).is_err());
    }

    #[test]
    fn partial_twice_is_idempotent() {
        let twice = user().partial().partial();
        for schema in twice.shape().values() {
            let Schema::Optional(optional) = schema else {
                panic!("expected optional field");
            };
            assert!(!optional.inner().is_optional());
        }
    }

    #[test]
    fn pick_and_omit_do_not_touch_receiver() {
        let base = user();
        let picked = base.pick(&["email", "missing"]);
        let omitted = base.omit(&["email"]);
        assert_eq!(picked.keys().collect::<Vec<_>>(), vec!["email"]);
        assert_eq!(omitted.keys().collect::<Vec<_>>(), vec!["name"]);
        assert_eq!(base.keys().count(), 2);
    }

    #[test]
    fn extend_overrides_same_named_fields() {
        let base = user();
        let extended = base.extend(
            &f::object()
                .field("name", f::string().optional())
                .field("age", f::number()),
        );
        assert_eq!(
            extended.keys().collect::<Vec<_>>(),
            vec!["name", "email", "age"]
        );
        assert!(extended
            .safe_parse(&json!({ "email": "a@b.co", "age": 3 }))
            .is_ok());
        // Receiver keeps its original required `name`.
        assert!(base.safe_parse(&json!({ "email": "a@b.co" })).is_err());
    }

    #[test]
    fn merge_takes_modes_from_other() {
        let merged = user().merge(&f::object().field("role", f::string()).strict());
        assert!(merged.is_strict());
        let extended = user().extend(&f::object().field("role", f::string()).strict());
        assert!(!extended.is_strict());
    }

    #[test]
    fn nested_paths_accumulate() {
        let schema = f::object().field("tags", f::array(f::string()));
        let err = schema.safe_parse(&json!({ "tags": ["ok", 123] })).unwrap_err();
        assert_eq!(err.path, vec!["tags", "1"]);
        assert_eq!(err.path_string(), "tags.1");
    }
}
