//! # JSON Schema Export
//!
//! Renders a [`Schema`] as a JSON Schema (Draft 2020-12) document so route
//! contracts can be published to API documentation and client generators.
//!
//! The export covers structure and refinements that JSON Schema can state.
//! Runtime coercions (numeric strings accepted by number schemas, `"true"` /
//! `"false"` accepted by boolean schemas), string transforms and custom
//! `refine` predicates have no JSON Schema equivalent and are left out.

use serde_json::{json, Map, Value};

use crate::collections::ArrayRule;
use crate::primitives::{NumberRule, StringRule};
use crate::schema::Schema;

const DRAFT_2020_12: &str = "https://json-schema.org/draft/2020-12/schema";

impl Schema {
    /// Export as a standalone JSON Schema document (with `$schema`).
    pub fn to_json_schema(&self) -> Value {
        let mut document = Map::new();
        document.insert("$schema".to_string(), json!(DRAFT_2020_12));
        if let Value::Object(body) = self.json_schema_fragment() {
            document.extend(body);
        }
        Value::Object(document)
    }

    /// Export as an embeddable fragment (no `$schema`).
    pub fn json_schema_fragment(&self) -> Value {
        match self {
            Self::String(s) => {
                let mut out = Map::new();
                out.insert("type".into(), json!("string"));
                for check in &s.checks {
                    match &check.rule {
                        StringRule::Min(n) => {
                            out.insert("minLength".into(), json!(n));
                        }
                        StringRule::Max(n) => {
                            out.insert("maxLength".into(), json!(n));
                        }
                        StringRule::Length(n) => {
                            out.insert("minLength".into(), json!(n));
                            out.insert("maxLength".into(), json!(n));
                        }
                        StringRule::Email => {
                            out.insert("format".into(), json!("email"));
                        }
                        StringRule::Url => {
                            out.insert("format".into(), json!("uri"));
                        }
                        StringRule::Uuid => {
                            out.insert("format".into(), json!("uuid"));
                        }
                        StringRule::Regex(re) => {
                            out.insert("pattern".into(), json!(re.as_str()));
                        }
                        StringRule::StartsWith(_)
                        | StringRule::EndsWith(_)
                        | StringRule::Custom(_) => {}
                    }
                }
                Value::Object(out)
            }
            Self::Number(n) => {
                let mut out = Map::new();
                let is_int = n.checks.iter().any(|c| matches!(c.rule, NumberRule::Int));
                out.insert(
                    "type".into(),
                    json!(if is_int { "integer" } else { "number" }),
                );
                for check in &n.checks {
                    match &check.rule {
                        NumberRule::Min(v) => {
                            out.insert("minimum".into(), json!(v));
                        }
                        NumberRule::Max(v) => {
                            out.insert("maximum".into(), json!(v));
                        }
                        NumberRule::Positive => {
                            out.insert("exclusiveMinimum".into(), json!(0));
                        }
                        NumberRule::Negative => {
                            out.insert("exclusiveMaximum".into(), json!(0));
                        }
                        NumberRule::Int | NumberRule::Finite | NumberRule::Custom(_) => {}
                    }
                }
                Value::Object(out)
            }
            Self::Boolean(_) => json!({ "type": "boolean" }),
            Self::Array(a) => {
                let mut out = Map::new();
                out.insert("type".into(), json!("array"));
                out.insert("items".into(), a.item.json_schema_fragment());
                for check in &a.checks {
                    match check.rule {
                        ArrayRule::Min(n) => {
                            out.insert("minItems".into(), json!(n));
                        }
                        ArrayRule::Max(n) => {
                            out.insert("maxItems".into(), json!(n));
                        }
                        ArrayRule::Nonempty => {
                            out.insert("minItems".into(), json!(1));
                        }
                    }
                }
                Value::Object(out)
            }
            Self::Object(o) => {
                let properties: Map<String, Value> = o
                    .shape
                    .iter()
                    .map(|(name, schema)| (name.clone(), schema.json_schema_fragment()))
                    .collect();
                let required: Vec<&String> = o
                    .shape
                    .iter()
                    .filter(|(_, schema)| !schema.is_optional())
                    .map(|(name, _)| name)
                    .collect();
                let mut out = Map::new();
                out.insert("type".into(), json!("object"));
                out.insert("properties".into(), Value::Object(properties));
                if !required.is_empty() {
                    out.insert("required".into(), json!(required));
                }
                if o.strict {
                    out.insert("additionalProperties".into(), json!(false));
                }
                Value::Object(out)
            }
            Self::Enum(e) => json!({ "type": "string", "enum": e.values }),
            Self::Union(u) => {
                let any_of: Vec<Value> = u
                    .alternatives
                    .iter()
                    .map(Schema::json_schema_fragment)
                    .collect();
                json!({ "anyOf": any_of })
            }
            Self::Optional(opt) => {
                let mut out = Map::new();
                out.insert(
                    "anyOf".into(),
                    json!([opt.inner.json_schema_fragment(), { "type": "null" }]),
                );
                if let Some(default) = &opt.default {
                    out.insert("default".into(), default.clone());
                }
                Value::Object(out)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;
    use serde_json::json;

    #[test]
    fn string_refinements_map_to_keywords() {
        let schema = f::string().min(2).max(50).email().into_schema();
        assert_eq!(
            schema.json_schema_fragment(),
            json!({ "type": "string", "minLength": 2, "maxLength": 50, "format": "email" })
        );
    }

    #[test]
    fn integer_numbers_export_as_integer() {
        let schema = f::number().int().positive().into_schema();
        assert_eq!(
            schema.json_schema_fragment(),
            json!({ "type": "integer", "exclusiveMinimum": 0 })
        );
    }

    #[test]
    fn object_lists_required_fields_only() {
        let schema = f::object()
            .field("name", f::string())
            .field("nickname", f::string().optional())
            .strict()
            .into_schema();
        let exported = schema.to_json_schema();
        assert_eq!(exported["required"], json!(["name"]));
        assert_eq!(exported["additionalProperties"], json!(false));
        assert_eq!(
            exported["$schema"],
            json!("https://json-schema.org/draft/2020-12/schema")
        );
    }

    #[test]
    fn optional_default_is_exported() {
        let schema = f::number().optional().default_value(1).into_schema();
        assert_eq!(schema.json_schema_fragment()["default"], json!(1));
    }
}
