//! # Schema
//!
//! The closed set of schema kinds and the capability traits shared by
//! every schema.
//!
//! [`Schema`] is a sum type over the eight kinds. Composite schemas store
//! their children as `Schema` values, and validation dispatches with a
//! single `match`.
//!
//! ## Undefined vs null
//!
//! JSON has no `undefined`. An absent value (a missing object key, or no
//! value at all) is passed to [`Parse::validate`] as `None`; `null` is
//! `Some(Value::Null)`. Validation likewise returns `Ok(None)` for an
//! undefined result, which object schemas use to omit the key.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::collections::ArraySchema;
use crate::combinators::{EnumSchema, OptionalSchema, UnionSchema};
use crate::error::{ParseError, ValidationError, ValidationFailure};
use crate::object::ObjectSchema;
use crate::primitives::{BooleanSchema, NumberSchema, StringSchema};

/// Validation capability shared by every schema type.
pub trait Parse {
    /// Validate a possibly-absent value.
    ///
    /// `Ok(None)` means the result is undefined (only optional schemas
    /// produce it).
    fn validate(&self, input: Option<&Value>) -> Result<Option<Value>, ValidationError>;

    /// Validate `value`, returning the first violation as data.
    ///
    /// An undefined result is reported as `Value::Null`.
    fn safe_parse(&self, value: &Value) -> Result<Value, ValidationError> {
        self.validate(Some(value)).map(|out| out.unwrap_or(Value::Null))
    }

    /// Validate `value`, wrapping a violation in the aggregate
    /// [`ValidationFailure`] (transport status 400).
    fn parse(&self, value: &Value) -> Result<Value, ValidationFailure> {
        self.safe_parse(value).map_err(ValidationFailure::from)
    }

    /// Validate `value` and deserialize the validated output into `T`.
    fn parse_into<T: DeserializeOwned>(&self, value: &Value) -> Result<T, ParseError> {
        let validated = self.parse(value)?;
        Ok(serde_json::from_value(validated)?)
    }
}

/// A schema of any kind.
#[derive(Debug, Clone)]
pub enum Schema {
    String(StringSchema),
    Number(NumberSchema),
    Boolean(BooleanSchema),
    Array(ArraySchema),
    Object(ObjectSchema),
    Enum(EnumSchema),
    Union(UnionSchema),
    Optional(OptionalSchema),
}

impl Schema {
    /// Short type tag, used in union error descriptions.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Number(_) => "number",
            Self::Boolean(_) => "boolean",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
            Self::Enum(_) => "enum",
            Self::Union(_) => "union",
            Self::Optional(_) => "optional",
        }
    }

    /// Whether absent and `null` input is accepted.
    pub fn is_optional(&self) -> bool {
        matches!(self, Self::Optional(_))
    }
}

impl Parse for Schema {
    fn validate(&self, input: Option<&Value>) -> Result<Option<Value>, ValidationError> {
        match self {
            Self::String(s) => s.validate(input),
            Self::Number(s) => s.validate(input),
            Self::Boolean(s) => s.validate(input),
            Self::Array(s) => s.validate(input),
            Self::Object(s) => s.validate(input),
            Self::Enum(s) => s.validate(input),
            Self::Union(s) => s.validate(input),
            Self::Optional(s) => s.validate(input),
        }
    }
}

macro_rules! impl_into_schema {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Schema {
                fn from(schema: $ty) -> Self {
                    Schema::$variant(schema)
                }
            }
        )*
    };
}

impl_into_schema! {
    String => StringSchema,
    Number => NumberSchema,
    Boolean => BooleanSchema,
    Array => ArraySchema,
    Object => ObjectSchema,
    Enum => EnumSchema,
    Union => UnionSchema,
    Optional => OptionalSchema,
}

/// Wrapping combinators available on every schema type.
pub trait IntoSchema: Into<Schema> + Sized {
    /// Erase the concrete schema type.
    fn into_schema(self) -> Schema {
        self.into()
    }

    /// Accept `null` and absent input. Idempotent: an optional schema is
    /// returned unchanged.
    fn optional(self) -> OptionalSchema {
        match self.into() {
            Schema::Optional(optional) => optional,
            other => OptionalSchema::new(other),
        }
    }

    /// Union of `self` and `other`, tried in that order.
    fn or(self, other: impl Into<Schema>) -> UnionSchema {
        match self.into() {
            Schema::Union(union) => union.or(other),
            first => UnionSchema::new(vec![first, other.into()]),
        }
    }
}

impl<T: Into<Schema>> IntoSchema for T {}
