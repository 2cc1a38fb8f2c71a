//! # zenith-schema — Runtime Schema Validation
//!
//! Composable validators for untrusted JSON input: request bodies, query
//! strings and path parameters.
//!
//! ## Building Schemas
//!
//! Constructors live in the [`f`] module. Refinements chain on the
//! returned builder:
//!
//! ```
//! use zenith_schema::prelude::*;
//! use serde_json::json;
//!
//! let create_user = f::object()
//!     .field("name", f::string().min(2).max(50))
//!     .field("email", f::string().email().message("Please provide a valid email"))
//!     .field("role", f::enumeration(["admin", "user"]).optional().default_value("user"));
//!
//! let user = create_user
//!     .safe_parse(&json!({ "name": "Ada", "email": "ada@example.com" }))
//!     .unwrap();
//! assert_eq!(user["role"], "user");
//!
//! let err = create_user
//!     .safe_parse(&json!({ "name": "Ada", "email": "nope" }))
//!     .unwrap_err();
//! assert_eq!(err.path, vec!["email"]);
//! assert_eq!(err.message, "Please provide a valid email");
//! ```
//!
//! ## Outcomes
//!
//! - [`Parse::safe_parse`] returns the first violation as data
//!   ([`ValidationError`]). It never panics.
//! - [`Parse::parse`] wraps it in [`ValidationFailure`], the aggregate
//!   error that the HTTP layer turns into a 400 response.
//! - [`Parse::parse_into`] also deserializes the validated output into a
//!   Rust type.
//!
//! ## Crate Policy
//!
//! - No I/O and no async. Validation runs synchronously to completion.
//! - Schemas are immutable after construction and `Send + Sync`; share one
//!   instance across any number of concurrent validations.

pub mod collections;
pub mod combinators;
pub mod error;
pub mod json_schema;
pub mod object;
pub mod primitives;
pub mod schema;

pub use collections::ArraySchema;
pub use combinators::{EnumSchema, OptionalSchema, UnionSchema};
pub use error::{
    type_of, ErrorDetail, ParseError, ValidationError, ValidationErrorBody, ValidationFailure,
};
pub use object::ObjectSchema;
pub use primitives::{BooleanSchema, NumberSchema, Refinement, StringSchema, StringTransform};
pub use schema::{IntoSchema, Parse, Schema};

/// Schema constructors.
pub mod f {
    use crate::{
        ArraySchema, BooleanSchema, EnumSchema, NumberSchema, ObjectSchema, Schema, StringSchema,
        UnionSchema,
    };

    /// A string schema.
    pub fn string() -> StringSchema {
        StringSchema::new()
    }

    /// A number schema. Numeric strings are coerced.
    pub fn number() -> NumberSchema {
        NumberSchema::new()
    }

    /// A boolean schema. `"true"` / `"false"` are coerced.
    pub fn boolean() -> BooleanSchema {
        BooleanSchema::new()
    }

    /// An array whose elements must satisfy `item`.
    pub fn array(item: impl Into<Schema>) -> ArraySchema {
        ArraySchema::new(item)
    }

    /// An object with an empty shape; declare fields with
    /// [`ObjectSchema::field`].
    pub fn object() -> ObjectSchema {
        ObjectSchema::new()
    }

    /// One of a fixed set of strings.
    pub fn enumeration<I, S>(values: I) -> EnumSchema
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        EnumSchema::new(values)
    }

    /// First-match union of `alternatives`.
    pub fn union<I, S>(alternatives: I) -> UnionSchema
    where
        I: IntoIterator<Item = S>,
        S: Into<Schema>,
    {
        UnionSchema::new(alternatives.into_iter().map(Into::into).collect())
    }
}

/// Everything needed to declare and run schemas.
pub mod prelude {
    pub use crate::f;
    pub use crate::{
        ArraySchema, BooleanSchema, EnumSchema, IntoSchema, NumberSchema, ObjectSchema,
        OptionalSchema, Parse, Schema, StringSchema, UnionSchema, ValidationError,
        ValidationFailure,
    };
}
