//! # Primitive Schemas
//!
//! Leaf validators for a single value kind: [`StringSchema`],
//! [`NumberSchema`] and [`BooleanSchema`].
//!
//! ## Algorithm
//!
//! 1. Type check. A mismatch short-circuits before any refinement runs.
//! 2. String transforms (`trim`, case folding), in chain order.
//! 3. Refinements in chain order. The first failing refinement's message is
//!    the error; later refinements are skipped.
//!
//! Builders are consuming: every chain method appends to the schema's own
//! ordered check list and hands the same schema back.
//!
//! ## Coercion
//!
//! Query strings and form fields only ever carry strings, so numbers accept
//! numeric strings and booleans accept `"true"` / `"false"`.

use std::fmt;
use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde_json::Value;

use crate::error::ValidationError;
use crate::schema::Parse;

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";
const UUID_PATTERN: &str =
    r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-[1-5][0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}$";

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(EMAIL_PATTERN).expect("email pattern compiles"))
}

fn uuid_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(UUID_PATTERN).expect("uuid pattern compiles"))
}

// -- Shared check plumbing ----------------------------------------------------

/// A user-supplied predicate with the message reported when it fails.
pub struct Refinement<T: ?Sized> {
    predicate: Arc<dyn Fn(&T) -> bool + Send + Sync>,
    message: String,
}

impl<T: ?Sized> Refinement<T> {
    pub(crate) fn new(
        predicate: impl Fn(&T) -> bool + Send + Sync + 'static,
        message: impl Into<String>,
    ) -> Self {
        Self {
            predicate: Arc::new(predicate),
            message: message.into(),
        }
    }

    fn holds(&self, value: &T) -> bool {
        (self.predicate)(value)
    }
}

// Manual impl: a derive would demand `T: Clone`, which `str` is not.
impl<T: ?Sized> Clone for Refinement<T> {
    fn clone(&self) -> Self {
        Self {
            predicate: Arc::clone(&self.predicate),
            message: self.message.clone(),
        }
    }
}

impl<T: ?Sized> fmt::Debug for Refinement<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Refinement")
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

/// A rule plus an optional message overriding its default.
#[derive(Debug, Clone)]
pub(crate) struct Check<R> {
    pub(crate) rule: R,
    pub(crate) message: Option<String>,
}

impl<R> Check<R> {
    fn new(rule: R) -> Self {
        Self {
            rule,
            message: None,
        }
    }
}

/// Replace the message of the most recently added check.
fn override_last<R>(checks: &mut [Check<R>], message: String) {
    if let Some(last) = checks.last_mut() {
        last.message = Some(message);
    }
}

// -- String -------------------------------------------------------------------

/// Pure rewrite applied before string refinements run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringTransform {
    /// Strip leading and trailing whitespace.
    Trim,
    /// Lowercase the whole string.
    Lowercase,
    /// Uppercase the whole string.
    Uppercase,
}

impl StringTransform {
    fn apply(self, value: String) -> String {
        match self {
            Self::Trim => value.trim().to_string(),
            Self::Lowercase => value.to_lowercase(),
            Self::Uppercase => value.to_uppercase(),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) enum StringRule {
    Min(usize),
    Max(usize),
    Length(usize),
    Email,
    Url,
    Uuid,
    Regex(Regex),
    StartsWith(String),
    EndsWith(String),
    Custom(Refinement<str>),
}

/// Length in UTF-16 code units, the unit browsers and JSON clients count in.
fn text_length(value: &str) -> usize {
    value.encode_utf16().count()
}

impl StringRule {
    fn holds(&self, value: &str) -> bool {
        match self {
            Self::Min(n) => text_length(value) >= *n,
            Self::Max(n) => text_length(value) <= *n,
            Self::Length(n) => text_length(value) == *n,
            Self::Email => email_regex().is_match(value),
            Self::Url => url::Url::parse(value).is_ok(),
            Self::Uuid => uuid_regex().is_match(value),
            Self::Regex(re) => re.is_match(value),
            Self::StartsWith(prefix) => value.starts_with(prefix.as_str()),
            Self::EndsWith(suffix) => value.ends_with(suffix.as_str()),
            Self::Custom(refinement) => refinement.holds(value),
        }
    }

    fn default_message(&self) -> String {
        match self {
            Self::Min(n) => format!("String must contain at least {n} character(s)"),
            Self::Max(n) => format!("String must contain at most {n} character(s)"),
            Self::Length(n) => format!("String must contain exactly {n} character(s)"),
            Self::Email => "Invalid email address".to_string(),
            Self::Url => "Invalid URL".to_string(),
            Self::Uuid => "Invalid UUID".to_string(),
            Self::Regex(_) => "Invalid format".to_string(),
            Self::StartsWith(prefix) => format!("String must start with \"{prefix}\""),
            Self::EndsWith(suffix) => format!("String must end with \"{suffix}\""),
            Self::Custom(refinement) => refinement.message.clone(),
        }
    }
}

/// String validator.
///
/// ```
/// use zenith_schema::prelude::*;
///
/// let name = f::string().trim().min(2).max(50);
/// assert_eq!(name.safe_parse(&serde_json::json!("  Ada ")).unwrap(), "Ada");
/// ```
#[derive(Debug, Clone, Default)]
pub struct StringSchema {
    pub(crate) transforms: Vec<StringTransform>,
    pub(crate) checks: Vec<Check<StringRule>>,
}

impl StringSchema {
    /// Create a string schema with no refinements.
    pub fn new() -> Self {
        Self::default()
    }

    fn check(mut self, rule: StringRule) -> Self {
        self.checks.push(Check::new(rule));
        self
    }

    fn transform(mut self, transform: StringTransform) -> Self {
        self.transforms.push(transform);
        self
    }

    /// Length must be at least `len`.
    pub fn min(self, len: usize) -> Self {
        self.check(StringRule::Min(len))
    }

    /// Length must be at most `len`.
    pub fn max(self, len: usize) -> Self {
        self.check(StringRule::Max(len))
    }

    /// Length must be exactly `len`.
    pub fn length(self, len: usize) -> Self {
        self.check(StringRule::Length(len))
    }

    /// Must look like an email address.
    pub fn email(self) -> Self {
        self.check(StringRule::Email)
    }

    /// Must parse as an absolute URL.
    pub fn url(self) -> Self {
        self.check(StringRule::Url)
    }

    /// Must be an RFC 4122 UUID (versions 1–5), case-insensitive.
    pub fn uuid(self) -> Self {
        self.check(StringRule::Uuid)
    }

    /// Must match `pattern`.
    pub fn regex(self, pattern: Regex) -> Self {
        self.check(StringRule::Regex(pattern))
    }

    /// Must start with `prefix`.
    pub fn starts_with(self, prefix: impl Into<String>) -> Self {
        self.check(StringRule::StartsWith(prefix.into()))
    }

    /// Must end with `suffix`.
    pub fn ends_with(self, suffix: impl Into<String>) -> Self {
        self.check(StringRule::EndsWith(suffix.into()))
    }

    /// Custom predicate over the transformed string.
    pub fn refine(
        self,
        predicate: impl Fn(&str) -> bool + Send + Sync + 'static,
        message: impl Into<String>,
    ) -> Self {
        self.check(StringRule::Custom(Refinement::new(predicate, message)))
    }

    /// Override the message of the most recently added refinement.
    ///
    /// Has no effect when no refinement has been added yet.
    pub fn message(mut self, message: impl Into<String>) -> Self {
        override_last(&mut self.checks, message.into());
        self
    }

    /// Strip surrounding whitespace before refinements run.
    pub fn trim(self) -> Self {
        self.transform(StringTransform::Trim)
    }

    /// Lowercase before refinements run.
    pub fn to_lowercase(self) -> Self {
        self.transform(StringTransform::Lowercase)
    }

    /// Uppercase before refinements run.
    pub fn to_uppercase(self) -> Self {
        self.transform(StringTransform::Uppercase)
    }
}

impl Parse for StringSchema {
    fn validate(&self, input: Option<&Value>) -> Result<Option<Value>, ValidationError> {
        let Some(Value::String(raw)) = input else {
            return Err(ValidationError::type_mismatch("string", input));
        };

        let value = self
            .transforms
            .iter()
            .fold(raw.clone(), |acc, transform| transform.apply(acc));

        for check in &self.checks {
            if !check.rule.holds(&value) {
                let message = check
                    .message
                    .clone()
                    .unwrap_or_else(|| check.rule.default_message());
                return Err(ValidationError::new(message, input, "string"));
            }
        }

        Ok(Some(Value::String(value)))
    }
}

// -- Number -------------------------------------------------------------------

#[derive(Debug, Clone)]
pub(crate) enum NumberRule {
    Min(f64),
    Max(f64),
    Int,
    Positive,
    Negative,
    Finite,
    Custom(Refinement<f64>),
}

impl NumberRule {
    fn holds(&self, value: f64) -> bool {
        match self {
            Self::Min(n) => value >= *n,
            Self::Max(n) => value <= *n,
            Self::Int => value.is_finite() && value.fract() == 0.0,
            Self::Positive => value > 0.0,
            Self::Negative => value < 0.0,
            Self::Finite => value.is_finite(),
            Self::Custom(refinement) => refinement.holds(&value),
        }
    }

    fn default_message(&self) -> String {
        match self {
            Self::Min(n) => format!("Number must be greater than or equal to {n}"),
            Self::Max(n) => format!("Number must be less than or equal to {n}"),
            Self::Int => "Expected integer, received float".to_string(),
            Self::Positive => "Number must be greater than 0".to_string(),
            Self::Negative => "Number must be less than 0".to_string(),
            Self::Finite => "Number must be finite".to_string(),
            Self::Custom(refinement) => refinement.message.clone(),
        }
    }
}

/// Read a number out of `input`, parsing numeric strings. NaN and empty
/// strings yield `None`.
fn coerce_number(input: Option<&Value>) -> Option<f64> {
    let parsed = match input? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                trimmed.parse::<f64>().ok()
            }
        }
        _ => None,
    };
    parsed.filter(|n| !n.is_nan())
}

/// JSON encoding of a validated number. Integral values inside the `i64` or
/// `u64` range become JSON integers, so `"42"` and `42.0` validate to `42`.
fn number_value(n: f64) -> Option<Value> {
    if n.fract() == 0.0 {
        // `i64::MAX as f64` and `u64::MAX as f64` round up to 2^63 and 2^64.
        if n >= i64::MIN as f64 && n < i64::MAX as f64 {
            return Some(Value::from(n as i64));
        }
        if n >= 0.0 && n < u64::MAX as f64 {
            return Some(Value::from(n as u64));
        }
    }
    serde_json::Number::from_f64(n).map(Value::Number)
}

/// Number validator (`f64` semantics).
#[derive(Debug, Clone, Default)]
pub struct NumberSchema {
    pub(crate) checks: Vec<Check<NumberRule>>,
}

impl NumberSchema {
    /// Create a number schema with no refinements.
    pub fn new() -> Self {
        Self::default()
    }

    fn check(mut self, rule: NumberRule) -> Self {
        self.checks.push(Check::new(rule));
        self
    }

    /// Must be `>= n`.
    pub fn min(self, n: f64) -> Self {
        self.check(NumberRule::Min(n))
    }

    /// Must be `<= n`.
    pub fn max(self, n: f64) -> Self {
        self.check(NumberRule::Max(n))
    }

    /// Must be an integer.
    pub fn int(self) -> Self {
        self.check(NumberRule::Int)
    }

    /// Must be `> 0`.
    pub fn positive(self) -> Self {
        self.check(NumberRule::Positive)
    }

    /// Must be `< 0`.
    pub fn negative(self) -> Self {
        self.check(NumberRule::Negative)
    }

    /// Must be finite.
    pub fn finite(self) -> Self {
        self.check(NumberRule::Finite)
    }

    /// Custom predicate over the coerced number.
    pub fn refine(
        self,
        predicate: impl Fn(&f64) -> bool + Send + Sync + 'static,
        message: impl Into<String>,
    ) -> Self {
        self.check(NumberRule::Custom(Refinement::new(predicate, message)))
    }

    /// Override the message of the most recently added refinement.
    pub fn message(mut self, message: impl Into<String>) -> Self {
        override_last(&mut self.checks, message.into());
        self
    }
}

impl Parse for NumberSchema {
    fn validate(&self, input: Option<&Value>) -> Result<Option<Value>, ValidationError> {
        let Some(number) = coerce_number(input) else {
            return Err(ValidationError::type_mismatch("number", input));
        };

        for check in &self.checks {
            if !check.rule.holds(number) {
                let message = check
                    .message
                    .clone()
                    .unwrap_or_else(|| check.rule.default_message());
                return Err(ValidationError::new(message, input, "number"));
            }
        }

        // Native integers pass through untouched to keep full precision.
        if let Some(Value::Number(original)) = input {
            if original.is_i64() || original.is_u64() {
                return Ok(Some(Value::Number(original.clone())));
            }
        }
        number_value(number)
            .map(Some)
            .ok_or_else(|| ValidationError::new("Number must be finite", input, "number"))
    }
}

// -- Boolean ------------------------------------------------------------------

/// Boolean validator. Accepts native booleans and the strings
/// `"true"` / `"false"`.
#[derive(Debug, Clone, Default)]
pub struct BooleanSchema {
    pub(crate) checks: Vec<Refinement<bool>>,
}

impl BooleanSchema {
    /// Create a boolean schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Custom predicate over the coerced boolean.
    pub fn refine(
        mut self,
        predicate: impl Fn(&bool) -> bool + Send + Sync + 'static,
        message: impl Into<String>,
    ) -> Self {
        self.checks.push(Refinement::new(predicate, message));
        self
    }
}

impl Parse for BooleanSchema {
    fn validate(&self, input: Option<&Value>) -> Result<Option<Value>, ValidationError> {
        let value = match input {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) if s == "true" => true,
            Some(Value::String(s)) if s == "false" => false,
            other => return Err(ValidationError::type_mismatch("boolean", other)),
        };

        if let Some(failed) = self.checks.iter().find(|r| !r.holds(&value)) {
            return Err(ValidationError::new(
                failed.message.clone(),
                input,
                "boolean",
            ));
        }

        Ok(Some(Value::Bool(value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn string_rejects_non_strings_before_refinements() {
        let schema = StringSchema::new().min(100);
        let err = schema.safe_parse(&json!(5)).unwrap_err();
        assert_eq!(err.message, "Expected string, received number");
        assert_eq!(err.expected, "string");
    }

    #[test]
    fn string_length_bounds_are_inclusive() {
        let schema = StringSchema::new().min(2).max(50);
        assert!(schema.safe_parse(&json!("a")).is_err());
        assert!(schema.safe_parse(&json!("ab")).is_ok());
        assert!(schema.safe_parse(&json!("x".repeat(50))).is_ok());
        let err = schema.safe_parse(&json!("x".repeat(51))).unwrap_err();
        assert_eq!(err.message, "String must contain at most 50 character(s)");
    }

    #[test]
    fn first_failing_refinement_wins() {
        let schema = StringSchema::new().min(5).email();
        let err = schema.safe_parse(&json!("ab")).unwrap_err();
        assert_eq!(err.message, "String must contain at least 5 character(s)");
    }

    #[test]
    fn custom_message_overrides_last_refinement_only() {
        let schema = StringSchema::new()
            .min(2)
            .email()
            .message("Please provide a valid email");
        assert_eq!(
            schema.safe_parse(&json!("a")).unwrap_err().message,
            "String must contain at least 2 character(s)"
        );
        assert_eq!(
            schema.safe_parse(&json!("not-an-email")).unwrap_err().message,
            "Please provide a valid email"
        );
    }

    #[test]
    fn message_without_refinement_is_ignored() {
        let schema = StringSchema::new().message("unused");
        assert!(schema.safe_parse(&json!("anything")).is_ok());
    }

    #[test]
    fn transforms_run_before_refinements() {
        let schema = StringSchema::new().trim().to_lowercase().min(3);
        assert_eq!(schema.safe_parse(&json!("  ABC  ")).unwrap(), json!("abc"));
        assert!(schema.safe_parse(&json!("  AB  ")).is_err());
    }

    #[test]
    fn length_counts_utf16_units() {
        let schema = StringSchema::new().max(2);
        assert!(schema.safe_parse(&json!("éé")).is_ok());
        // One astral-plane character is two UTF-16 units.
        assert!(schema.safe_parse(&json!("😀")).is_ok());
        assert!(schema.safe_parse(&json!("😀a")).is_err());
    }

    #[test]
    fn email_pattern() {
        let schema = StringSchema::new().email();
        assert!(schema.safe_parse(&json!("ada@example.com")).is_ok());
        assert!(schema.safe_parse(&json!("ada@example")).is_err());
        assert!(schema.safe_parse(&json!("a da@example.com")).is_err());
        assert_eq!(
            schema.safe_parse(&json!("bad")).unwrap_err().message,
            "Invalid email address"
        );
    }

    #[test]
    fn url_requires_absolute_url() {
        let schema = StringSchema::new().url();
        assert!(schema.safe_parse(&json!("https://example.com/a?b=c")).is_ok());
        assert!(schema.safe_parse(&json!("/relative/path")).is_err());
        assert!(schema.safe_parse(&json!("example.com")).is_err());
    }

    #[test]
    fn uuid_checks_version_and_variant_nibbles() {
        let schema = StringSchema::new().uuid();
        assert!(schema
            .safe_parse(&json!("123e4567-e89b-42d3-a456-426614174000"))
            .is_ok());
        assert!(schema
            .safe_parse(&json!("123E4567-E89B-42D3-A456-426614174000"))
            .is_ok());
        // Version nibble 6 is outside 1..=5.
        assert!(schema
            .safe_parse(&json!("123e4567-e89b-62d3-a456-426614174000"))
            .is_err());
        // Variant nibble c is outside {8, 9, a, b}.
        assert!(schema
            .safe_parse(&json!("123e4567-e89b-42d3-c456-426614174000"))
            .is_err());
    }

    #[test]
    fn regex_and_affixes() {
        let schema = StringSchema::new()
            .regex(Regex::new("^[a-z-]+$").unwrap())
            .starts_with("post-")
            .ends_with("-draft");
        assert!(schema.safe_parse(&json!("post-hello-draft")).is_ok());
        assert_eq!(
            schema.safe_parse(&json!("Post")).unwrap_err().message,
            "Invalid format"
        );
        assert_eq!(
            schema.safe_parse(&json!("page-draft")).unwrap_err().message,
            "String must start with \"post-\""
        );
    }

    #[test]
    fn string_refine() {
        let schema = StringSchema::new().refine(|s| !s.contains(' '), "No spaces allowed");
        assert!(schema.safe_parse(&json!("slug")).is_ok());
        assert_eq!(
            schema.safe_parse(&json!("two words")).unwrap_err().message,
            "No spaces allowed"
        );
    }

    #[test]
    fn number_coerces_numeric_strings() {
        let schema = NumberSchema::new();
        assert_eq!(schema.safe_parse(&json!("42")).unwrap(), json!(42));
        assert_eq!(schema.safe_parse(&json!(" 2.5 ")).unwrap(), json!(2.5));
        let err = schema.safe_parse(&json!("abc")).unwrap_err();
        assert_eq!(err.message, "Expected number, received string");
        assert!(schema.safe_parse(&json!("")).is_err());
        assert!(schema.safe_parse(&json!(true)).is_err());
    }

    #[test]
    fn number_preserves_native_integers() {
        let schema = NumberSchema::new();
        assert_eq!(
            schema.safe_parse(&json!(u64::MAX)).unwrap(),
            json!(u64::MAX)
        );
    }

    #[test]
    fn number_emits_integral_floats_as_integers() {
        let schema = NumberSchema::new().int();
        let out = schema.safe_parse(&json!(30.0)).unwrap();
        assert!(out.is_u64());
        assert_eq!(out, json!(30));

        let out = NumberSchema::new().safe_parse(&json!("-7.0")).unwrap();
        assert_eq!(out.as_i64(), Some(-7));

        // Beyond u64 the value stays a float.
        let out = NumberSchema::new().safe_parse(&json!("1e20")).unwrap();
        assert!(out.is_f64());
        assert_eq!(NumberSchema::new().safe_parse(&json!(2.5)).unwrap(), json!(2.5));
    }

    #[test]
    fn refined_string_schema_clones() {
        let schema = StringSchema::new().refine(|s| s.len() > 2, "Too short");
        let copy = schema.clone();
        assert!(copy.safe_parse(&json!("ab")).is_err());
        assert!(schema.safe_parse(&json!("abc")).is_ok());
    }

    #[test]
    fn number_refinements() {
        assert!(NumberSchema::new().int().safe_parse(&json!(1.5)).is_err());
        assert!(NumberSchema::new().int().safe_parse(&json!(2)).is_ok());
        assert!(NumberSchema::new().positive().safe_parse(&json!(0)).is_err());
        assert!(NumberSchema::new().negative().safe_parse(&json!(-1)).is_ok());
        assert!(NumberSchema::new().min(1.0).safe_parse(&json!(1)).is_ok());
        assert_eq!(
            NumberSchema::new()
                .max(10.0)
                .safe_parse(&json!(11))
                .unwrap_err()
                .message,
            "Number must be less than or equal to 10"
        );
        assert!(NumberSchema::new().finite().safe_parse(&json!("inf")).is_err());
    }

    #[test]
    fn number_custom_message() {
        let schema = NumberSchema::new().min(18.0).message("Must be an adult");
        assert_eq!(
            schema.safe_parse(&json!(12)).unwrap_err().message,
            "Must be an adult"
        );
    }

    #[test]
    fn boolean_accepts_native_and_string_literals() {
        let schema = BooleanSchema::new();
        assert_eq!(schema.safe_parse(&json!(true)).unwrap(), json!(true));
        assert_eq!(schema.safe_parse(&json!("false")).unwrap(), json!(false));
        assert!(schema.safe_parse(&json!("yes")).is_err());
        assert!(schema.safe_parse(&json!(1)).is_err());
        assert!(schema.safe_parse(&json!("TRUE")).is_err());
    }

    #[test]
    fn boolean_refine() {
        let schema = BooleanSchema::new().refine(|b| *b, "Terms must be accepted");
        assert!(schema.safe_parse(&json!("true")).is_ok());
        assert_eq!(
            schema.safe_parse(&json!(false)).unwrap_err().message,
            "Terms must be accepted"
        );
    }
}
