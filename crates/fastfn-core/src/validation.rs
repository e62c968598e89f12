//! Location-tagged validation errors.
//!
//! Every error produced while extracting or validating request data carries
//! a location tuple such as `["query", "limit"]` or
//! `["body", "items", 2, "price"]`. Errors are accumulated, never replaced,
//! so that one failed request reports every bad field at once.

use std::fmt;

use serde::Serialize;
use serde_json::{json, Value};

/// One segment of an error location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum LocSegment {
    /// A category, alias or object key.
    Key(String),
    /// A position inside an array.
    Index(usize),
}

impl fmt::Display for LocSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.write_str(key),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

impl From<&str> for LocSegment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<String> for LocSegment {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<usize> for LocSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// An ordered error location.
pub type Loc = Vec<LocSegment>;

/// Build a [`Loc`] from mixed keys and indices.
///
/// ```
/// use fastfn_core::{loc, LocSegment};
///
/// let l = loc!["body", "items", 0_usize];
/// assert_eq!(l[2], LocSegment::Index(0));
/// ```
#[macro_export]
macro_rules! loc {
    ($($seg:expr),* $(,)?) => {
        vec![$($crate::LocSegment::from($seg)),*]
    };
}

/// A single validation failure.
///
/// Serializes as `{"type", "loc", "msg", "input"}` (plus `"ctx"` when the
/// failing constraint has parameters).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    /// Machine-readable error tag, e.g. `missing` or `int_parsing`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Where the offending value came from.
    pub loc: Loc,
    /// Human-readable message.
    pub msg: String,
    /// The rejected input, or null when absent.
    pub input: Value,
    /// Constraint parameters for the message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ctx: Option<Value>,
}

impl ValidationError {
    /// Create an error with an explicit tag and message.
    pub fn new(
        kind: impl Into<String>,
        loc: Loc,
        msg: impl Into<String>,
        input: Value,
    ) -> Self {
        Self {
            kind: kind.into(),
            loc,
            msg: msg.into(),
            input,
            ctx: None,
        }
    }

    /// A required field was absent.
    pub fn missing(loc: Loc) -> Self {
        Self::new("missing", loc, "Field required", Value::Null)
    }

    /// Attach constraint context.
    #[must_use]
    pub fn with_ctx(mut self, ctx: Value) -> Self {
        self.ctx = Some(ctx);
        self
    }

    /// Prefix the location with an enclosing segment list.
    #[must_use]
    pub fn with_prefix(mut self, prefix: &[LocSegment]) -> Self {
        let mut loc = prefix.to_vec();
        loc.append(&mut self.loc);
        self.loc = loc;
        self
    }

    /// The field this error belongs to: the last key in the location.
    pub fn field(&self) -> Option<&str> {
        self.loc.iter().rev().find_map(|seg| match seg {
            LocSegment::Key(key) => Some(key.as_str()),
            LocSegment::Index(_) => None,
        })
    }

    pub(crate) fn int_parsing(loc: Loc, input: Value) -> Self {
        Self::new(
            "int_parsing",
            loc,
            "Input should be a valid integer, unable to parse string as an integer",
            input,
        )
    }

    pub(crate) fn int_from_float(loc: Loc, input: Value) -> Self {
        Self::new(
            "int_from_float",
            loc,
            "Input should be a valid integer, got a number with a fractional part",
            input,
        )
    }

    pub(crate) fn type_error(kind: &str, loc: Loc, expected: &str, input: Value) -> Self {
        Self::new(kind, loc, format!("Input should be a valid {expected}"), input)
    }

    pub(crate) fn float_parsing(loc: Loc, input: Value) -> Self {
        Self::new(
            "float_parsing",
            loc,
            "Input should be a valid number, unable to parse string as a number",
            input,
        )
    }

    pub(crate) fn bool_parsing(loc: Loc, input: Value) -> Self {
        Self::new(
            "bool_parsing",
            loc,
            "Input should be a valid boolean, unable to interpret input",
            input,
        )
    }

    pub(crate) fn too_short_string(loc: Loc, input: Value, min_length: usize) -> Self {
        let unit = if min_length == 1 { "character" } else { "characters" };
        Self::new(
            "string_too_short",
            loc,
            format!("String should have at least {min_length} {unit}"),
            input,
        )
        .with_ctx(json!({ "min_length": min_length }))
    }

    pub(crate) fn too_long_string(loc: Loc, input: Value, max_length: usize) -> Self {
        let unit = if max_length == 1 { "character" } else { "characters" };
        Self::new(
            "string_too_long",
            loc,
            format!("String should have at most {max_length} {unit}"),
            input,
        )
        .with_ctx(json!({ "max_length": max_length }))
    }

    pub(crate) fn greater_than_equal(loc: Loc, input: Value, bound: Value) -> Self {
        Self::new(
            "greater_than_equal",
            loc,
            format!("Input should be greater than or equal to {bound}"),
            input,
        )
        .with_ctx(json!({ "ge": bound }))
    }

    pub(crate) fn less_than_equal(loc: Loc, input: Value, bound: Value) -> Self {
        Self::new(
            "less_than_equal",
            loc,
            format!("Input should be less than or equal to {bound}"),
            input,
        )
        .with_ctx(json!({ "le": bound }))
    }

    pub(crate) fn too_few_items(loc: Loc, input: Value, min: usize, actual: usize) -> Self {
        let unit = if min == 1 { "item" } else { "items" };
        Self::new(
            "too_short",
            loc,
            format!("List should have at least {min} {unit} after validation, not {actual}"),
            input,
        )
        .with_ctx(json!({ "field_type": "List", "min_length": min, "actual_length": actual }))
    }

    pub(crate) fn too_many_items(loc: Loc, input: Value, max: usize, actual: usize) -> Self {
        let unit = if max == 1 { "item" } else { "items" };
        Self::new(
            "too_long",
            loc,
            format!("List should have at most {max} {unit} after validation, not {actual}"),
            input,
        )
        .with_ctx(json!({ "field_type": "List", "max_length": max, "actual_length": actual }))
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path: Vec<String> = self.loc.iter().map(ToString::to_string).collect();
        write!(f, "{}: {}", path.join("."), self.msg)
    }
}
