//! Field descriptors.

use std::fmt;

use fastfn_core::{FieldDefault, Schema};
use serde_json::Value;

/// Where in the request a field is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamLocation {
    /// Path parameters (e.g., `/users/{user_id}`)
    Path,
    /// Query string parameters
    Query,
    /// HTTP headers
    Header,
    /// Parsed JSON body
    Body,
}

impl ParamLocation {
    /// The name used as the first segment of error locations.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Header => "header",
            Self::Body => "body",
        }
    }
}

impl fmt::Display for ParamLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build-time description of one extractable value.
///
/// Descriptors are derived once per parameter when a route is registered
/// and shared read-only by every request for that route.
///
/// # Example
///
/// ```rust
/// use fastfn_core::Schema;
/// use fastfn_extract::{FieldDescriptor, ParamLocation};
/// use serde_json::json;
///
/// let limit = FieldDescriptor::new("limit", ParamLocation::Query, Schema::integer())
///     .with_default(json!(10));
/// assert!(!limit.is_required());
/// assert_eq!(limit.alias, "limit");
/// ```
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    /// Parameter name; the key the value is delivered under.
    pub name: String,
    /// Key looked up in the raw source before `name`.
    pub alias: String,
    /// Source location.
    pub location: ParamLocation,
    /// Declared shape.
    pub schema: Schema,
    /// Default when absent.
    pub default: FieldDefault,
    /// Force body fields to be looked up inside the body mapping.
    pub embed: bool,
}

impl FieldDescriptor {
    /// A required field whose alias is its name.
    pub fn new(name: impl Into<String>, location: ParamLocation, schema: Schema) -> Self {
        let name = name.into();
        Self {
            alias: name.clone(),
            name,
            location,
            schema,
            default: FieldDefault::Required,
            embed: false,
        }
    }

    /// Set the lookup alias.
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    /// Set a fixed default.
    #[must_use]
    pub fn with_default(mut self, value: Value) -> Self {
        self.default = FieldDefault::Value(value);
        self
    }

    /// Set any kind of default.
    #[must_use]
    pub fn with_field_default(mut self, default: FieldDefault) -> Self {
        self.default = default;
        self
    }

    /// Mark a body field as embedded.
    #[must_use]
    pub fn embedded(mut self, embed: bool) -> Self {
        self.embed = embed;
        self
    }

    /// True when absence is an error.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.default.is_required()
    }
}
