//! Value extraction and validation.
//!
//! [`extract`] reads path, query and header fields from a [`ParamSource`];
//! [`extract_body`] reads body fields from the parsed JSON payload. Both
//! return every value that validated plus every error found, so callers
//! can merge results from many fields and sub-dependencies before deciding
//! whether the request failed.

use fastfn_core::{LocSegment, ValidationError};
use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::{FieldDescriptor, ParamLocation, ParamSource};

/// Values and errors produced by one extraction pass.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Extracted {
    /// Validated values keyed by parameter name.
    pub values: IndexMap<String, Value>,
    /// Every error found, in field order.
    pub errors: Vec<ValidationError>,
}

impl Extracted {
    /// True if no errors were collected.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    fn record(&mut self, name: &str, result: Result<Value, Vec<ValidationError>>) {
        match result {
            Ok(value) => {
                self.values.insert(name.to_string(), value);
            }
            Err(mut errors) => self.errors.append(&mut errors),
        }
    }
}

/// How body fields are located inside the request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyPolicy {
    /// The single body field receives the whole body.
    Raw,
    /// Each body field is looked up by alias inside the body mapping.
    Embedded,
}

impl BodyPolicy {
    /// Decide the policy for an endpoint's flattened body fields.
    ///
    /// More than one distinct field name, or any field marked `embed`,
    /// makes the body embedded.
    pub fn for_fields<'a, I>(fields: I) -> Self
    where
        I: IntoIterator<Item = &'a FieldDescriptor>,
    {
        let mut names: Vec<&str> = Vec::new();
        let mut embed = false;
        for field in fields {
            embed |= field.embed;
            if !names.contains(&field.name.as_str()) {
                names.push(&field.name);
            }
        }
        if embed || names.len() > 1 {
            Self::Embedded
        } else {
            Self::Raw
        }
    }
}

/// Extract non-body fields from one source.
///
/// Lookup is by alias, falling back to the name; an empty string counts as
/// absent. When the group is a single record-typed field, its sub-fields
/// are read individually from the source and the record is validated as a
/// whole, with errors located under the category alone.
///
/// # Example
///
/// ```rust
/// use fastfn_core::{loc, Schema};
/// use fastfn_extract::{extract, FieldDescriptor, ParamLocation};
/// use indexmap::IndexMap;
/// use serde_json::json;
///
/// let fields = vec![
///     FieldDescriptor::new("q", ParamLocation::Query, Schema::string()),
///     FieldDescriptor::new("limit", ParamLocation::Query, Schema::integer()).with_default(json!(10)),
/// ];
/// let query: IndexMap<String, String> = IndexMap::new();
///
/// let out = extract(&fields, &query);
/// assert_eq!(out.values.get("limit"), Some(&json!(10)));
/// assert_eq!(out.errors.len(), 1);
/// assert_eq!(out.errors[0].loc, loc!["query", "q"]);
/// ```
pub fn extract<S: ParamSource + ?Sized>(fields: &[FieldDescriptor], source: &S) -> Extracted {
    let mut out = Extracted::default();

    if let [field] = fields {
        if let Some(model) = field.schema.as_model() {
            let location = field.location;
            let mut raw = Map::new();
            for sub in &model.fields {
                let found = lookup(source, sub.loc_key()).or_else(|| lookup(source, &sub.name));
                if let Some(value) = found {
                    raw.insert(sub.loc_key().to_string(), Value::String(value.to_string()));
                }
            }
            let loc = [LocSegment::Key(location.as_str().to_string())];
            out.record(&field.name, field.schema.validate(&Value::Object(raw), &loc));
            return out;
        }
    }

    for field in fields {
        let raw = lookup(source, &field.alias)
            .or_else(|| lookup(source, &field.name))
            .map(|s| Value::String(s.to_string()));
        let loc = field_loc(field.location, &field.alias);
        out.record(&field.name, validate_field(field, raw.as_ref(), &loc));
    }
    out
}

/// Extract body fields from the parsed body.
///
/// Under [`BodyPolicy::Raw`] the single field receives the whole body and
/// errors are located at `("body",)`. Under [`BodyPolicy::Embedded`] each
/// field is read by its alias only from the body mapping and located at
/// `("body", alias)`. A body that is present but not a mapping is a
/// `missing` error for every field, defaulted or not; an absent or null
/// body leaves every field to its default.
pub fn extract_body(fields: &[FieldDescriptor], body: Option<&Value>, policy: BodyPolicy) -> Extracted {
    let mut out = Extracted::default();
    let body = body.filter(|b| !b.is_null());

    match (policy, fields) {
        (_, []) => {}
        (BodyPolicy::Raw, [field]) => {
            let loc = [LocSegment::Key(ParamLocation::Body.as_str().to_string())];
            out.record(&field.name, validate_field(field, body, &loc));
        }
        _ => {
            let object = match body {
                Some(body) => match body.as_object() {
                    Some(object) => Some(object),
                    None => {
                        for field in fields {
                            let loc = field_loc(ParamLocation::Body, &field.alias);
                            out.errors.push(ValidationError::missing(loc.to_vec()));
                        }
                        return out;
                    }
                },
                None => None,
            };
            for field in fields {
                let raw = object
                    .and_then(|o| o.get(&field.alias))
                    .filter(|v| !v.is_null());
                let loc = field_loc(ParamLocation::Body, &field.alias);
                out.record(&field.name, validate_field(field, raw, &loc));
            }
        }
    }
    out
}

/// Apply defaulting and validation to one raw value.
///
/// Absent and required is a `missing` error; absent with a default yields
/// a fresh copy of the default; present is always validated. A mapping
/// default of a record-typed field is run through the record so that its
/// own field defaults and factories fill in.
pub fn validate_field(
    field: &FieldDescriptor,
    raw: Option<&Value>,
    loc: &[LocSegment],
) -> Result<Value, Vec<ValidationError>> {
    match raw {
        Some(value) => field.schema.validate(value, loc),
        None => {
            let default = field
                .default
                .produce()
                .ok_or_else(|| vec![ValidationError::missing(loc.to_vec())])?;
            match field.schema.as_model() {
                Some(model) if default.is_object() => model.validate(&default, loc),
                _ => Ok(default),
            }
        }
    }
}

fn lookup<'s, S: ParamSource + ?Sized>(source: &'s S, key: &str) -> Option<&'s str> {
    source.get_raw(key).filter(|v| !v.is_empty())
}

fn field_loc(location: ParamLocation, alias: &str) -> [LocSegment; 2] {
    [
        LocSegment::Key(location.as_str().to_string()),
        LocSegment::Key(alias.to_string()),
    ]
}
