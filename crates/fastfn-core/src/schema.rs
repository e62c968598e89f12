//! Declared value shapes and the validation capability.
//!
//! A [`Schema`] describes what a parameter, body or response value must
//! look like. [`Schema::validate`] checks a JSON value against it and
//! returns the coerced value or every error found. Coercion is lax:
//! strings from query and header sources are accepted for numbers and
//! booleans, integral floats are accepted for integers, and unknown
//! object keys are dropped from models.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::{LocSegment, ValidationError};

/// Default applied when a field is absent.
#[derive(Clone, Default)]
pub enum FieldDefault {
    /// No default; absence is a `missing` error.
    #[default]
    Required,
    /// A fixed value, cloned on every use.
    Value(Value),
    /// A factory called afresh on every use.
    Factory(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl FieldDefault {
    /// Wrap a factory closure.
    pub fn factory<F>(f: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        Self::Factory(Arc::new(f))
    }

    /// True when absence is an error.
    #[must_use]
    pub fn is_required(&self) -> bool {
        matches!(self, Self::Required)
    }

    /// Produce the default value, or `None` if the field is required.
    #[must_use]
    pub fn produce(&self) -> Option<Value> {
        match self {
            Self::Required => None,
            Self::Value(value) => Some(value.clone()),
            Self::Factory(factory) => Some(factory()),
        }
    }
}

impl fmt::Debug for FieldDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required => f.write_str("Required"),
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

impl From<Value> for FieldDefault {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

/// One field of a [`ModelSchema`].
#[derive(Debug, Clone)]
pub struct ModelField {
    /// Field name; the key in validated output.
    pub name: String,
    /// Alternate input key, looked up before `name`.
    pub alias: Option<String>,
    /// Field shape.
    pub schema: Schema,
    /// Default when absent.
    pub default: FieldDefault,
}

impl ModelField {
    /// A required field.
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            alias: None,
            schema,
            default: FieldDefault::Required,
        }
    }

    /// Set the input alias.
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Set a fixed default.
    #[must_use]
    pub fn default_value(mut self, value: Value) -> Self {
        self.default = FieldDefault::Value(value);
        self
    }

    /// Set a default factory.
    #[must_use]
    pub fn default_factory<F>(mut self, f: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.default = FieldDefault::factory(f);
        self
    }

    /// The key used in error locations: the alias if any, else the name.
    #[must_use]
    pub fn loc_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// A named record type with ordered fields.
#[derive(Debug, Clone)]
pub struct ModelSchema {
    /// Model name used in messages.
    pub name: String,
    /// Fields in declaration order.
    pub fields: Vec<ModelField>,
}

impl ModelSchema {
    /// Create an empty model.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Append a field.
    #[must_use]
    pub fn field(mut self, field: ModelField) -> Self {
        self.fields.push(field);
        self
    }

    /// Validate an object against this model.
    ///
    /// Each field is looked up by alias first and then by name. Keys not
    /// declared on the model are dropped.
    pub fn validate(&self, value: &Value, loc: &[LocSegment]) -> Result<Value, Vec<ValidationError>> {
        let Some(object) = value.as_object() else {
            return Err(vec![ValidationError::new(
                "model_type",
                loc.to_vec(),
                format!(
                    "Input should be a valid dictionary or instance of {}",
                    self.name
                ),
                value.clone(),
            )]);
        };

        let mut out = Map::with_capacity(self.fields.len());
        let mut errors = Vec::new();
        for field in &self.fields {
            let raw = field
                .alias
                .as_deref()
                .and_then(|alias| object.get(alias))
                .or_else(|| object.get(&field.name));
            let mut field_loc = loc.to_vec();
            field_loc.push(LocSegment::Key(field.loc_key().to_string()));

            match raw {
                Some(raw) => match field.schema.validate(raw, &field_loc) {
                    Ok(v) => {
                        out.insert(field.name.clone(), v);
                    }
                    Err(mut errs) => errors.append(&mut errs),
                },
                None => match field.default.produce() {
                    Some(default) => {
                        out.insert(field.name.clone(), default);
                    }
                    None => errors.push(ValidationError::missing(field_loc)),
                },
            }
        }

        if errors.is_empty() {
            Ok(Value::Object(out))
        } else {
            Err(errors)
        }
    }
}

/// The declared shape of a value.
#[derive(Debug, Clone)]
pub enum Schema {
    /// Text.
    String {
        /// Minimum length in characters.
        min_length: Option<usize>,
        /// Maximum length in characters.
        max_length: Option<usize>,
    },
    /// Whole number.
    Integer {
        /// Inclusive lower bound.
        minimum: Option<i64>,
        /// Inclusive upper bound.
        maximum: Option<i64>,
    },
    /// Floating point number.
    Number {
        /// Inclusive lower bound.
        minimum: Option<f64>,
        /// Inclusive upper bound.
        maximum: Option<f64>,
    },
    /// true/false.
    Boolean,
    /// Homogeneous list.
    Array {
        /// Item shape.
        items: Box<Schema>,
        /// Minimum item count.
        min_items: Option<usize>,
        /// Maximum item count.
        max_items: Option<usize>,
    },
    /// String-keyed mapping with homogeneous values.
    Map {
        /// Value shape.
        values: Box<Schema>,
    },
    /// A record type.
    Model(Arc<ModelSchema>),
    /// The inner shape or null.
    Optional(Box<Schema>),
    /// Anything, passed through untouched.
    Any,
}

impl Schema {
    /// A string with no constraints.
    #[must_use]
    pub const fn string() -> Self {
        Self::String {
            min_length: None,
            max_length: None,
        }
    }

    /// An integer with no bounds.
    ///
    /// Values are held as `i64`; larger inputs fail with `int_parsing`.
    #[must_use]
    pub const fn integer() -> Self {
        Self::Integer {
            minimum: None,
            maximum: None,
        }
    }

    /// A number with no bounds.
    #[must_use]
    pub const fn number() -> Self {
        Self::Number {
            minimum: None,
            maximum: None,
        }
    }

    /// A boolean.
    #[must_use]
    pub const fn boolean() -> Self {
        Self::Boolean
    }

    /// A list of `items`.
    #[must_use]
    pub fn array(items: Self) -> Self {
        Self::Array {
            items: Box::new(items),
            min_items: None,
            max_items: None,
        }
    }

    /// A mapping with values of shape `values`.
    #[must_use]
    pub fn map(values: Self) -> Self {
        Self::Map {
            values: Box::new(values),
        }
    }

    /// A record type.
    #[must_use]
    pub fn model(model: ModelSchema) -> Self {
        Self::Model(Arc::new(model))
    }

    /// `inner` or null.
    #[must_use]
    pub fn optional(inner: Self) -> Self {
        Self::Optional(Box::new(inner))
    }

    /// Anything.
    #[must_use]
    pub const fn any() -> Self {
        Self::Any
    }

    /// Set a minimum string length or item count.
    #[must_use]
    pub fn min_length(mut self, n: usize) -> Self {
        match &mut self {
            Self::String { min_length, .. } => *min_length = Some(n),
            Self::Array { min_items, .. } => *min_items = Some(n),
            Self::Optional(inner) => **inner = (**inner).clone().min_length(n),
            _ => {}
        }
        self
    }

    /// Set a maximum string length or item count.
    #[must_use]
    pub fn max_length(mut self, n: usize) -> Self {
        match &mut self {
            Self::String { max_length, .. } => *max_length = Some(n),
            Self::Array { max_items, .. } => *max_items = Some(n),
            Self::Optional(inner) => **inner = (**inner).clone().max_length(n),
            _ => {}
        }
        self
    }

    /// Set an inclusive lower bound on a numeric shape.
    #[must_use]
    pub fn ge(mut self, bound: i64) -> Self {
        match &mut self {
            Self::Integer { minimum, .. } => *minimum = Some(bound),
            Self::Number { minimum, .. } => *minimum = Some(bound as f64),
            Self::Optional(inner) => **inner = (**inner).clone().ge(bound),
            _ => {}
        }
        self
    }

    /// Set an inclusive upper bound on a numeric shape.
    #[must_use]
    pub fn le(mut self, bound: i64) -> Self {
        match &mut self {
            Self::Integer { maximum, .. } => *maximum = Some(bound),
            Self::Number { maximum, .. } => *maximum = Some(bound as f64),
            Self::Optional(inner) => **inner = (**inner).clone().le(bound),
            _ => {}
        }
        self
    }

    /// True for values that fit in a single query or header string.
    ///
    /// Lists, mappings and models are complex; everything else is scalar.
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        match self {
            Self::String { .. } | Self::Integer { .. } | Self::Number { .. } | Self::Boolean | Self::Any => true,
            Self::Array { .. } | Self::Map { .. } | Self::Model(_) => false,
            Self::Optional(inner) => inner.is_scalar(),
        }
    }

    /// The record type, looking through `Optional`.
    #[must_use]
    pub fn as_model(&self) -> Option<&Arc<ModelSchema>> {
        match self {
            Self::Model(model) => Some(model),
            Self::Optional(inner) => inner.as_model(),
            _ => None,
        }
    }

    /// Validate `value`, returning the coerced value or every error found.
    ///
    /// `loc` prefixes the location of each returned error.
    ///
    /// # Example
    ///
    /// ```
    /// use fastfn_core::{loc, Schema};
    /// use serde_json::json;
    ///
    /// let schema = Schema::integer().ge(1);
    /// assert_eq!(schema.validate(&json!("10"), &loc!["query", "limit"]).unwrap(), json!(10));
    ///
    /// let errors = schema.validate(&json!("ten"), &loc!["query", "limit"]).unwrap_err();
    /// assert_eq!(errors[0].kind, "int_parsing");
    /// ```
    pub fn validate(&self, value: &Value, loc: &[LocSegment]) -> Result<Value, Vec<ValidationError>> {
        match self {
            Self::Any => Ok(value.clone()),
            Self::Optional(inner) => {
                if value.is_null() {
                    Ok(Value::Null)
                } else {
                    inner.validate(value, loc)
                }
            }
            Self::String {
                min_length,
                max_length,
            } => {
                let Some(s) = value.as_str() else {
                    return Err(vec![ValidationError::type_error(
                        "string_type",
                        loc.to_vec(),
                        "string",
                        value.clone(),
                    )]);
                };
                let len = s.chars().count();
                if let Some(min) = *min_length {
                    if len < min {
                        return Err(vec![ValidationError::too_short_string(
                            loc.to_vec(),
                            value.clone(),
                            min,
                        )]);
                    }
                }
                if let Some(max) = *max_length {
                    if len > max {
                        return Err(vec![ValidationError::too_long_string(
                            loc.to_vec(),
                            value.clone(),
                            max,
                        )]);
                    }
                }
                Ok(value.clone())
            }
            Self::Integer { minimum, maximum } => {
                let n = coerce_int(value, loc).map_err(|e| vec![e])?;
                if let Some(min) = *minimum {
                    if n < min {
                        return Err(vec![ValidationError::greater_than_equal(
                            loc.to_vec(),
                            value.clone(),
                            Value::from(min),
                        )]);
                    }
                }
                if let Some(max) = *maximum {
                    if n > max {
                        return Err(vec![ValidationError::less_than_equal(
                            loc.to_vec(),
                            value.clone(),
                            Value::from(max),
                        )]);
                    }
                }
                Ok(Value::from(n))
            }
            Self::Number { minimum, maximum } => {
                let n = coerce_float(value, loc).map_err(|e| vec![e])?;
                if let Some(min) = *minimum {
                    if n < min {
                        return Err(vec![ValidationError::greater_than_equal(
                            loc.to_vec(),
                            value.clone(),
                            Value::from(min),
                        )]);
                    }
                }
                if let Some(max) = *maximum {
                    if n > max {
                        return Err(vec![ValidationError::less_than_equal(
                            loc.to_vec(),
                            value.clone(),
                            Value::from(max),
                        )]);
                    }
                }
                // Integral JSON numbers stay integral.
                if value.is_i64() || value.is_u64() {
                    Ok(value.clone())
                } else {
                    Ok(Value::from(n))
                }
            }
            Self::Boolean => coerce_bool(value, loc).map(Value::Bool).map_err(|e| vec![e]),
            Self::Array {
                items,
                min_items,
                max_items,
            } => {
                let Some(list) = value.as_array() else {
                    return Err(vec![ValidationError::type_error(
                        "list_type",
                        loc.to_vec(),
                        "list",
                        value.clone(),
                    )]);
                };
                let mut out = Vec::with_capacity(list.len());
                let mut errors = Vec::new();
                for (index, item) in list.iter().enumerate() {
                    let mut item_loc = loc.to_vec();
                    item_loc.push(LocSegment::Index(index));
                    match items.validate(item, &item_loc) {
                        Ok(v) => out.push(v),
                        Err(mut errs) => errors.append(&mut errs),
                    }
                }
                if !errors.is_empty() {
                    return Err(errors);
                }
                if let Some(min) = *min_items {
                    if out.len() < min {
                        return Err(vec![ValidationError::too_few_items(
                            loc.to_vec(),
                            value.clone(),
                            min,
                            out.len(),
                        )]);
                    }
                }
                if let Some(max) = *max_items {
                    if out.len() > max {
                        return Err(vec![ValidationError::too_many_items(
                            loc.to_vec(),
                            value.clone(),
                            max,
                            out.len(),
                        )]);
                    }
                }
                Ok(Value::Array(out))
            }
            Self::Map { values } => {
                let Some(object) = value.as_object() else {
                    return Err(vec![ValidationError::type_error(
                        "dict_type",
                        loc.to_vec(),
                        "dictionary",
                        value.clone(),
                    )]);
                };
                let mut out = Map::with_capacity(object.len());
                let mut errors = Vec::new();
                for (key, item) in object {
                    let mut item_loc = loc.to_vec();
                    item_loc.push(LocSegment::Key(key.clone()));
                    match values.validate(item, &item_loc) {
                        Ok(v) => {
                            out.insert(key.clone(), v);
                        }
                        Err(mut errs) => errors.append(&mut errs),
                    }
                }
                if errors.is_empty() {
                    Ok(Value::Object(out))
                } else {
                    Err(errors)
                }
            }
            Self::Model(model) => model.validate(value, loc),
        }
    }
}

/// Integers are 64-bit signed; anything outside `i64` is `int_parsing`.
fn coerce_int(value: &Value, loc: &[LocSegment]) -> Result<i64, ValidationError> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(i);
            }
            match n.as_f64() {
                #[allow(clippy::cast_possible_truncation)]
                Some(f) if f.fract() == 0.0 && f.is_finite() && f.abs() < 9.0e15 => Ok(f as i64),
                Some(f) if f.fract() != 0.0 => Err(ValidationError::int_from_float(loc.to_vec(), value.clone())),
                _ => Err(ValidationError::int_parsing(loc.to_vec(), value.clone())),
            }
        }
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| ValidationError::int_parsing(loc.to_vec(), value.clone())),
        Value::Bool(b) => Ok(i64::from(*b)),
        _ => Err(ValidationError::type_error(
            "int_type",
            loc.to_vec(),
            "integer",
            value.clone(),
        )),
    }
}

fn coerce_float(value: &Value, loc: &[LocSegment]) -> Result<f64, ValidationError> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| ValidationError::float_parsing(loc.to_vec(), value.clone())),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .ok_or_else(|| ValidationError::float_parsing(loc.to_vec(), value.clone())),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        _ => Err(ValidationError::type_error(
            "float_type",
            loc.to_vec(),
            "number",
            value.clone(),
        )),
    }
}

fn coerce_bool(value: &Value, loc: &[LocSegment]) -> Result<bool, ValidationError> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(ValidationError::bool_parsing(loc.to_vec(), value.clone())),
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "on" | "t" | "true" | "y" | "yes" => Ok(true),
            "0" | "off" | "f" | "false" | "n" | "no" => Ok(false),
            _ => Err(ValidationError::bool_parsing(loc.to_vec(), value.clone())),
        },
        _ => Err(ValidationError::type_error(
            "bool_type",
            loc.to_vec(),
            "boolean",
            value.clone(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loc;
    use serde_json::json;

    fn item_model() -> ModelSchema {
        ModelSchema::new("Item")
            .field(ModelField::new("name", Schema::string()))
            .field(ModelField::new("price", Schema::number().ge(0)))
            .field(ModelField::new("tags", Schema::array(Schema::string())).default_factory(|| json!([])))
    }

    #[test]
    fn test_integer_coercion() {
        let s = Schema::integer();
        assert_eq!(s.validate(&json!(5), &[]).unwrap(), json!(5));
        assert_eq!(s.validate(&json!(" 12 "), &[]).unwrap(), json!(12));
        assert_eq!(s.validate(&json!(3.0), &[]).unwrap(), json!(3));
        assert_eq!(s.validate(&json!(3.5), &[]).unwrap_err()[0].kind, "int_from_float");
        assert_eq!(s.validate(&json!("abc"), &[]).unwrap_err()[0].kind, "int_parsing");
        assert_eq!(s.validate(&json!(null), &[]).unwrap_err()[0].kind, "int_type");
    }

    #[test]
    fn test_integer_outside_i64_is_parsing_error() {
        let s = Schema::integer();
        let err = &s
            .validate(&json!("12345678901234567890"), &loc!["path", "item_id"])
            .unwrap_err()[0];
        assert_eq!(err.kind, "int_parsing");
        assert_eq!(err.input, json!("12345678901234567890"));
        assert_eq!(
            s.validate(&json!(12_345_678_901_234_567_890_u64), &[]).unwrap_err()[0].kind,
            "int_parsing"
        );
        assert_eq!(
            s.validate(&json!("9223372036854775807"), &[]).unwrap(),
            json!(i64::MAX)
        );
    }

    #[test]
    fn test_integer_bounds() {
        let s = Schema::integer().ge(1).le(100);
        let err = &s.validate(&json!(0), &loc!["query", "limit"]).unwrap_err()[0];
        assert_eq!(err.kind, "greater_than_equal");
        assert_eq!(err.msg, "Input should be greater than or equal to 1");
        assert_eq!(err.ctx, Some(json!({"ge": 1})));
        assert_eq!(s.validate(&json!(101), &[]).unwrap_err()[0].kind, "less_than_equal");
    }

    #[test]
    fn test_boolean_strings() {
        let s = Schema::boolean();
        for t in ["true", "1", "yes", "On"] {
            assert_eq!(s.validate(&json!(t), &[]).unwrap(), json!(true));
        }
        for f in ["false", "0", "no", "off"] {
            assert_eq!(s.validate(&json!(f), &[]).unwrap(), json!(false));
        }
        assert_eq!(s.validate(&json!("maybe"), &[]).unwrap_err()[0].kind, "bool_parsing");
    }

    #[test]
    fn test_string_rejects_numbers() {
        let err = &Schema::string().validate(&json!(1), &loc!["body", "name"]).unwrap_err()[0];
        assert_eq!(err.kind, "string_type");
        assert_eq!(err.msg, "Input should be a valid string");
    }

    #[test]
    fn test_string_length() {
        let s = Schema::string().min_length(2).max_length(3);
        assert!(s.validate(&json!("ab"), &[]).is_ok());
        assert_eq!(s.validate(&json!("a"), &[]).unwrap_err()[0].kind, "string_too_short");
        assert_eq!(s.validate(&json!("abcd"), &[]).unwrap_err()[0].kind, "string_too_long");
    }

    #[test]
    fn test_array_errors_carry_index() {
        let s = Schema::array(Schema::integer());
        let errors = s.validate(&json!([1, "x", 3, "y"]), &loc!["body"]).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].loc, loc!["body", 1_usize]);
        assert_eq!(errors[1].loc, loc!["body", 3_usize]);
    }

    #[test]
    fn test_model_drops_extra_fields_and_applies_defaults() {
        let s = Schema::model(item_model());
        let out = s
            .validate(&json!({"name": "pen", "price": "1.5", "secret": true}), &loc!["body"])
            .unwrap();
        assert_eq!(out, json!({"name": "pen", "price": 1.5, "tags": []}));
    }

    #[test]
    fn test_model_collects_every_error() {
        let s = Schema::model(item_model());
        let errors = s.validate(&json!({"price": -1}), &loc!["body", "item"]).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].loc, loc!["body", "item", "name"]);
        assert_eq!(errors[0].kind, "missing");
        assert_eq!(errors[1].loc, loc!["body", "item", "price"]);
    }

    #[test]
    fn test_model_rejects_non_object() {
        let errors = Schema::model(item_model()).validate(&json!([1]), &loc!["body"]).unwrap_err();
        assert_eq!(errors[0].kind, "model_type");
        assert_eq!(errors[0].msg, "Input should be a valid dictionary or instance of Item");
    }

    #[test]
    fn test_model_alias_takes_precedence_over_name() {
        let model = ModelSchema::new("Filter")
            .field(ModelField::new("item_id", Schema::integer()).alias("item-id"));
        let s = Schema::model(model);
        assert_eq!(
            s.validate(&json!({"item-id": 1, "item_id": 2}), &[]).unwrap(),
            json!({"item_id": 1})
        );
        assert_eq!(s.validate(&json!({"item_id": 2}), &[]).unwrap(), json!({"item_id": 2}));
        let errors = s.validate(&json!({}), &loc!["query"]).unwrap_err();
        assert_eq!(errors[0].loc, loc!["query", "item-id"]);
    }

    #[test]
    fn test_factory_default_is_fresh() {
        let s = Schema::model(item_model());
        let a = s.validate(&json!({"name": "a", "price": 1}), &[]).unwrap();
        let b = s.validate(&json!({"name": "b", "price": 2}), &[]).unwrap();
        assert_eq!(a["tags"], json!([]));
        assert_eq!(b["tags"], json!([]));
    }

    #[test]
    fn test_optional_accepts_null() {
        let s = Schema::optional(Schema::integer());
        assert_eq!(s.validate(&json!(null), &[]).unwrap(), json!(null));
        assert_eq!(s.validate(&json!("4"), &[]).unwrap(), json!(4));
    }

    #[test]
    fn test_is_scalar() {
        assert!(Schema::string().is_scalar());
        assert!(Schema::optional(Schema::integer()).is_scalar());
        assert!(!Schema::array(Schema::string()).is_scalar());
        assert!(!Schema::map(Schema::any()).is_scalar());
        assert!(!Schema::model(item_model()).is_scalar());
        assert!(Schema::optional(Schema::model(item_model())).as_model().is_some());
    }

    #[test]
    fn test_map_validates_values() {
        let s = Schema::map(Schema::integer());
        let errors = s.validate(&json!({"a": 1, "b": "x"}), &loc!["body"]).unwrap_err();
        assert_eq!(errors[0].loc, loc!["body", "b"]);
    }
}
