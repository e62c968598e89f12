//! Route registration errors.

use thiserror::Error;

/// Errors raised while compiling a route pattern.
///
/// All of these surface at registration time; matching itself never fails.
#[derive(Debug, Error)]
pub enum RouteError {
    /// A placeholder named a converter that does not exist.
    #[error("unknown path converter '{converter}' in route '{path}'")]
    UnknownConverter {
        /// Converter name as written in the pattern.
        converter: String,
        /// The offending route pattern.
        path: String,
    },

    /// The same placeholder name appears twice in one pattern.
    #[error("duplicate path parameter '{name}' in route '{path}'")]
    DuplicateParam {
        /// Placeholder name.
        name: String,
        /// The offending route pattern.
        path: String,
    },

    /// A route was registered without any HTTP method.
    #[error("route '{path}' has no methods")]
    NoMethods {
        /// The offending route pattern.
        path: String,
    },

    /// The compiled expression was rejected by the regex engine.
    #[error("invalid route pattern '{path}': {source}")]
    InvalidPattern {
        /// The offending route pattern.
        path: String,
        /// Underlying regex error.
        #[source]
        source: regex::Error,
    },
}

impl RouteError {
    /// Create an unknown converter error.
    pub fn unknown_converter(converter: impl Into<String>, path: impl Into<String>) -> Self {
        Self::UnknownConverter {
            converter: converter.into(),
            path: path.into(),
        }
    }

    /// Create a duplicate parameter error.
    pub fn duplicate_param(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::DuplicateParam {
            name: name.into(),
            path: path.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_converter_display() {
        let err = RouteError::unknown_converter("uuid", "/items/{id:uuid}");
        assert_eq!(
            err.to_string(),
            "unknown path converter 'uuid' in route '/items/{id:uuid}'"
        );
    }

    #[test]
    fn test_duplicate_param_display() {
        let err = RouteError::duplicate_param("id", "/a/{id}/b/{id}");
        assert!(err.to_string().contains("duplicate path parameter 'id'"));
    }
}
