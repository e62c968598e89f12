//! Declaration errors.

use fastfn_extract::ParamLocation;
use thiserror::Error;

/// A parameter or dependency was declared in a way that cannot be resolved.
///
/// These are raised when a route is registered, never while serving a
/// request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeclarationError {
    /// A dependency marker appears in both the annotation and the default.
    #[error("parameter '{param}': a dependency cannot be declared both in the annotation and as the default value")]
    DualDependency {
        /// Parameter name.
        param: String,
    },

    /// Two markers disagree about what the parameter is.
    #[error("parameter '{param}': {detail}")]
    ConflictingMarkers {
        /// Parameter name.
        param: String,
        /// What conflicts with what.
        detail: String,
    },

    /// A path placeholder was given a non-path field kind.
    #[error("path parameter '{param}' cannot be declared as a {kind} field")]
    PathKindMismatch {
        /// Parameter name.
        param: String,
        /// The kind that was requested.
        kind: ParamLocation,
    },

    /// A path marker names something that is not a placeholder.
    #[error("parameter '{param}' is marked as a path field but '{path}' has no such placeholder")]
    NotAPathPlaceholder {
        /// Parameter name.
        param: String,
        /// The route pattern.
        path: String,
    },

    /// Path values are single segments and must be scalar.
    #[error("path parameter '{param}' must have a scalar type")]
    NonScalarPath {
        /// Parameter name.
        param: String,
    },

    /// Path values are always required.
    #[error("path parameter '{param}' cannot have a default value")]
    PathDefault {
        /// Parameter name.
        param: String,
    },

    /// The same parameter name is declared twice on one callable.
    #[error("parameter '{param}' is declared more than once on '{owner}'")]
    DuplicateParam {
        /// Parameter name.
        param: String,
        /// The endpoint or dependency name.
        owner: String,
    },
}

impl DeclarationError {
    pub(crate) fn conflict(param: &str, detail: impl Into<String>) -> Self {
        Self::ConflictingMarkers {
            param: param.to_string(),
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_parameter() {
        let err = DeclarationError::PathKindMismatch {
            param: "item_id".to_string(),
            kind: ParamLocation::Query,
        };
        assert_eq!(
            err.to_string(),
            "path parameter 'item_id' cannot be declared as a query field"
        );
        let err = DeclarationError::conflict("q", "cannot mix Query and Header");
        assert_eq!(err.to_string(), "parameter 'q': cannot mix Query and Header");
    }
}
