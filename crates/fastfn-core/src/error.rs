//! Error types for fastfn.
//!
//! [`FastfnError`] is the error every resolution, extraction and endpoint
//! step returns. It splits into the request's fault and the programmer's:
//!
//! | Variant              | Category     | Status              |
//! |----------------------|--------------|---------------------|
//! | `RequestValidation`  | `Validation` | 422                 |
//! | `Http`               | `Http`       | exception's status  |
//! | `DependencyFault`    | `Dependency` | 500                 |
//! | `ResponseValidation` | `Internal`   | 500                 |
//! | `Internal`           | `Internal`   | 500                 |
//!
//! [`FastfnError::into_response`] renders each one as the JSON body the
//! client sees. Fault details never reach the client unless debug mode is on.

use std::fmt;

use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::{Response, ValidationError};

/// Result type alias using [`FastfnError`].
pub type FastfnResult<T> = Result<T, FastfnError>;

/// Broad classification of a [`FastfnError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Request data failed extraction or validation.
    Validation,
    /// An endpoint or dependency raised an HTTP exception.
    Http,
    /// A dependency was declared with an unusable shape.
    Dependency,
    /// Anything else that went wrong on the server side.
    Internal,
}

impl ErrorCategory {
    /// Returns the default HTTP status code for this error category.
    #[must_use]
    pub const fn default_status_code(&self) -> StatusCode {
        match self {
            Self::Validation => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Http => StatusCode::BAD_REQUEST,
            Self::Dependency | Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// An HTTP error raised deliberately by an endpoint or dependency.
///
/// # Example
///
/// ```
/// use fastfn_core::HttpException;
/// use http::StatusCode;
///
/// let exc = HttpException::new(StatusCode::NOT_FOUND).detail("Item not found");
/// assert_eq!(exc.status(), StatusCode::NOT_FOUND);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct HttpException {
    status: StatusCode,
    detail: Value,
    headers: HeaderMap,
}

impl HttpException {
    /// An exception whose detail is the status's reason phrase.
    #[must_use]
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            detail: Value::String(status.canonical_reason().unwrap_or("").to_string()),
            headers: HeaderMap::new(),
        }
    }

    /// Replace the detail payload.
    #[must_use]
    pub fn detail(mut self, detail: impl Into<Value>) -> Self {
        self.detail = detail.into();
        self
    }

    /// Add a response header.
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Detail payload.
    pub fn detail_value(&self) -> &Value {
        &self.detail
    }

    /// Extra response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

impl fmt::Display for HttpException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            Value::String(s) => write!(f, "{}: {}", self.status.as_u16(), s),
            other => write!(f, "{}: {}", self.status.as_u16(), other),
        }
    }
}

impl std::error::Error for HttpException {}

/// Standard error type for fastfn.
#[derive(Error, Debug)]
pub enum FastfnError {
    /// One or more request fields failed extraction or validation.
    #[error("request validation failed with {} error(s)", .errors.len())]
    RequestValidation {
        /// Every collected error.
        errors: Vec<ValidationError>,
    },

    /// An HTTP exception raised on purpose.
    #[error("http exception {0}")]
    Http(#[from] HttpException),

    /// A dependency cannot be invoked as declared.
    #[error("dependency fault: {message}")]
    DependencyFault {
        /// What is wrong with the declaration.
        message: String,
    },

    /// The endpoint's return value did not fit its declared response shape.
    #[error("response validation failed with {} error(s)", .errors.len())]
    ResponseValidation {
        /// Every collected error.
        errors: Vec<ValidationError>,
    },

    /// Internal server error.
    #[error("internal error: {message}")]
    Internal {
        /// Human-readable error message.
        message: String,
        /// The underlying error (not exposed to clients).
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl FastfnError {
    /// A validation failure carrying every collected error.
    #[must_use]
    pub fn validation(errors: Vec<ValidationError>) -> Self {
        Self::RequestValidation { errors }
    }

    /// Shortcut for an [`HttpException`] with a detail message.
    #[must_use]
    pub fn http(status: StatusCode, detail: impl Into<Value>) -> Self {
        Self::Http(HttpException::new(status).detail(detail))
    }

    /// A dependency-shape fault.
    #[must_use]
    pub fn dependency_fault(message: impl Into<String>) -> Self {
        Self::DependencyFault {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an internal error with a source error.
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::RequestValidation { .. } => ErrorCategory::Validation,
            Self::Http(_) => ErrorCategory::Http,
            Self::DependencyFault { .. } => ErrorCategory::Dependency,
            Self::ResponseValidation { .. } | Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Http(exc) => exc.status,
            other => other.category().default_status_code(),
        }
    }

    /// True for errors caused by a server-side defect rather than the request.
    #[must_use]
    pub fn is_fault(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Dependency | ErrorCategory::Internal
        )
    }

    /// The validation errors carried by this error, if any.
    pub fn validation_errors(&self) -> Option<&[ValidationError]> {
        match self {
            Self::RequestValidation { errors } | Self::ResponseValidation { errors } => {
                Some(errors)
            }
            _ => None,
        }
    }

    /// Render this error as the response a client receives.
    ///
    /// With `debug` off, faults collapse to a generic
    /// `{"detail": "Internal Server Error"}`.
    pub fn into_response(self, debug: bool) -> Response {
        let status = self.status_code();
        match self {
            Self::RequestValidation { errors } => json_response(status, &json!({ "detail": errors })),
            Self::Http(exc) => {
                let mut response = if matches!(status, StatusCode::NO_CONTENT | StatusCode::NOT_MODIFIED) {
                    Response::empty(status)
                } else {
                    json_response(status, &json!({ "detail": exc.detail }))
                };
                for (name, value) in &exc.headers {
                    response.headers_mut().insert(name.clone(), value.clone());
                }
                response
            }
            fault => {
                let body = if debug {
                    let mut body = json!({
                        "detail": fault.to_string(),
                        "type": fault.category(),
                    });
                    if let Some(errors) = fault.validation_errors() {
                        body["errors"] = json!(errors);
                    }
                    body
                } else {
                    json!({ "detail": "Internal Server Error" })
                };
                json_response(status, &body)
            }
        }
    }
}

fn json_response(status: StatusCode, body: &Value) -> Response {
    // Serializing a `Value` cannot fail.
    Response::json_with_status(status, body).unwrap_or_else(|_| Response::empty(status))
}

impl From<serde_json::Error> for FastfnError {
    fn from(err: serde_json::Error) -> Self {
        Self::internal_with_source("JSON serialization failed", err)
    }
}

impl From<anyhow::Error> for FastfnError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal {
            message: err.to_string(),
            source: Some(err),
        }
    }
}
