//! Finalized responses.
//!
//! A [`Response`] is the outbound `(status, headers, body, base64 flag)`
//! tuple. Endpoints may return one directly to bypass serialization; the
//! dispatcher passes it through unchanged.

use base64::Engine as _;
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE, LOCATION};
use http::{HeaderMap, StatusCode};
use serde::Serialize;

use crate::FastfnError;

/// `application/json`.
pub const JSON_CONTENT_TYPE: &str = "application/json";
/// `text/plain; charset=utf-8`.
pub const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";
/// `text/html; charset=utf-8`.
pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// A finalized HTTP response.
///
/// # Example
///
/// ```
/// use fastfn_core::Response;
/// use http::StatusCode;
/// use serde_json::json;
///
/// let response = Response::json(&json!({"ok": true})).unwrap();
/// assert_eq!(response.status(), StatusCode::OK);
/// assert_eq!(response.body(), r#"{"ok":true}"#);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: String,
    is_base64_encoded: bool,
}

impl Default for Response {
    fn default() -> Self {
        Self::empty(StatusCode::OK)
    }
}

impl Response {
    /// A body-less response.
    #[must_use]
    pub fn empty(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: String::new(),
            is_base64_encoded: false,
        }
    }

    /// Serialize `value` as compact JSON with status 200.
    ///
    /// Non-ASCII text is emitted as-is rather than escaped.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, FastfnError> {
        Self::json_with_status(StatusCode::OK, value)
    }

    /// Serialize `value` as compact JSON with the given status.
    pub fn json_with_status<T: Serialize + ?Sized>(
        status: StatusCode,
        value: &T,
    ) -> Result<Self, FastfnError> {
        let body = serde_json::to_string(value)?;
        Ok(Self::with_body(status, body, JSON_CONTENT_TYPE))
    }

    /// A plain-text response.
    pub fn text(body: impl Into<String>) -> Self {
        Self::with_body(StatusCode::OK, body.into(), TEXT_CONTENT_TYPE)
    }

    /// An HTML response.
    pub fn html(body: impl Into<String>) -> Self {
        Self::with_body(StatusCode::OK, body.into(), HTML_CONTENT_TYPE)
    }

    /// A 307 redirect.
    pub fn redirect(location: &str) -> Result<Self, FastfnError> {
        let value = HeaderValue::from_str(location)
            .map_err(|e| FastfnError::internal_with_source("invalid redirect location", e))?;
        let mut response = Self::empty(StatusCode::TEMPORARY_REDIRECT);
        response.headers.insert(LOCATION, value);
        Ok(response)
    }

    /// Binary content, base64 encoded for transport.
    pub fn binary(bytes: &[u8], content_type: &str) -> Self {
        let body = base64::engine::general_purpose::STANDARD.encode(bytes);
        let mut response = Self::with_body(StatusCode::OK, body, content_type);
        response.is_base64_encoded = true;
        response
    }

    fn with_body(status: StatusCode, body: String, content_type: &str) -> Self {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(content_type) {
            headers.insert(CONTENT_TYPE, value);
        }
        Self {
            status,
            headers,
            body,
            is_base64_encoded: false,
        }
    }

    /// Replace the status code.
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Set a header, replacing any previous value.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable response headers.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Serialized body. Base64 text when [`is_base64_encoded`](Self::is_base64_encoded).
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Whether the body is base64 encoded.
    pub fn is_base64_encoded(&self) -> bool {
        self.is_base64_encoded
    }

    /// Parse a JSON body, mostly useful in tests.
    pub fn json_body(&self) -> Result<serde_json::Value, FastfnError> {
        Ok(serde_json::from_str(&self.body)?)
    }
}
