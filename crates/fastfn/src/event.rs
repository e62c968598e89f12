//! Serverless proxy event adapter.
//!
//! Accepts both API Gateway REST (v1) and HTTP API (v2) payloads and
//! produces a [`Request`]; converts a [`Response`] back into the proxy
//! response shape.

use base64::Engine as _;
use fastfn_core::{parse_query, FastfnError, Request, Response};
use http::{Method, StatusCode};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An inbound proxy event.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LambdaEvent {
    /// Payload version, `"2.0"` for HTTP API events.
    #[serde(default)]
    pub version: Option<String>,
    /// v1 method.
    #[serde(default)]
    pub http_method: Option<String>,
    /// v1 path.
    #[serde(default)]
    pub path: Option<String>,
    /// v2 path.
    #[serde(default)]
    pub raw_path: Option<String>,
    /// v2 query string.
    #[serde(default)]
    pub raw_query_string: Option<String>,
    /// Single-valued headers.
    #[serde(default)]
    pub headers: Option<IndexMap<String, String>>,
    /// v2 cookies, folded into a `cookie` header.
    #[serde(default)]
    pub cookies: Option<Vec<String>>,
    /// Pre-parsed query parameters.
    #[serde(default)]
    pub query_string_parameters: Option<IndexMap<String, String>>,
    /// Body text, possibly base64.
    #[serde(default)]
    pub body: Option<String>,
    /// Whether `body` is base64.
    #[serde(default)]
    pub is_base64_encoded: bool,
    /// Platform request context.
    #[serde(default)]
    pub request_context: Option<RequestContext>,
}

/// The `requestContext` object.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    /// Platform request id.
    #[serde(default)]
    pub request_id: Option<String>,
    /// v2 HTTP details.
    #[serde(default)]
    pub http: Option<HttpContext>,
    /// v1 caller identity.
    #[serde(default)]
    pub identity: Option<Identity>,
}

/// `requestContext.http` (v2).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpContext {
    /// Method.
    #[serde(default)]
    pub method: Option<String>,
    /// Path.
    #[serde(default)]
    pub path: Option<String>,
    /// Caller address.
    #[serde(default)]
    pub source_ip: Option<String>,
}

/// `requestContext.identity` (v1).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Caller address.
    #[serde(default)]
    pub source_ip: Option<String>,
}

fn bad_event(detail: impl Into<String>) -> FastfnError {
    FastfnError::http(StatusCode::BAD_REQUEST, detail.into())
}

impl LambdaEvent {
    /// Parse an event from its JSON form.
    ///
    /// # Errors
    ///
    /// Returns a 400 error if the JSON does not have the event shape.
    pub fn from_value(event: Value) -> Result<Self, FastfnError> {
        serde_json::from_value(event).map_err(|err| bad_event(format!("malformed event: {err}")))
    }

    /// Build the request this event describes.
    ///
    /// # Errors
    ///
    /// Returns a 400 error for a missing or invalid method, or a body
    /// flagged as base64 that does not decode.
    pub fn into_request(self, context: Option<Value>) -> Result<Request, FastfnError> {
        let ctx = self.request_context.unwrap_or_default();
        let http_ctx = ctx.http.unwrap_or_default();

        let method = self
            .http_method
            .or(http_ctx.method)
            .ok_or_else(|| bad_event("event has no HTTP method"))?;
        let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
            .map_err(|_| bad_event(format!("invalid HTTP method: {method}")))?;

        let path = self
            .raw_path
            .or(self.path)
            .or(http_ctx.path)
            .unwrap_or_else(|| "/".to_string());

        let mut builder = Request::builder().method(method).path(path);

        for (name, value) in self.headers.unwrap_or_default() {
            builder = builder.header(&name, &value);
        }
        if let Some(cookies) = self.cookies.filter(|c| !c.is_empty()) {
            builder = builder.header("cookie", &cookies.join("; "));
        }

        let query = match self.raw_query_string.filter(|q| !q.is_empty()) {
            Some(raw) => parse_query(&raw),
            None => self.query_string_parameters.unwrap_or_default(),
        };
        for (key, value) in query {
            builder = builder.query(key, value);
        }

        if let Some(body) = self.body {
            if self.is_base64_encoded {
                let bytes = base64::engine::general_purpose::STANDARD
                    .decode(body.as_bytes())
                    .map_err(|err| bad_event(format!("body is not valid base64: {err}")))?;
                builder = builder.body(bytes);
            } else {
                builder = builder.body(body);
            }
        }

        if let Some(id) = ctx.request_id {
            builder = builder.request_id(id);
        }
        if let Some(ip) = http_ctx
            .source_ip
            .or_else(|| ctx.identity.and_then(|i| i.source_ip))
        {
            builder = builder.source_ip(ip);
        }
        if let Some(context) = context {
            builder = builder.invocation_context(context);
        }

        Ok(builder.build())
    }
}

/// The proxy response shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LambdaResponse {
    /// HTTP status.
    pub status_code: u16,
    /// Headers; repeated values are joined with `", "`.
    pub headers: IndexMap<String, String>,
    /// Body text, base64 when flagged.
    pub body: String,
    /// Whether `body` is base64.
    pub is_base64_encoded: bool,
}

impl From<Response> for LambdaResponse {
    fn from(response: Response) -> Self {
        let mut headers: IndexMap<String, String> = IndexMap::new();
        for (name, value) in response.headers() {
            let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
            headers
                .entry(name.as_str().to_string())
                .and_modify(|existing| {
                    existing.push_str(", ");
                    existing.push_str(&value);
                })
                .or_insert(value);
        }
        Self {
            status_code: response.status().as_u16(),
            headers,
            body: response.body().to_string(),
            is_base64_encoded: response.is_base64_encoded(),
        }
    }
}
