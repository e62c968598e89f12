//! Inbound request view.
//!
//! A [`Request`] is the read-only accessor the resolver pulls raw values
//! from: method, path, lowercased headers, a single-valued query map, the
//! path parameters filled in by the matcher, and a lazily parsed JSON body.

use bytes::Bytes;
use fastfn_router::Params;
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method};
use indexmap::IndexMap;
use serde_json::Value;
use tokio::sync::OnceCell;
use uuid::Uuid;

/// Parse a raw query string, keeping the first value of each key.
///
/// Blank values are kept as empty strings.
///
/// ```
/// use fastfn_core::parse_query;
///
/// let q = parse_query("a=1&b=&a=2&c=x%20y");
/// assert_eq!(q.get("a").map(String::as_str), Some("1"));
/// assert_eq!(q.get("b").map(String::as_str), Some(""));
/// assert_eq!(q.get("c").map(String::as_str), Some("x y"));
/// ```
pub fn parse_query(raw: &str) -> IndexMap<String, String> {
    let raw = raw.strip_prefix('?').unwrap_or(raw);
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(raw).unwrap_or_default();
    let mut query = IndexMap::with_capacity(pairs.len());
    for (key, value) in pairs {
        query.entry(key).or_insert(value);
    }
    query
}

/// One inbound request.
///
/// # Example
///
/// ```
/// use fastfn_core::Request;
/// use http::Method;
///
/// let request = Request::builder()
///     .method(Method::GET)
///     .uri("/items/5?q=pen")
///     .header("X-Token", "abc")
///     .build();
///
/// assert_eq!(request.path(), "/items/5");
/// assert_eq!(request.query_param("q"), Some("pen"));
/// assert_eq!(request.header("x-token"), Some("abc"));
/// ```
#[derive(Debug)]
pub struct Request {
    method: Method,
    path: String,
    headers: HeaderMap,
    query: IndexMap<String, String>,
    path_params: Params,
    body: Bytes,
    request_id: String,
    source_ip: Option<String>,
    invocation_context: Option<Value>,
    json: OnceCell<Option<Value>>,
}

impl Request {
    /// Start building a request.
    #[must_use]
    pub fn builder() -> RequestBuilder {
        RequestBuilder::new()
    }

    /// HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Request path without the query string.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Headers; lookups are case-insensitive.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// A header value as text, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Single-valued query parameters in arrival order.
    pub fn query(&self) -> &IndexMap<String, String> {
        &self.query
    }

    /// One query parameter.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    /// Path parameters captured by the matched route.
    pub fn path_params(&self) -> &Params {
        &self.path_params
    }

    /// Replace the path parameters. Called by the matcher before resolution.
    pub fn set_path_params(&mut self, params: Params) {
        self.path_params = params;
    }

    /// Raw body bytes.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body as UTF-8 text, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Parsed JSON body, or `None` when the body is empty or not valid JSON.
    ///
    /// Parsed once and cached for the life of the request.
    pub async fn json(&self) -> Option<&Value> {
        self.json
            .get_or_init(|| async {
                if self.body.iter().all(u8::is_ascii_whitespace) {
                    return None;
                }
                match serde_json::from_slice::<Value>(&self.body) {
                    Ok(value) => Some(value),
                    Err(err) => {
                        tracing::debug!(request_id = %self.request_id, error = %err, "request body is not valid JSON");
                        None
                    }
                }
            })
            .await
            .as_ref()
    }

    /// Request id from the platform, or a generated UUID v7.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Caller address, when the platform reports one.
    pub fn source_ip(&self) -> Option<&str> {
        self.source_ip.as_deref()
    }

    /// The platform's per-invocation context object, passed through untouched.
    pub fn invocation_context(&self) -> Option<&Value> {
        self.invocation_context.as_ref()
    }
}

/// Builder for [`Request`].
#[derive(Debug, Default)]
pub struct RequestBuilder {
    method: Option<Method>,
    path: Option<String>,
    headers: HeaderMap,
    query: IndexMap<String, String>,
    path_params: Params,
    body: Bytes,
    request_id: Option<String>,
    source_ip: Option<String>,
    invocation_context: Option<Value>,
}

impl RequestBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the HTTP method. Defaults to GET.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Sets path and query from a `path?query` string.
    #[must_use]
    pub fn uri(mut self, uri: &str) -> Self {
        match uri.split_once('?') {
            Some((path, query)) => {
                self.path = Some(path.to_string());
                for (key, value) in parse_query(query) {
                    self.query.entry(key).or_insert(value);
                }
            }
            None => self.path = Some(uri.to_string()),
        }
        self
    }

    /// Sets the path only.
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Adds a header. Invalid names or values are skipped.
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        let parsed = (
            HeaderName::from_bytes(name.to_ascii_lowercase().as_bytes()),
            HeaderValue::from_str(value),
        );
        match parsed {
            (Ok(header), Ok(value)) => {
                self.headers.append(header, value);
            }
            _ => tracing::warn!(header = name, "skipping invalid header"),
        }
        self
    }

    /// Replaces all headers.
    #[must_use]
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Adds a query parameter; the first value for a key wins.
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.entry(key.into()).or_insert_with(|| value.into());
        self
    }

    /// Adds a single path parameter.
    #[must_use]
    pub fn path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.push(name, value);
        self
    }

    /// Sets the raw body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets a JSON body and the matching content type.
    #[must_use]
    pub fn json(self, value: &Value) -> Self {
        self.header("content-type", "application/json")
            .body(value.to_string())
    }

    /// Sets the request id.
    #[must_use]
    pub fn request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    /// Sets the caller address.
    #[must_use]
    pub fn source_ip(mut self, ip: impl Into<String>) -> Self {
        self.source_ip = Some(ip.into());
        self
    }

    /// Attaches the platform invocation context.
    #[must_use]
    pub fn invocation_context(mut self, context: Value) -> Self {
        self.invocation_context = Some(context);
        self
    }

    /// Builds the request.
    #[must_use]
    pub fn build(self) -> Request {
        Request {
            method: self.method.unwrap_or(Method::GET),
            path: self.path.unwrap_or_else(|| "/".to_string()),
            headers: self.headers,
            query: self.query,
            path_params: self.path_params,
            body: self.body,
            request_id: self
                .request_id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| Uuid::now_v7().to_string()),
            source_ip: self.source_ip,
            invocation_context: self.invocation_context,
            json: OnceCell::new(),
        }
    }
}
