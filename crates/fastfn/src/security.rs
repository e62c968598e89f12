//! HTTP bearer authentication.

use fastfn_core::FastfnError;
use fastfn_di::{Arguments, Callable, Dependency, Param, SecurityScheme};
use http::StatusCode;
use serde_json::{json, Value};

/// Reads `Authorization: Bearer <token>` and yields the credentials.
///
/// # Example
///
/// ```
/// use fastfn::prelude::*;
///
/// let bearer = HttpBearer::new().into_dependency();
/// let endpoint = Endpoint::new("me", |args| async move {
///     Ok(args.get("credentials").cloned().unwrap_or_default())
/// })
/// .param(Param::security("credentials", &bearer, ["me"]));
/// # let _ = endpoint;
/// ```
#[derive(Debug, Clone)]
pub struct HttpBearer {
    scheme_name: String,
    auto_error: bool,
}

impl Default for HttpBearer {
    fn default() -> Self {
        Self {
            scheme_name: "HTTPBearer".to_string(),
            auto_error: true,
        }
    }
}

impl HttpBearer {
    /// A bearer scheme that rejects unauthenticated requests with 403.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// When `false`, missing or malformed credentials yield `null`.
    #[must_use]
    pub fn auto_error(mut self, auto_error: bool) -> Self {
        self.auto_error = auto_error;
        self
    }

    /// Name the scheme is registered under.
    #[must_use]
    pub fn scheme_name(mut self, name: impl Into<String>) -> Self {
        self.scheme_name = name.into();
        self
    }

    /// The dependency that enforces this scheme.
    pub fn into_dependency(self) -> Dependency {
        let scheme = SecurityScheme {
            name: self.scheme_name.clone(),
            kind: "http".to_string(),
            scheme: Some("bearer".to_string()),
        };
        let auto_error = self.auto_error;
        Dependency::new(
            self.scheme_name,
            Callable::from_async(move |args| async move { authenticate(&args, auto_error) }),
        )
        .param(Param::request("request"))
        .security_scheme(scheme)
    }
}

fn authenticate(args: &Arguments, auto_error: bool) -> Result<Value, FastfnError> {
    let header = args.request().and_then(|r| r.header("authorization"));
    let (scheme, credentials) = header
        .and_then(|h| h.split_once(' '))
        .map_or(("", ""), |(s, c)| (s, c.trim()));

    if header.is_none() || scheme.is_empty() || credentials.is_empty() {
        return reject(auto_error, "Not authenticated");
    }
    if !scheme.eq_ignore_ascii_case("bearer") {
        return reject(auto_error, "Invalid authentication credentials");
    }
    Ok(json!({ "scheme": scheme, "credentials": credentials }))
}

fn reject(auto_error: bool, detail: &str) -> Result<Value, FastfnError> {
    if auto_error {
        Err(FastfnError::http(StatusCode::FORBIDDEN, detail))
    } else {
        Ok(Value::Null)
    }
}
