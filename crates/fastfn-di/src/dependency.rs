//! Dependency declarations.

use crate::{Callable, ParamDecl};

/// Describes a security scheme a dependency enforces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityScheme {
    /// Scheme name, e.g. `HTTPBearer`.
    pub name: String,
    /// Scheme type, e.g. `http`.
    pub kind: String,
    /// Authorization scheme for `http` schemes, e.g. `bearer`.
    pub scheme: Option<String>,
}

/// A security scheme together with the scopes requested for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityRequirement {
    /// The scheme.
    pub scheme: SecurityScheme,
    /// Requested scopes.
    pub scopes: Vec<String>,
}

/// A named callable plus the declarations of its own parameters.
///
/// Cloning is cheap enough for registration time and keeps the callable's
/// identity, so the same dependency used in several places shares one
/// cache slot per request.
///
/// # Example
///
/// ```
/// use fastfn_core::Schema;
/// use fastfn_di::{Callable, Dependency, Param};
/// use serde_json::json;
///
/// let common = Dependency::new(
///     "common_parameters",
///     Callable::from_async(|args| async move {
///         Ok(json!({ "q": args.get("q"), "limit": args.get("limit") }))
///     }),
/// )
/// .param(Param::inferred("q", Schema::optional(Schema::string())).default(json!(null)))
/// .param(Param::inferred("limit", Schema::integer()).default(json!(100)));
///
/// assert_eq!(common.params().len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct Dependency {
    name: String,
    callable: Callable,
    params: Vec<ParamDecl>,
    security: Option<SecurityScheme>,
}

impl Dependency {
    /// A dependency with no parameters.
    pub fn new(name: impl Into<String>, callable: Callable) -> Self {
        Self {
            name: name.into(),
            callable,
            params: Vec::new(),
            security: None,
        }
    }

    /// Declare one parameter of the callable.
    #[must_use]
    pub fn param(mut self, decl: ParamDecl) -> Self {
        self.params.push(decl);
        self
    }

    /// Mark this dependency as enforcing a security scheme.
    #[must_use]
    pub fn security_scheme(mut self, scheme: SecurityScheme) -> Self {
        self.security = Some(scheme);
        self
    }

    /// Name used in logs and error messages.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The callable.
    pub fn callable(&self) -> &Callable {
        &self.callable
    }

    /// Declared parameters in order.
    pub fn params(&self) -> &[ParamDecl] {
        &self.params
    }

    /// The security scheme, if any.
    pub fn security(&self) -> Option<&SecurityScheme> {
        self.security.as_ref()
    }
}
