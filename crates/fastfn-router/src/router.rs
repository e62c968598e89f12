//! Ordered route table.

use http::Method;

use crate::{MethodSet, Params, PathPattern, RouteError, RouteMatch};

/// A single registered route.
#[derive(Debug, Clone)]
pub struct Route<T> {
    pattern: PathPattern,
    methods: MethodSet,
    value: T,
}

impl<T> Route<T> {
    /// The compiled path pattern.
    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    /// Methods this route answers to.
    pub fn methods(&self) -> &MethodSet {
        &self.methods
    }

    /// The value attached at registration.
    pub fn value(&self) -> &T {
        &self.value
    }

    fn matches(&self, method: &Method, path: &str) -> Option<Params> {
        if !self.methods.contains(method) {
            return None;
        }
        self.pattern.match_path(path)
    }
}

/// Routes are tried in registration order and the first hit wins.
///
/// # Example
///
/// ```rust
/// use fastfn_router::{MethodSet, Router};
/// use http::Method;
///
/// let mut router = Router::new();
/// router.insert("/users/me", MethodSet::new().get(), "current_user").unwrap();
/// router.insert("/users/{user_id}", MethodSet::new().get(), "get_user").unwrap();
///
/// let m = router.match_route(&Method::GET, "/users/me").unwrap();
/// assert_eq!(*m.value, "current_user");
///
/// let m = router.match_route(&Method::GET, "/users/42").unwrap();
/// assert_eq!(*m.value, "get_user");
/// assert_eq!(m.params.get("user_id"), Some("42"));
/// ```
#[derive(Debug, Clone)]
pub struct Router<T> {
    routes: Vec<Route<T>>,
}

impl<T> Default for Router<T> {
    fn default() -> Self {
        Self { routes: Vec::new() }
    }
}

impl<T> Router<T> {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile `path` and append a route.
    pub fn insert(
        &mut self,
        path: &str,
        methods: MethodSet,
        value: T,
    ) -> Result<&Route<T>, RouteError> {
        let pattern = PathPattern::compile(path)?;
        self.insert_compiled(pattern, methods, value)
    }

    /// Append a route whose pattern was compiled by the caller.
    pub fn insert_compiled(
        &mut self,
        pattern: PathPattern,
        methods: MethodSet,
        value: T,
    ) -> Result<&Route<T>, RouteError> {
        if methods.is_empty() {
            return Err(RouteError::NoMethods {
                path: pattern.as_str().to_string(),
            });
        }
        let index = self.routes.len();
        self.routes.push(Route {
            pattern,
            methods,
            value,
        });
        Ok(&self.routes[index])
    }

    /// Find the first route accepting `method` whose pattern matches `path`.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch<'_, T>> {
        self.routes.iter().find_map(|route| {
            route
                .matches(method, path)
                .map(|params| RouteMatch::new(&route.value, params))
        })
    }

    /// Iterate over routes in priority order.
    pub fn iter(&self) -> impl Iterator<Item = &Route<T>> {
        self.routes.iter()
    }

    /// Number of registered routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
