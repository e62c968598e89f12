//! The set of HTTP methods a route answers to.

use http::Method;
use smallvec::SmallVec;

/// HTTP methods accepted by one route.
///
/// # Example
///
/// ```rust
/// use fastfn_router::MethodSet;
/// use http::Method;
///
/// let methods = MethodSet::new().get().head();
/// assert!(methods.contains(&Method::GET));
/// assert!(!methods.contains(&Method::POST));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MethodSet {
    methods: SmallVec<[Method; 2]>,
}

impl MethodSet {
    /// Creates an empty method set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds GET.
    #[must_use]
    pub fn get(self) -> Self {
        self.with(Method::GET)
    }

    /// Adds POST.
    #[must_use]
    pub fn post(self) -> Self {
        self.with(Method::POST)
    }

    /// Adds PUT.
    #[must_use]
    pub fn put(self) -> Self {
        self.with(Method::PUT)
    }

    /// Adds PATCH.
    #[must_use]
    pub fn patch(self) -> Self {
        self.with(Method::PATCH)
    }

    /// Adds DELETE.
    #[must_use]
    pub fn delete(self) -> Self {
        self.with(Method::DELETE)
    }

    /// Adds HEAD.
    #[must_use]
    pub fn head(self) -> Self {
        self.with(Method::HEAD)
    }

    /// Adds OPTIONS.
    #[must_use]
    pub fn options(self) -> Self {
        self.with(Method::OPTIONS)
    }

    /// Adds an arbitrary method. Duplicates are ignored.
    #[must_use]
    pub fn with(mut self, method: Method) -> Self {
        if !self.methods.contains(&method) {
            self.methods.push(method);
        }
        self
    }

    /// Returns true if the method is accepted.
    #[must_use]
    pub fn contains(&self, method: &Method) -> bool {
        self.methods.contains(method)
    }

    /// Returns true if no methods were added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Iterates over the accepted methods in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Method> {
        self.methods.iter()
    }
}

impl From<Method> for MethodSet {
    fn from(method: Method) -> Self {
        Self::new().with(method)
    }
}

impl FromIterator<Method> for MethodSet {
    fn from_iter<I: IntoIterator<Item = Method>>(iter: I) -> Self {
        iter.into_iter().fold(Self::new(), Self::with)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_methods() {
        let methods = MethodSet::new().get().post().put().patch().delete();
        for m in [Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE] {
            assert!(methods.contains(&m));
        }
        assert!(!methods.contains(&Method::OPTIONS));
    }

    #[test]
    fn test_duplicates_ignored() {
        let methods: MethodSet = [Method::GET, Method::GET, Method::POST].into_iter().collect();
        assert_eq!(methods.iter().count(), 2);
    }

    #[test]
    fn test_from_method() {
        let methods = MethodSet::from(Method::DELETE);
        assert!(methods.contains(&Method::DELETE));
        assert!(!methods.is_empty());
    }
}
