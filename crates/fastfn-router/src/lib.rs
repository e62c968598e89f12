//! Ordered path router for fastfn.
//!
//! Routes are kept in registration order and matched linearly: the first
//! route whose method set contains the request method and whose compiled
//! pattern matches the path wins. Registration order is therefore the
//! priority order, which lets a static route such as `/users/me` shadow a
//! later `/users/{user_id}`.
//!
//! # Path patterns
//!
//! Placeholders are written `{name}` or `{name:converter}`:
//!
//! | Converter | Matches        | Value            |
//! |-----------|----------------|------------------|
//! | `str`     | `[^/]+`        | as captured      |
//! | `int`     | `[0-9]+`       | integer form     |
//! | `path`    | `.*`           | rest of the path |
//!
//! An unknown converter name is rejected when the route is registered.
//!
//! # Example
//!
//! ```rust
//! use fastfn_router::{MethodSet, Router};
//! use http::Method;
//!
//! let mut router = Router::new();
//! router.insert("/items/{item_id:int}", MethodSet::new().get(), "read_item").unwrap();
//! router.insert("/files/{file_path:path}", MethodSet::new().get(), "read_file").unwrap();
//!
//! let m = router.match_route(&Method::GET, "/files/docs/readme.md").unwrap();
//! assert_eq!(*m.value, "read_file");
//! assert_eq!(m.params.get("file_path"), Some("docs/readme.md"));
//!
//! assert!(router.match_route(&Method::GET, "/items/abc").is_none());
//! ```

mod error;
mod method_set;
mod params;
mod path;
mod router;

pub use error::RouteError;
pub use method_set::MethodSet;
pub use params::Params;
pub use path::{Converter, PathPattern};
pub use router::{Route, Router};

/// A matched route and its extracted parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a, T> {
    /// The value registered with the route
    pub value: &'a T,
    /// Converted path parameters
    pub params: Params,
}

impl<'a, T> RouteMatch<'a, T> {
    /// Creates a new route match.
    #[must_use]
    pub fn new(value: &'a T, params: Params) -> Self {
        Self { value, params }
    }
}
