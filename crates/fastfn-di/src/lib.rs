//! # fastfn DI
//!
//! Dependency declaration, graph building and per-request resolution.
//!
//! Registration time:
//!
//! 1. Each endpoint or dependency parameter is declared as a [`ParamDecl`]
//!    (usually through [`Param`]).
//! 2. [`Dependant::for_endpoint`] classifies every declaration and builds
//!    the dependant graph, rejecting bad declarations with a
//!    [`DeclarationError`].
//!
//! Request time:
//!
//! 1. A [`ResolutionContext`] holds the request, its parsed body, the
//!    per-request cache and the [`ResourceScope`].
//! 2. [`resolve`] walks the graph, invoking each [`Callable`] at most once
//!    per cache key and collecting every validation error.
//! 3. The caller closes the scope, running teardowns in reverse order.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use fastfn_core::{Request, Schema};
//! use fastfn_di::{resolve, Callable, Dependant, Dependency, Param, ResolutionContext};
//! use fastfn_router::PathPattern;
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let pagination = Dependency::new(
//!     "pagination",
//!     Callable::from_async(|args| async move {
//!         Ok(json!({ "skip": args.get("skip"), "limit": args.get("limit") }))
//!     }),
//! )
//! .param(Param::inferred("skip", Schema::integer()).default(json!(0)))
//! .param(Param::inferred("limit", Schema::integer()).default(json!(10)));
//!
//! let pattern = PathPattern::compile("/items").unwrap();
//! let root = Dependant::for_endpoint(
//!     "list_items",
//!     &pattern,
//!     &[Param::depends("page", &pagination)],
//!     &[],
//! )
//! .unwrap();
//!
//! let request = Arc::new(Request::builder().uri("/items?limit=3").build());
//! let mut ctx = ResolutionContext::new(request, None, root.body_policy());
//! let resolved = resolve(&mut ctx, &root).await.unwrap();
//! assert_eq!(resolved.values["page"], json!({ "skip": 0, "limit": 3 }));
//! ctx.into_scope().close().await;
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/fastfn-di/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod callable;
mod dependant;
mod dependency;
mod error;
mod param;
mod resolve;
mod scope;

pub use callable::{Arguments, CallKind, Callable, CallableId, Scoped};
pub use dependant::{CacheKey, Dependant, Invocation};
pub use dependency::{Dependency, SecurityRequirement, SecurityScheme};
pub use error::DeclarationError;
pub use param::{
    classify, Classified, DeclaredType, DependsMarker, FieldMarker, Marker, Param, ParamDecl,
    ParamDefault,
};
pub use resolve::{resolve, ResolutionContext, Resolved};
pub use scope::ResourceScope;
