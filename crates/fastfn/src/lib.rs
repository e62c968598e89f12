//! # fastfn
//!
//! Request routing and dependency resolution for serverless functions.
//!
//! An [`App`] holds an ordered route table. Each route's [`Endpoint`]
//! declares its parameters; at registration they are classified into
//! path, query, header and body fields or sub-dependencies, and compiled
//! into a dependency graph. At request time the graph is resolved (each
//! dependency invoked at most once per request, every validation error
//! collected), the endpoint runs, teardowns run, and the return value is
//! serialized.
//!
//! ## Quick Start
//!
//! ```
//! use fastfn::prelude::*;
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let common = Dependency::new(
//!     "common_parameters",
//!     Callable::from_async(|args| async move {
//!         Ok(json!({ "q": args.get("q"), "limit": args.get("limit") }))
//!     }),
//! )
//! .param(Param::inferred("q", Schema::optional(Schema::string())).default(json!(null)))
//! .param(Param::inferred("limit", Schema::integer()).default(json!(100)));
//!
//! let mut app = App::new("items");
//! app.get(
//!     "/items",
//!     Endpoint::new("read_items", |args| async move {
//!         Ok(args.get("commons").cloned().unwrap_or_default())
//!     })
//!     .param(Param::depends("commons", &common)),
//! )
//! .unwrap();
//!
//! let response = app.handle(Request::builder().uri("/items?limit=5").build()).await;
//! assert_eq!(response.body(), r#"{"q":null,"limit":5}"#);
//!
//! let response = app.handle(Request::builder().uri("/items?limit=x").build()).await;
//! assert_eq!(response.status(), http::StatusCode::UNPROCESSABLE_ENTITY);
//! # });
//! ```
//!
//! ## Serverless events
//!
//! [`App::handle_event`] accepts API Gateway REST and HTTP API proxy events
//! as JSON and returns the matching proxy response.

#![doc(html_root_url = "https://docs.rs/fastfn/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod app;
mod dispatch;
mod error;
mod event;
mod route;
mod security;

// Re-export member crates
pub use fastfn_config as config;
pub use fastfn_core as core;
pub use fastfn_di as di;
pub use fastfn_extract as extract;
pub use fastfn_router as router;
pub use fastfn_telemetry as telemetry;

pub use app::App;
pub use dispatch::{run, DispatchState};
pub use error::RegistrationError;
pub use event::{HttpContext, Identity, LambdaEvent, LambdaResponse, RequestContext};
pub use route::{Endpoint, Handler, Reply, RouteEntry};
pub use security::HttpBearer;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```
/// use fastfn::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{App, Endpoint, HttpBearer, LambdaResponse, RegistrationError, Reply};

    pub use fastfn_config::{ConfigLoader, FastfnConfig};

    pub use fastfn_core::{
        loc, FastfnError, FastfnResult, FieldDefault, HttpException, ModelField, ModelSchema,
        Request, Response, Schema, ValidationError,
    };

    pub use fastfn_di::{Arguments, Callable, Dependency, Param, ParamDecl, Scoped};

    pub use fastfn_router::MethodSet;

    pub use fastfn_telemetry::{init_logging, LogConfig};
}
