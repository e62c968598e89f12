//! Endpoints and registered routes.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use fastfn_core::{FastfnError, Response, Schema};
use fastfn_di::{Arguments, Dependant, Dependency, ParamDecl};
use fastfn_extract::BodyPolicy;
use futures_util::future::BoxFuture;
use http::StatusCode;
use serde_json::Value;

/// What an endpoint returns.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// A value to serialize, through the response model if one is declared.
    Value(Value),
    /// A finalized response, passed through unchanged.
    Response(Response),
}

impl From<Value> for Reply {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Response> for Reply {
    fn from(response: Response) -> Self {
        Self::Response(response)
    }
}

type AsyncHandler =
    Arc<dyn Fn(Arguments) -> BoxFuture<'static, Result<Reply, FastfnError>> + Send + Sync>;
type BlockingHandler = Arc<dyn Fn(Arguments) -> Result<Reply, FastfnError> + Send + Sync>;

/// The endpoint function.
#[derive(Clone)]
pub enum Handler {
    /// Awaited on the request task.
    Async(AsyncHandler),
    /// Run on the blocking thread pool.
    Blocking(BlockingHandler),
}

impl Handler {
    pub(crate) async fn call(&self, args: Arguments) -> Result<Reply, FastfnError> {
        match self {
            Self::Async(f) => f(args).await,
            Self::Blocking(f) => {
                let f = Arc::clone(f);
                tokio::task::spawn_blocking(move || f(args))
                    .await
                    .map_err(|err| {
                        if err.is_panic() {
                            FastfnError::internal("blocking endpoint panicked")
                        } else {
                            FastfnError::internal("blocking endpoint was cancelled")
                        }
                    })?
            }
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Async(_) => f.write_str("Handler::Async"),
            Self::Blocking(_) => f.write_str("Handler::Blocking"),
        }
    }
}

/// An endpoint definition: the function, its parameters and output shape.
///
/// # Example
///
/// ```
/// use fastfn::prelude::*;
/// use serde_json::json;
///
/// let read_item = Endpoint::new("read_item", |args| async move {
///     Ok(json!({ "item_id": args.get("item_id") }))
/// })
/// .param(Param::inferred("item_id", Schema::integer()));
///
/// assert_eq!(read_item.name(), "read_item");
/// ```
#[derive(Debug, Clone)]
pub struct Endpoint {
    name: String,
    handler: Handler,
    params: Vec<ParamDecl>,
    dependencies: Vec<Dependency>,
    response_model: Option<Schema>,
    status_code: StatusCode,
    include_in_schema: bool,
}

impl Endpoint {
    fn with_handler(name: impl Into<String>, handler: Handler) -> Self {
        Self {
            name: name.into(),
            handler,
            params: Vec::new(),
            dependencies: Vec::new(),
            response_model: None,
            status_code: StatusCode::OK,
            include_in_schema: true,
        }
    }

    /// An asynchronous endpoint.
    pub fn new<F, Fut, R>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, FastfnError>> + Send + 'static,
        R: Into<Reply>,
    {
        let f = Arc::new(f);
        let handler: AsyncHandler = Arc::new(move |args| {
            let fut = f(args);
            Box::pin(async move { fut.await.map(Into::into) })
        });
        Self::with_handler(name, Handler::Async(handler))
    }

    /// A synchronous endpoint, run on the blocking thread pool.
    pub fn blocking<F, R>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Arguments) -> Result<R, FastfnError> + Send + Sync + 'static,
        R: Into<Reply>,
    {
        let handler: BlockingHandler = Arc::new(move |args| f(args).map(Into::into));
        Self::with_handler(name, Handler::Blocking(handler))
    }

    /// Declare a parameter.
    #[must_use]
    pub fn param(mut self, decl: ParamDecl) -> Self {
        self.params.push(decl);
        self
    }

    /// Add a side-effect dependency, resolved before any parameter.
    ///
    /// Its value is not passed to the endpoint.
    #[must_use]
    pub fn dependency(mut self, dependency: Dependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    /// Validate and filter return values through `schema`.
    #[must_use]
    pub fn response_model(mut self, schema: Schema) -> Self {
        self.response_model = Some(schema);
        self
    }

    /// Status for serialized return values. Defaults to 200.
    #[must_use]
    pub fn status_code(mut self, status: StatusCode) -> Self {
        self.status_code = status;
        self
    }

    /// Whether schema generators should list this route.
    #[must_use]
    pub fn include_in_schema(mut self, include: bool) -> Self {
        self.include_in_schema = include;
        self
    }

    /// Endpoint name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared parameters.
    pub fn params(&self) -> &[ParamDecl] {
        &self.params
    }

    /// Route-level dependencies.
    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    pub(crate) fn handler(&self) -> &Handler {
        &self.handler
    }
}

/// A registered endpoint with its resolved dependency graph.
///
/// Built once at registration and read-only afterwards.
#[derive(Debug)]
pub struct RouteEntry {
    endpoint: Endpoint,
    dependant: Dependant,
    body_policy: BodyPolicy,
    reads_body: bool,
}

impl RouteEntry {
    pub(crate) fn new(endpoint: Endpoint, dependant: Dependant) -> Self {
        let body_policy = dependant.body_policy();
        let reads_body = dependant.reads_body();
        Self {
            endpoint,
            dependant,
            body_policy,
            reads_body,
        }
    }

    /// Endpoint name.
    pub fn name(&self) -> &str {
        self.endpoint.name()
    }

    /// The endpoint.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Root of the dependency graph.
    pub fn dependant(&self) -> &Dependant {
        &self.dependant
    }

    /// Declared output shape.
    pub fn response_model(&self) -> Option<&Schema> {
        self.endpoint.response_model.as_ref()
    }

    /// Status for serialized return values.
    pub fn status_code(&self) -> StatusCode {
        self.endpoint.status_code
    }

    /// Whether schema generators should list this route.
    pub fn include_in_schema(&self) -> bool {
        self.endpoint.include_in_schema
    }

    /// How body fields find their values.
    pub fn body_policy(&self) -> BodyPolicy {
        self.body_policy
    }

    /// Whether any node of the graph reads the body.
    pub fn reads_body(&self) -> bool {
        self.reads_body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fastfn_di::Param;
    use fastfn_router::PathPattern;
    use serde_json::json;

    #[tokio::test]
    async fn test_async_handler_reply() {
        let endpoint = Endpoint::new("hello", |_| async { Ok(json!("hi")) });
        let reply = endpoint.handler().call(Arguments::default()).await.unwrap();
        assert_eq!(reply, Reply::Value(json!("hi")));
    }

    #[tokio::test]
    async fn test_blocking_handler_runs_off_task() {
        let endpoint = Endpoint::blocking("sum", |args| {
            let a: i64 = args.get_as("a")?;
            Ok(json!(a + 1))
        });
        let mut values = indexmap::IndexMap::new();
        values.insert("a".to_string(), json!(41));
        let reply = endpoint
            .handler()
            .call(Arguments::new(values, None))
            .await
            .unwrap();
        assert_eq!(reply, Reply::Value(json!(42)));
    }

    #[tokio::test]
    async fn test_blocking_panic_is_internal_error() {
        let endpoint = Endpoint::blocking("boom", |_| -> Result<Value, FastfnError> { panic!("boom") });
        let err = endpoint.handler().call(Arguments::default()).await.unwrap_err();
        assert!(err.is_fault());
    }

    #[test]
    fn test_route_entry_metadata() {
        let endpoint = Endpoint::new("create", |_| async { Ok(Response::text("ok")) })
            .param(Param::body("name", Schema::string()))
            .status_code(StatusCode::CREATED)
            .include_in_schema(false);
        let pattern = PathPattern::compile("/things").unwrap();
        let dependant =
            Dependant::for_endpoint(endpoint.name(), &pattern, endpoint.params(), &[]).unwrap();
        let entry = RouteEntry::new(endpoint, dependant);

        assert_eq!(entry.name(), "create");
        assert_eq!(entry.status_code(), StatusCode::CREATED);
        assert!(!entry.include_in_schema());
        assert!(entry.reads_body());
        assert_eq!(entry.body_policy(), BodyPolicy::Raw);
        assert!(entry.response_model().is_none());
    }
}
