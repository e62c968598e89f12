//! The application: route table plus request entry points.

use std::time::Instant;

use fastfn_config::FastfnConfig;
use fastfn_core::{FastfnError, Request, Response};
use fastfn_di::Dependant;
use fastfn_router::{MethodSet, PathPattern, Route, Router};
use fastfn_telemetry::{fields, log_request_complete, log_request_error, log_request_start, request_span};
use serde_json::Value;
use tracing::Instrument;

use crate::dispatch;
use crate::error::RegistrationError;
use crate::event::{LambdaEvent, LambdaResponse};
use crate::route::{Endpoint, RouteEntry};

/// A fastfn application.
///
/// Routes are registered up front; after that the app is read-only and
/// can serve any number of concurrent requests through [`handle`](Self::handle)
/// or [`handle_event`](Self::handle_event).
///
/// # Example
///
/// ```
/// use fastfn::prelude::*;
/// use serde_json::json;
///
/// # tokio_test::block_on(async {
/// let mut app = App::new("items");
/// app.get(
///     "/items/{item_id}",
///     Endpoint::new("read_item", |args| async move {
///         Ok(json!({ "item_id": args.get("item_id") }))
///     })
///     .param(Param::inferred("item_id", Schema::integer())),
/// )
/// .unwrap();
///
/// let response = app.handle(Request::builder().uri("/items/5").build()).await;
/// assert_eq!(response.status(), http::StatusCode::OK);
/// assert_eq!(response.body(), r#"{"item_id":5}"#);
/// # });
/// ```
#[derive(Debug)]
pub struct App {
    title: String,
    version: String,
    description: String,
    debug: bool,
    router: Router<RouteEntry>,
}

impl Default for App {
    fn default() -> Self {
        Self::from_config(&FastfnConfig::default())
    }
}

impl App {
    /// An empty app with the default settings and the given title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// An empty app configured from `config`.
    pub fn from_config(config: &FastfnConfig) -> Self {
        Self {
            title: config.app.title.clone(),
            version: config.app.version.clone(),
            description: config.app.description.clone(),
            debug: config.app.debug,
            router: Router::new(),
        }
    }

    /// Show fault details in error responses.
    #[must_use]
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Application title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Application version.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Application description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Whether fault details are shown.
    pub fn is_debug(&self) -> bool {
        self.debug
    }

    /// Register a GET route.
    ///
    /// # Errors
    ///
    /// See [`add_route`](Self::add_route).
    pub fn get(&mut self, path: &str, endpoint: Endpoint) -> Result<&mut Self, RegistrationError> {
        self.add_route(path, MethodSet::new().get(), endpoint)
    }

    /// Register a POST route.
    ///
    /// # Errors
    ///
    /// See [`add_route`](Self::add_route).
    pub fn post(&mut self, path: &str, endpoint: Endpoint) -> Result<&mut Self, RegistrationError> {
        self.add_route(path, MethodSet::new().post(), endpoint)
    }

    /// Register a PUT route.
    ///
    /// # Errors
    ///
    /// See [`add_route`](Self::add_route).
    pub fn put(&mut self, path: &str, endpoint: Endpoint) -> Result<&mut Self, RegistrationError> {
        self.add_route(path, MethodSet::new().put(), endpoint)
    }

    /// Register a PATCH route.
    ///
    /// # Errors
    ///
    /// See [`add_route`](Self::add_route).
    pub fn patch(&mut self, path: &str, endpoint: Endpoint) -> Result<&mut Self, RegistrationError> {
        self.add_route(path, MethodSet::new().patch(), endpoint)
    }

    /// Register a DELETE route.
    ///
    /// # Errors
    ///
    /// See [`add_route`](Self::add_route).
    pub fn delete(&mut self, path: &str, endpoint: Endpoint) -> Result<&mut Self, RegistrationError> {
        self.add_route(path, MethodSet::new().delete(), endpoint)
    }

    /// Register `endpoint` for `methods` on `path`.
    ///
    /// Routes are tried in registration order; the first match wins.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::Route`] for a bad path pattern or an
    /// empty method set, and [`RegistrationError::Declaration`] when a
    /// parameter of the endpoint or any of its dependencies is declared
    /// inconsistently.
    pub fn add_route(
        &mut self,
        path: &str,
        methods: MethodSet,
        endpoint: Endpoint,
    ) -> Result<&mut Self, RegistrationError> {
        let pattern = PathPattern::compile(path)?;
        let dependant = Dependant::for_endpoint(
            endpoint.name(),
            &pattern,
            endpoint.params(),
            endpoint.dependencies(),
        )
        .map_err(|source| RegistrationError::Declaration {
            endpoint: endpoint.name().to_string(),
            source,
        })?;
        let entry = RouteEntry::new(endpoint, dependant);
        let route = self.router.insert_compiled(pattern, methods, entry)?;
        tracing::debug!(
            route = route.value().name(),
            path = route.pattern().as_str(),
            "route registered"
        );
        Ok(self)
    }

    /// Registered routes in match order.
    pub fn routes(&self) -> impl Iterator<Item = &Route<RouteEntry>> {
        self.router.iter()
    }

    /// Match and run `request`.
    ///
    /// An unmatched request gets a normal 404 response.
    ///
    /// # Errors
    ///
    /// Returns the error that stopped the request; [`handle`](Self::handle)
    /// renders it.
    pub async fn dispatch(&self, mut request: Request) -> Result<Response, FastfnError> {
        let Some(matched) = self.router.match_route(request.method(), request.path()) else {
            return dispatch::not_found();
        };
        tracing::Span::current().record(fields::ROUTE, matched.value.name());
        request.set_path_params(matched.params);
        dispatch::run(matched.value, request).await
    }

    /// Serve one request, always producing a response.
    pub async fn handle(&self, request: Request) -> Response {
        let request_id = request.request_id().to_string();
        let span = request_span(&request_id, request.method().as_str(), request.path());
        async move {
            let started = Instant::now();
            log_request_start!(request_id, request.method(), request.path());

            let response = match self.dispatch(request).await {
                Ok(response) => response,
                Err(err) => {
                    if err.is_fault() {
                        log_request_error!(request_id, err);
                    }
                    err.into_response(self.debug)
                }
            };

            let status = response.status().as_u16();
            tracing::Span::current().record(fields::HTTP_STATUS, status);
            let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
            log_request_complete!(request_id, status, duration_ms);
            response
        }
        .instrument(span)
        .await
    }

    /// Serve one proxy event.
    ///
    /// `context` is the platform's invocation context and is exposed to
    /// endpoints through [`Request::invocation_context`]. A malformed event
    /// gets a 400 response.
    pub async fn handle_event(&self, event: Value, context: Option<Value>) -> LambdaResponse {
        let request = LambdaEvent::from_value(event).and_then(|e| e.into_request(context));
        match request {
            Ok(request) => self.handle(request).await.into(),
            Err(err) => {
                tracing::warn!(error = %err, "rejecting malformed event");
                err.into_response(self.debug).into()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fastfn_config::{AppSettings, FastfnConfig};
    use fastfn_core::Schema;
    use fastfn_di::Param;
    use http::{Method, StatusCode};
    use serde_json::json;

    fn echo(name: &str) -> Endpoint {
        Endpoint::new(name, |args| async move { Ok(Value::Object(args.into_values().into_iter().collect())) })
    }

    #[test]
    fn test_from_config() {
        let config = FastfnConfig {
            app: AppSettings {
                title: "orders".to_string(),
                debug: true,
                ..AppSettings::default()
            },
            ..FastfnConfig::default()
        };
        let app = App::from_config(&config);
        assert_eq!(app.title(), "orders");
        assert!(app.is_debug());
        assert_eq!(app.routes().count(), 0);
    }

    #[test]
    fn test_registration_errors() {
        let mut app = App::new("t");
        assert!(matches!(
            app.get("/items/{id:nope}", echo("a")),
            Err(RegistrationError::Route(_))
        ));
        let bad = echo("b").param(Param::query("id", Schema::integer()));
        let err = app.get("/items/{id}", bad).unwrap_err();
        assert!(matches!(err, RegistrationError::Declaration { ref endpoint, .. } if endpoint == "b"));
        assert!(matches!(
            app.add_route("/x", MethodSet::new(), echo("c")),
            Err(RegistrationError::Route(_))
        ));
    }

    #[tokio::test]
    async fn test_unmatched_is_plain_404() {
        let mut app = App::new("t");
        app.get("/a", echo("a")).unwrap();
        let response = app.dispatch(Request::builder().uri("/b").build()).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let wrong_method = Request::builder().method(Method::POST).uri("/a").build();
        let response = app.handle(wrong_method).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.json_body().unwrap(), json!({"detail": "Not Found"}));
    }

    #[tokio::test]
    async fn test_first_match_wins() {
        let mut app = App::new("t");
        app.get("/users/me", Endpoint::new("me", |_| async { Ok(json!("me")) }))
            .unwrap()
            .get(
                "/users/{user_id}",
                echo("user").param(Param::inferred("user_id", Schema::string())),
            )
            .unwrap();

        let me = app.handle(Request::builder().uri("/users/me").build()).await;
        assert_eq!(me.body(), r#""me""#);
        let other = app.handle(Request::builder().uri("/users/7").build()).await;
        assert_eq!(other.json_body().unwrap(), json!({"user_id": "7"}));
    }

    #[tokio::test]
    async fn test_fault_detail_hidden_unless_debug() {
        let failing = || {
            Endpoint::new("boom", |_| async {
                Err::<Value, _>(FastfnError::internal("database unreachable"))
            })
        };
        let mut app = App::new("t");
        app.get("/", failing()).unwrap();
        let response = app.handle(Request::builder().build()).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.json_body().unwrap(), json!({"detail": "Internal Server Error"}));

        let mut app = App::new("t").debug(true);
        app.get("/", failing()).unwrap();
        let response = app.handle(Request::builder().build()).await;
        let body = response.json_body().unwrap();
        assert!(body["detail"].as_str().unwrap().contains("database unreachable"));
    }

    #[tokio::test]
    async fn test_handle_event_round_trip() {
        let mut app = App::new("t");
        app.get("/ping", Endpoint::new("ping", |_| async { Ok(json!({"pong": true})) }))
            .unwrap();
        let response = app
            .handle_event(
                json!({"version": "2.0", "rawPath": "/ping", "requestContext": {"http": {"method": "GET"}}}),
                None,
            )
            .await;
        assert_eq!(response.status_code, 200);
        assert_eq!(response.body, r#"{"pong":true}"#);
        assert_eq!(response.headers["content-type"], "application/json");

        let malformed = app.handle_event(json!({"rawPath": "/ping"}), None).await;
        assert_eq!(malformed.status_code, 400);
    }
}
