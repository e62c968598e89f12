//! Per-request dispatch of a matched route.
//!
//! The flow for one request is:
//!
//! 1. Parse the JSON body if the method carries one and the route reads it
//! 2. Resolve the dependency graph into arguments
//! 3. Invoke the endpoint
//! 4. Close the resource scope, whatever happened above
//! 5. Serialize the return value, through the response model if any

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use fastfn_core::{loc, FastfnError, Request, Response};
use fastfn_di::{resolve, Arguments, ResolutionContext};
use futures_util::FutureExt;
use http::Method;

use crate::route::{Reply, RouteEntry};

/// Where a request is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    /// No route matched.
    Unmatched,
    /// A route matched and path parameters are bound.
    Matched,
    /// Dependencies are being resolved.
    Resolving,
    /// Every dependency resolved without validation errors.
    ResolvedOk,
    /// Resolution collected validation errors.
    ResolvedWithErrors,
    /// The endpoint is running.
    Invoking,
    /// The endpoint returned.
    Invoked,
    /// The response is ready.
    Serialized,
    /// The request failed with a client-facing error.
    Failed,
    /// A server-side defect stopped the request.
    Faulted,
}

impl DispatchState {
    /// True for states that end the request.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Unmatched | Self::Serialized | Self::Failed | Self::Faulted
        )
    }

    /// Short name for logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unmatched => "unmatched",
            Self::Matched => "matched",
            Self::Resolving => "resolving",
            Self::ResolvedOk => "resolved_ok",
            Self::ResolvedWithErrors => "resolved_with_errors",
            Self::Invoking => "invoking",
            Self::Invoked => "invoked",
            Self::Serialized => "serialized",
            Self::Failed => "failed",
            Self::Faulted => "faulted",
        }
    }

    fn enter(self, route: &str) -> Self {
        tracing::debug!(route, state = self.as_str(), "dispatch state");
        self
    }
}

fn method_has_body(method: &Method) -> bool {
    method == Method::POST || method == Method::PUT || method == Method::PATCH
}

/// Run a matched route against `request`.
///
/// The request's path parameters must already be set.
///
/// # Errors
///
/// Validation failures, HTTP exceptions raised by dependencies or the
/// endpoint, and faults are returned for the caller to render.
pub async fn run(entry: &RouteEntry, request: Request) -> Result<Response, FastfnError> {
    let route = entry.name();
    DispatchState::Matched.enter(route);

    let request = Arc::new(request);
    let body = if entry.reads_body() && method_has_body(request.method()) {
        request.json().await.cloned()
    } else {
        None
    };

    let mut ctx = ResolutionContext::new(Arc::clone(&request), body, entry.body_policy());
    let outcome = AssertUnwindSafe(resolve_and_invoke(entry, &mut ctx))
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| Err(FastfnError::internal(panic_message(&*panic))));
    ctx.into_scope().close().await;

    let result = outcome.and_then(|reply| serialize(entry, reply));
    match &result {
        Ok(_) => DispatchState::Serialized.enter(route),
        Err(err) if err.is_fault() => DispatchState::Faulted.enter(route),
        Err(_) => DispatchState::Failed.enter(route),
    };
    result
}

async fn resolve_and_invoke(
    entry: &RouteEntry,
    ctx: &mut ResolutionContext,
) -> Result<Reply, FastfnError> {
    let route = entry.name();
    DispatchState::Resolving.enter(route);
    let resolved = resolve(ctx, entry.dependant()).await?;
    if !resolved.is_ok() {
        DispatchState::ResolvedWithErrors.enter(route);
        tracing::warn!(
            route,
            error_count = resolved.errors.len(),
            "request validation failed"
        );
        return Err(FastfnError::validation(resolved.errors));
    }
    DispatchState::ResolvedOk.enter(route);

    let request = entry
        .dependant()
        .injects_request()
        .then(|| Arc::clone(ctx.request()));
    let args = Arguments::new(resolved.values, request);

    DispatchState::Invoking.enter(route);
    let reply = entry.endpoint().handler().call(args).await?;
    DispatchState::Invoked.enter(route);
    Ok(reply)
}

fn serialize(entry: &RouteEntry, reply: Reply) -> Result<Response, FastfnError> {
    let value = match reply {
        Reply::Response(response) => return Ok(response),
        Reply::Value(value) => value,
    };
    let value = match entry.response_model() {
        Some(schema) => schema
            .validate(&value, &loc!["response"])
            .map_err(|errors| {
                tracing::error!(
                    route = entry.name(),
                    error_count = errors.len(),
                    "endpoint return value does not match its response model"
                );
                FastfnError::ResponseValidation { errors }
            })?,
        None => value,
    };
    Response::json_with_status(entry.status_code(), &value)
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    let detail = panic
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string());
    format!("endpoint panicked: {detail}")
}

/// Render the value an unmatched request receives.
pub(crate) fn not_found() -> Result<Response, FastfnError> {
    DispatchState::Unmatched.enter("-");
    Response::json_with_status(
        http::StatusCode::NOT_FOUND,
        &serde_json::json!({ "detail": "Not Found" }),
    )
}
