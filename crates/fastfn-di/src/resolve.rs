//! Per-request dependency resolution.
//!
//! [`resolve`] walks a [`Dependant`] depth-first. Children are resolved
//! before their parent; a child whose own inputs failed validation is not
//! invoked, its errors are collected, and resolution moves on to the next
//! sibling so that every error in the request is reported at once. Faults
//! (an unusable callable, or an error returned by user code) stop
//! resolution immediately.

use std::collections::HashMap;
use std::sync::Arc;

use fastfn_core::{FastfnError, Request, ValidationError};
use fastfn_extract::{extract, extract_body, BodyPolicy, Extracted};
use futures_util::future::BoxFuture;
use indexmap::IndexMap;
use serde_json::Value;

use crate::{Arguments, CacheKey, CallKind, Dependant, Invocation, ResourceScope, Scoped};

/// Everything one request's resolution shares.
#[derive(Debug)]
pub struct ResolutionContext {
    request: Arc<Request>,
    body: Option<Value>,
    body_policy: BodyPolicy,
    cache: HashMap<CacheKey, Value>,
    scope: ResourceScope,
}

impl ResolutionContext {
    /// A fresh context with an empty cache and scope.
    pub fn new(request: Arc<Request>, body: Option<Value>, body_policy: BodyPolicy) -> Self {
        Self {
            request,
            body,
            body_policy,
            cache: HashMap::new(),
            scope: ResourceScope::new(),
        }
    }

    /// The request being served.
    pub fn request(&self) -> &Arc<Request> {
        &self.request
    }

    /// Number of cached dependency results.
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    /// Teardowns registered so far.
    pub fn scope(&self) -> &ResourceScope {
        &self.scope
    }

    /// Consumes the context, returning the scope so it can be closed.
    pub fn into_scope(self) -> ResourceScope {
        self.scope
    }
}

/// Outcome of resolving one node.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Resolved {
    /// Values for the node's parameters, keyed by name.
    pub values: IndexMap<String, Value>,
    /// Validation errors from the node and its subtree.
    pub errors: Vec<ValidationError>,
}

impl Resolved {
    /// True if no validation errors were collected.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    fn merge(&mut self, extracted: Extracted) {
        for (name, value) in extracted.values {
            self.values.entry(name).or_insert(value);
        }
        self.errors.extend(extracted.errors);
    }
}

/// Resolve `dependant` and its whole subtree.
///
/// # Errors
///
/// Returns a fault if any reachable callable has an unusable shape or
/// returns an error. Validation problems are reported in
/// [`Resolved::errors`] instead.
pub fn resolve<'a>(
    ctx: &'a mut ResolutionContext,
    dependant: &'a Dependant,
) -> BoxFuture<'a, Result<Resolved, FastfnError>> {
    Box::pin(async move {
        let mut resolved = Resolved::default();

        for child in &dependant.dependencies {
            let sub = resolve(ctx, child).await?;
            if !sub.is_ok() {
                resolved.errors.extend(sub.errors);
                continue;
            }

            let Some(invocation) = &child.invocation else {
                return Err(FastfnError::dependency_fault(
                    "sub-dependency has no callable to invoke",
                ));
            };

            let cached = if invocation.use_cache {
                ctx.cache.get(&invocation.cache_key).cloned()
            } else {
                None
            };
            let value = match cached {
                Some(value) => {
                    tracing::trace!(dependency = %invocation.label, "dependency cache hit");
                    value
                }
                None => {
                    let request = child.injects_request().then(|| Arc::clone(&ctx.request));
                    let value = invoke(ctx, invocation, Arguments::new(sub.values, request)).await?;
                    // Uncached results never seed the cache for later cached uses.
                    if invocation.use_cache {
                        ctx.cache
                            .entry(invocation.cache_key.clone())
                            .or_insert_with(|| value.clone());
                    }
                    value
                }
            };

            if let Some(name) = &child.name {
                resolved.values.entry(name.clone()).or_insert(value);
            }
        }

        let request = Arc::clone(&ctx.request);
        resolved.merge(extract(&dependant.path_params, request.path_params()));
        resolved.merge(extract(&dependant.query_params, request.query()));
        resolved.merge(extract(&dependant.header_params, request.headers()));
        resolved.merge(extract_body(
            &dependant.body_params,
            ctx.body.as_ref(),
            ctx.body_policy,
        ));

        Ok(resolved)
    })
}

async fn invoke(
    ctx: &mut ResolutionContext,
    invocation: &Invocation,
    args: Arguments,
) -> Result<Value, FastfnError> {
    tracing::debug!(dependency = %invocation.label, "invoking dependency");
    match &invocation.kind {
        CallKind::PlainAsync(f) => f(args).await,
        CallKind::CleanupAsync(f) => {
            let Scoped { value, release } = f(args).await?;
            ctx.scope.push(invocation.label.clone(), release);
            Ok(value)
        }
        CallKind::Invalid { reason } => {
            tracing::error!(dependency = %invocation.label, reason = %reason, "dependency cannot be invoked");
            Err(FastfnError::dependency_fault(reason.clone()))
        }
    }
}
