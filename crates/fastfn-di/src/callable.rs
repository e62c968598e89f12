//! Type-erased dependency callables.
//!
//! A [`Callable`] wraps a user function behind an `Arc` so that it can be
//! shared by every route that depends on it. Each callable gets a
//! [`CallableId`] when it is created; clones keep the id, which is what the
//! per-request cache keys on.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use fastfn_core::{FastfnError, Request};
use futures_util::future::BoxFuture;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::Value;

static NEXT_CALLABLE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a [`Callable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallableId(u64);

impl CallableId {
    fn next() -> Self {
        Self(NEXT_CALLABLE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for CallableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "callable#{}", self.0)
    }
}

/// Resolved inputs handed to a callable.
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    values: IndexMap<String, Value>,
    request: Option<Arc<Request>>,
}

impl Arguments {
    /// Arguments from resolved values and an optional request handle.
    #[must_use]
    pub fn new(values: IndexMap<String, Value>, request: Option<Arc<Request>>) -> Self {
        Self { values, request }
    }

    /// A resolved value by parameter name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// A resolved value deserialized into `T`.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the value is missing or has the wrong
    /// shape; both mean the declaration and the function disagree.
    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> Result<T, FastfnError> {
        let value = self
            .values
            .get(name)
            .ok_or_else(|| FastfnError::internal(format!("no resolved value for '{name}'")))?;
        serde_json::from_value(value.clone()).map_err(|err| {
            FastfnError::internal(format!("resolved value for '{name}' has the wrong shape: {err}"))
        })
    }

    /// The current request, when a parameter asked for it.
    pub fn request(&self) -> Option<&Request> {
        self.request.as_deref()
    }

    /// All resolved values.
    pub fn values(&self) -> &IndexMap<String, Value> {
        &self.values
    }

    /// Consumes the arguments, returning the values.
    pub fn into_values(self) -> IndexMap<String, Value> {
        self.values
    }
}

/// A value produced by a cleanup-bearing dependency plus its teardown.
pub struct Scoped {
    pub(crate) value: Value,
    pub(crate) release: BoxFuture<'static, ()>,
}

impl Scoped {
    /// Pair a value with the future that releases it.
    pub fn new<F>(value: Value, release: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            value,
            release: Box::pin(release),
        }
    }

    /// A value with nothing to release.
    #[must_use]
    pub fn value(value: Value) -> Self {
        Self::new(value, async {})
    }
}

impl fmt::Debug for Scoped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scoped")
            .field("value", &self.value)
            .finish_non_exhaustive()
    }
}

pub(crate) type AsyncFn =
    Arc<dyn Fn(Arguments) -> BoxFuture<'static, Result<Value, FastfnError>> + Send + Sync>;
pub(crate) type AsyncGeneratorFn =
    Arc<dyn Fn(Arguments) -> BoxFuture<'static, Result<Scoped, FastfnError>> + Send + Sync>;
type SyncFn = Arc<dyn Fn(Arguments) -> Result<Value, FastfnError> + Send + Sync>;
type SyncGeneratorFn = Arc<dyn Fn(Arguments) -> Result<Scoped, FastfnError> + Send + Sync>;

#[derive(Clone)]
enum Shape {
    Async(AsyncFn),
    AsyncGenerator(AsyncGeneratorFn),
    Sync(SyncFn),
    SyncGenerator(SyncGeneratorFn),
    Type(String),
}

/// A shared, invocable dependency function.
///
/// # Example
///
/// ```
/// use fastfn_di::Callable;
/// use serde_json::json;
///
/// let pagination = Callable::from_async(|args| async move {
///     let limit = args.get("limit").cloned().unwrap_or(json!(10));
///     Ok(json!({ "limit": limit }))
/// });
/// let shared = pagination.clone();
/// assert_eq!(pagination.id(), shared.id());
/// ```
#[derive(Clone)]
pub struct Callable {
    id: CallableId,
    shape: Shape,
}

impl Callable {
    fn with_shape(shape: Shape) -> Self {
        Self {
            id: CallableId::next(),
            shape,
        }
    }

    /// A plain asynchronous function.
    pub fn from_async<F, Fut>(f: F) -> Self
    where
        F: Fn(Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, FastfnError>> + Send + 'static,
    {
        Self::with_shape(Shape::Async(Arc::new(move |args| Box::pin(f(args)))))
    }

    /// An asynchronous function that yields a value and a teardown.
    ///
    /// The teardown runs exactly once when the request scope closes.
    pub fn from_async_generator<F, Fut>(f: F) -> Self
    where
        F: Fn(Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Scoped, FastfnError>> + Send + 'static,
    {
        Self::with_shape(Shape::AsyncGenerator(Arc::new(move |args| Box::pin(f(args)))))
    }

    /// A blocking function. Not usable as a dependency.
    pub fn from_sync<F>(f: F) -> Self
    where
        F: Fn(Arguments) -> Result<Value, FastfnError> + Send + Sync + 'static,
    {
        Self::with_shape(Shape::Sync(Arc::new(f)))
    }

    /// A blocking function with a teardown. Not usable as a dependency.
    pub fn from_sync_generator<F>(f: F) -> Self
    where
        F: Fn(Arguments) -> Result<Scoped, FastfnError> + Send + Sync + 'static,
    {
        Self::with_shape(Shape::SyncGenerator(Arc::new(f)))
    }

    /// A reference to a declared type that has no call protocol.
    pub fn type_reference(type_name: impl Into<String>) -> Self {
        Self::with_shape(Shape::Type(type_name.into()))
    }

    /// Identity shared by all clones.
    pub fn id(&self) -> CallableId {
        self.id
    }

    /// Short name of the callable's shape, for logs.
    pub fn shape_name(&self) -> &'static str {
        match &self.shape {
            Shape::Async(_) => "async",
            Shape::AsyncGenerator(_) => "async_generator",
            Shape::Sync(_) => "sync",
            Shape::SyncGenerator(_) => "sync_generator",
            Shape::Type(_) => "type",
        }
    }

    /// Decide how the resolver will invoke this callable.
    pub(crate) fn kind(&self, dependency: &str) -> CallKind {
        match &self.shape {
            Shape::Async(f) => CallKind::PlainAsync(Arc::clone(f)),
            Shape::AsyncGenerator(f) => CallKind::CleanupAsync(Arc::clone(f)),
            Shape::SyncGenerator(_) => CallKind::Invalid {
                reason: format!(
                    "dependency '{dependency}' is a synchronous generator; \
                     cleanup-bearing dependencies must be async"
                ),
            },
            Shape::Sync(_) => CallKind::Invalid {
                reason: format!("dependency '{dependency}' is synchronous; dependencies must be async"),
            },
            Shape::Type(type_name) => CallKind::Invalid {
                reason: format!("dependency '{dependency}' refers to type '{type_name}', which is not invocable"),
            },
        }
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("id", &self.id)
            .field("shape", &self.shape_name())
            .finish()
    }
}

/// How a dependency node is invoked, decided when the graph is built.
#[derive(Clone)]
pub enum CallKind {
    /// Await the function and use its value.
    PlainAsync(AsyncFn),
    /// Await the function, use its value and register its teardown.
    CleanupAsync(AsyncGeneratorFn),
    /// Unusable shape; invoking it is a fault.
    Invalid {
        /// Why the shape was rejected.
        reason: String,
    },
}

impl CallKind {
    /// True for shapes the resolver will refuse to invoke.
    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid { .. })
    }
}

impl fmt::Debug for CallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PlainAsync(_) => f.write_str("PlainAsync"),
            Self::CleanupAsync(_) => f.write_str("CleanupAsync"),
            Self::Invalid { reason } => f.debug_struct("Invalid").field("reason", reason).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ids_are_unique_and_shared_by_clones() {
        let a = Callable::from_async(|_| async { Ok(Value::Null) });
        let b = Callable::from_async(|_| async { Ok(Value::Null) });
        assert_ne!(a.id(), b.id());
        assert_eq!(a.id(), a.clone().id());
    }

    #[test]
    fn test_kind_classification() {
        let plain = Callable::from_async(|_| async { Ok(json!(1)) });
        let cleanup = Callable::from_async_generator(|_| async { Ok(Scoped::value(json!(1))) });
        let sync = Callable::from_sync(|_| Ok(json!(1)));
        let sync_gen = Callable::from_sync_generator(|_| Ok(Scoped::value(json!(1))));
        let ty = Callable::type_reference("Settings");

        assert!(matches!(plain.kind("p"), CallKind::PlainAsync(_)));
        assert!(matches!(cleanup.kind("c"), CallKind::CleanupAsync(_)));
        assert!(sync.kind("s").is_invalid());
        assert!(ty.kind("t").is_invalid());
        match sync_gen.kind("get_db") {
            CallKind::Invalid { reason } => assert!(reason.contains("get_db")),
            other => panic!("expected invalid, got {other:?}"),
        }
    }

    #[test]
    fn test_arguments_get_as() {
        let mut values = IndexMap::new();
        values.insert("limit".to_string(), json!(5));
        let args = Arguments::new(values, None);

        assert_eq!(args.get_as::<i64>("limit").unwrap(), 5);
        assert!(args.get_as::<String>("limit").is_err());
        assert!(args.get_as::<i64>("missing").is_err());
        assert!(args.request().is_none());
    }

    #[tokio::test]
    async fn test_plain_call_runs() {
        let c = Callable::from_async(|args| async move {
            Ok(json!(args.get("x").cloned().unwrap_or(Value::Null)))
        });
        let CallKind::PlainAsync(f) = c.kind("c") else {
            panic!("expected plain async");
        };
        let mut values = IndexMap::new();
        values.insert("x".to_string(), json!("hi"));
        assert_eq!(f(Arguments::new(values, None)).await.unwrap(), json!("hi"));
    }
}
