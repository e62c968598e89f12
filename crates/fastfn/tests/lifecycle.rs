//! Dependency caching, teardown and default-factory behavior across whole
//! requests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use fastfn::prelude::*;
use http::StatusCode;
use parking_lot::Mutex;
use serde_json::{json, Value};

type Log = Arc<Mutex<Vec<String>>>;

/// A cleanup-bearing dependency that records acquire and release events.
fn session(log: &Log) -> Dependency {
    let log = Arc::clone(log);
    Dependency::new(
        "session",
        Callable::from_async_generator(move |_| {
            let log = Arc::clone(&log);
            async move {
                log.lock().push("open".to_string());
                let release_log = Arc::clone(&log);
                Ok(Scoped::new(json!("db-session"), async move {
                    release_log.lock().push("close".to_string());
                }))
            }
        }),
    )
}

fn counting(name: &str, calls: &Arc<AtomicUsize>) -> Dependency {
    let calls = Arc::clone(calls);
    Dependency::new(
        name,
        Callable::from_async(move |_| {
            let calls = Arc::clone(&calls);
            async move { Ok(json!(calls.fetch_add(1, Ordering::SeqCst))) }
        }),
    )
}

fn closes(log: &Log) -> usize {
    log.lock().iter().filter(|e| e.as_str() == "close").count()
}

#[tokio::test]
async fn test_cached_dependency_invoked_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let user = counting("user", &calls);
    let profile = Dependency::new(
        "profile",
        Callable::from_async(|args| async move { Ok(json!({"user": args.get("user")})) }),
    )
    .param(Param::depends("user", &user));

    let mut app = App::new("cache");
    app.get(
        "/",
        Endpoint::new("both", |args| async move {
            Ok(json!({"user": args.get("user"), "profile": args.get("profile")}))
        })
        .param(Param::depends("profile", &profile))
        .param(Param::depends("user", &user)),
    )
    .unwrap();

    let response = app.handle(Request::builder().build()).await;
    assert_eq!(
        response.json_body().unwrap(),
        json!({"user": 0, "profile": {"user": 0}})
    );
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // A new request gets a new cache.
    app.handle(Request::builder().build()).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_uncached_dependency_invoked_per_use() {
    let calls = Arc::new(AtomicUsize::new(0));
    let nonce = counting("nonce", &calls);

    let mut app = App::new("no-cache");
    app.get(
        "/",
        Endpoint::new("nonces", |args| async move {
            Ok(json!([args.get("first"), args.get("second")]))
        })
        .param(Param::depends("first", &nonce).use_cache(false))
        .param(Param::depends("second", &nonce).use_cache(false)),
    )
    .unwrap();

    let response = app.handle(Request::builder().build()).await;
    assert_eq!(response.json_body().unwrap(), json!([0, 1]));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_teardown_once_on_success() {
    let log = Log::default();
    let mut app = App::new("teardown");
    app.get(
        "/",
        Endpoint::new("use_session", |args| async move {
            Ok(args.get("db").cloned().unwrap_or_default())
        })
        .param(Param::depends("db", &session(&log))),
    )
    .unwrap();

    let response = app.handle(Request::builder().build()).await;
    assert_eq!(response.body(), r#""db-session""#);
    assert_eq!(*log.lock(), ["open", "close"]);
}

#[tokio::test]
async fn test_teardown_once_on_validation_failure() {
    let log = Log::default();
    let mut app = App::new("teardown");
    app.get(
        "/",
        Endpoint::new("use_session", |_| async { Ok(Value::Null) })
            .param(Param::depends("db", &session(&log)))
            .param(Param::query("limit", Schema::integer())),
    )
    .unwrap();

    let response = app.handle(Request::builder().uri("/?limit=many").build()).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(closes(&log), 1);
}

#[tokio::test]
async fn test_teardown_once_on_fault() {
    let log = Log::default();
    let mut app = App::new("teardown");
    app.get(
        "/error",
        Endpoint::new("fails", |_| async {
            Err::<Value, _>(FastfnError::internal("endpoint failed"))
        })
        .param(Param::depends("db", &session(&log))),
    )
    .unwrap()
    .get(
        "/panic",
        Endpoint::new("panics", |_| async {
            if true {
                panic!("endpoint panicked");
            }
            Ok(Value::Null)
        })
        .param(Param::depends("db", &session(&log))),
    )
    .unwrap();

    let response = app.handle(Request::builder().uri("/error").build()).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(closes(&log), 1);

    let response = app.handle(Request::builder().uri("/panic").build()).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(closes(&log), 2);
}

#[tokio::test]
async fn test_teardowns_run_in_reverse_order() {
    let log = Log::default();
    let named = |name: &'static str| {
        let log = Arc::clone(&log);
        Dependency::new(
            name,
            Callable::from_async_generator(move |_| {
                let log = Arc::clone(&log);
                async move {
                    Ok(Scoped::new(json!(name), async move {
                        log.lock().push(name.to_string());
                    }))
                }
            }),
        )
    };

    let mut app = App::new("order");
    app.get(
        "/",
        Endpoint::new("ordered", |_| async { Ok(Value::Null) })
            .param(Param::depends("first", &named("first")))
            .param(Param::depends("second", &named("second"))),
    )
    .unwrap();

    app.handle(Request::builder().build()).await;
    assert_eq!(*log.lock(), ["second", "first"]);
}

#[tokio::test]
async fn test_default_factory_fresh_per_request() {
    let made = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&made);
    let mut app = App::new("factory");
    app.get(
        "/",
        Endpoint::new("tags", |args| async move { Ok(args.get("tags").cloned().unwrap_or_default()) })
            .param(Param::query("tags", Schema::Any).default_factory(move || {
                json!([counter.fetch_add(1, Ordering::SeqCst)])
            })),
    )
    .unwrap();

    let first = app.handle(Request::builder().build()).await;
    let second = app.handle(Request::builder().build()).await;
    assert_eq!(first.body(), "[0]");
    assert_eq!(second.body(), "[1]");
}

#[tokio::test]
async fn test_sync_dependencies_fault_without_leaking() {
    let legacy = Dependency::new(
        "legacy_session",
        Callable::from_sync_generator(|_| Ok(Scoped::value(json!(1)))),
    );
    let mut app = App::new("faults");
    app.get(
        "/",
        Endpoint::new("legacy", |_| async { Ok(Value::Null) })
            .param(Param::depends("legacy", &legacy)),
    )
    .unwrap();

    let response = app.handle(Request::builder().build()).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = response.json_body().unwrap();
    assert_eq!(body, json!({"detail": "Internal Server Error"}));
    assert!(!response.body().contains("legacy_session"));
}

#[tokio::test]
async fn test_concurrent_requests_isolated() {
    let calls = Arc::new(AtomicUsize::new(0));
    let user = counting("user", &calls);
    let mut app = App::new("concurrent");
    app.get(
        "/",
        Endpoint::new("user", |args| async move { Ok(args.get("user").cloned().unwrap_or_default()) })
            .param(Param::depends("user", &user)),
    )
    .unwrap();
    let app = Arc::new(app);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let app = Arc::clone(&app);
            tokio::spawn(async move { app.handle(Request::builder().build()).await })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.await.unwrap().status(), StatusCode::OK);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 8);
}
