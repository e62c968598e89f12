//! Proxy-event entry point and bearer authentication.

use fastfn::prelude::*;
use serde_json::{json, Value};

fn app() -> App {
    let bearer = HttpBearer::new().into_dependency();
    let optional = HttpBearer::new()
        .scheme_name("OptionalBearer")
        .auto_error(false)
        .into_dependency();

    let mut app = App::new("events");
    app.get(
        "/items/{item_id}",
        Endpoint::new("read_item", |args| async move {
            Ok(json!({"item_id": args.get("item_id"), "q": args.get("q")}))
        })
        .param(Param::inferred("item_id", Schema::integer()))
        .param(Param::inferred("q", Schema::optional(Schema::string())).default(Value::Null)),
    )
    .unwrap()
    .post(
        "/items",
        Endpoint::new("create_item", |args| async move {
            Ok(args.get("item").cloned().unwrap_or_default())
        })
        .param(Param::inferred(
            "item",
            Schema::model(
                ModelSchema::new("Item")
                    .field(ModelField::new("name", Schema::string()))
                    .field(ModelField::new("tags", Schema::array(Schema::string())).default_value(json!([]))),
            ),
        )),
    )
    .unwrap()
    .get(
        "/me",
        Endpoint::new("me", |args| async move {
            Ok(args.get("credentials").cloned().unwrap_or_default())
        })
        .param(Param::security("credentials", &bearer, ["me"])),
    )
    .unwrap()
    .get(
        "/maybe",
        Endpoint::new("maybe", |args| async move {
            Ok(json!({"authenticated": !args.get("credentials").is_some_and(Value::is_null)}))
        })
        .param(Param::depends("credentials", &optional)),
    )
    .unwrap()
    .get(
        "/context",
        Endpoint::new("context", |args| async move {
            let request = args
                .request()
                .ok_or_else(|| FastfnError::internal("request not injected"))?;
            Ok(json!({
                "function": request.invocation_context().and_then(|c| c.get("functionName")),
                "source_ip": request.source_ip(),
            }))
        })
        .param(Param::request("request"))
        .param(Param::context("context")),
    )
    .unwrap();
    app
}

fn v2(method: &str, path: &str, query: &str) -> Value {
    json!({
        "version": "2.0",
        "rawPath": path,
        "rawQueryString": query,
        "headers": {"accept": "application/json"},
        "requestContext": {
            "requestId": "req-v2",
            "http": {"method": method, "path": path, "sourceIp": "203.0.113.9"}
        }
    })
}

#[tokio::test]
async fn test_v2_get_event() {
    let response = app().handle_event(v2("GET", "/items/7", "q=pen"), None).await;
    assert_eq!(response.status_code, 200);
    assert_eq!(response.body, r#"{"item_id":7,"q":"pen"}"#);
    assert!(!response.is_base64_encoded);
}

#[tokio::test]
async fn test_v1_post_event_with_base64_body() {
    let event = json!({
        "httpMethod": "POST",
        "path": "/items",
        "headers": {"Content-Type": "application/json"},
        "body": "eyJuYW1lIjoicGVuIn0=",
        "isBase64Encoded": true,
        "requestContext": {"requestId": "req-v1"}
    });
    let response = app().handle_event(event, None).await;
    assert_eq!(response.status_code, 200);
    assert_eq!(response.body, r#"{"name":"pen","tags":[]}"#);
}

#[tokio::test]
async fn test_validation_error_through_event() {
    let response = app().handle_event(v2("GET", "/items/seven", ""), None).await;
    assert_eq!(response.status_code, 422);
    let body: Value = serde_json::from_str(&response.body).unwrap();
    assert_eq!(body["detail"][0]["loc"], json!(["path", "item_id"]));
    assert_eq!(body["detail"][0]["input"], "seven");
}

#[tokio::test]
async fn test_malformed_events() {
    let app = app();
    let no_method = app.handle_event(json!({"rawPath": "/items/1"}), None).await;
    assert_eq!(no_method.status_code, 400);

    let bad_body = json!({
        "httpMethod": "POST",
        "path": "/items",
        "body": "%%%",
        "isBase64Encoded": true
    });
    assert_eq!(app.handle_event(bad_body, None).await.status_code, 400);

    let not_an_object = app.handle_event(json!([1, 2, 3]), None).await;
    assert_eq!(not_an_object.status_code, 400);
}

#[tokio::test]
async fn test_identical_events_give_identical_output() {
    let app = app();
    let first = app.handle_event(v2("GET", "/items/3", "q=x"), None).await;
    let second = app.handle_event(v2("GET", "/items/3", "q=x"), None).await;
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[tokio::test]
async fn test_invocation_context_exposed() {
    let context = json!({"functionName": "items-fn", "awsRequestId": "ctx-1"});
    let response = app()
        .handle_event(v2("GET", "/context", ""), Some(context))
        .await;
    assert_eq!(response.status_code, 200);
    assert_eq!(
        response.body,
        r#"{"function":"items-fn","source_ip":"203.0.113.9"}"#
    );
}

#[tokio::test]
async fn test_bearer_required() {
    let app = app();

    let missing = app.handle(Request::builder().uri("/me").build()).await;
    assert_eq!(missing.status(), http::StatusCode::FORBIDDEN);
    assert_eq!(missing.json_body().unwrap(), json!({"detail": "Not authenticated"}));

    let basic = Request::builder()
        .uri("/me")
        .header("Authorization", "Basic dXNlcjpwYXNz")
        .build();
    let response = app.handle(basic).await;
    assert_eq!(response.status(), http::StatusCode::FORBIDDEN);
    assert_eq!(
        response.json_body().unwrap(),
        json!({"detail": "Invalid authentication credentials"})
    );

    let bearer = Request::builder()
        .uri("/me")
        .header("Authorization", "Bearer token-123")
        .build();
    let response = app.handle(bearer).await;
    assert_eq!(
        response.json_body().unwrap(),
        json!({"scheme": "Bearer", "credentials": "token-123"})
    );
}

#[tokio::test]
async fn test_optional_bearer() {
    let app = app();
    let anonymous = app.handle(Request::builder().uri("/maybe").build()).await;
    assert_eq!(anonymous.json_body().unwrap(), json!({"authenticated": false}));

    let signed_in = Request::builder()
        .uri("/maybe")
        .header("authorization", "bearer abc")
        .build();
    let response = app.handle(signed_in).await;
    assert_eq!(response.json_body().unwrap(), json!({"authenticated": true}));
}

#[tokio::test]
async fn test_security_requirements_recorded() {
    let app = app();
    let me = app
        .routes()
        .find(|route| route.value().name() == "me")
        .unwrap();
    let requirements = me.value().dependant().flat_security_requirements();
    assert_eq!(requirements.len(), 1);
    assert_eq!(requirements[0].scheme.name, "HTTPBearer");
    assert_eq!(requirements[0].scopes, ["me"]);
}
