//! REST surface tests driven through the router without a network listener

mod common;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use common::{module, print_test_header};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn router() -> Router {
    module().await.register_rest(Router::new()).unwrap()
}

async fn call(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

/// Article type with a required headline, created over HTTP
async fn article(router: &Router) -> (String, String) {
    let (status, content_type) = call(router, Method::POST, "/content-types", Some(json!({"name": "Article"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    let type_id = content_type["id"].as_str().unwrap().to_string();

    let (status, field) = call(
        router,
        Method::POST,
        &format!("/content-types/{type_id}/fields"),
        Some(json!({
            "name": "Headline",
            "slug": "headline",
            "field_type": "text",
            "is_required": true
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    (type_id, field["id"].as_str().unwrap().to_string())
}

#[tokio::test]
async fn test_create_and_read_content_item() {
    print_test_header(
        "test_create_and_read_content_item",
        &["POST creates with 201; values read back keyed by slug"],
    );
    let router = router().await;
    let (type_id, _) = article(&router).await;

    let (status, item) = call(
        &router,
        Method::POST,
        &format!("/content-types/{type_id}/items"),
        Some(json!({
            "title": "Hello World",
            "status": "published",
            "fields": {"headline": "Typed at last"}
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(item["slug"], "hello-world");
    assert_eq!(item["status"], "published");

    let item_id = item["id"].as_str().unwrap();
    let (status, values) = call(&router, Method::GET, &format!("/items/{item_id}/values"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(values["values"]["headline"], "Typed at last");

    let (status, listed) = call(&router, Method::GET, &format!("/content-types/{type_id}/items"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["total"], 1);
}

#[tokio::test]
async fn test_validation_failure_returns_errors_map() {
    let router = router().await;
    let (type_id, _) = article(&router).await;

    let (status, problem) = call(
        &router,
        Method::POST,
        &format!("/content-types/{type_id}/items"),
        Some(json!({"title": "No headline"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(problem["status"], 400);
    assert_eq!(problem["errors"]["headline"][0], "The headline field is required.");
}

#[tokio::test]
async fn test_unknown_enum_value_is_a_validation_error() {
    let router = router().await;
    let (type_id, _) = article(&router).await;

    let (status, problem) = call(
        &router,
        Method::POST,
        &format!("/content-types/{type_id}/fields"),
        Some(json!({"name": "Body", "slug": "body", "field_type": "wysiwyg"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(problem["errors"]["field_type"].is_array());
}

#[tokio::test]
async fn test_missing_resource_is_404() {
    let router = router().await;
    let (status, problem) = call(
        &router,
        Method::GET,
        &format!("/pages/{}", uuid::Uuid::new_v4()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(problem["type"], "https://httpstatuses.io/404");
}

#[tokio::test]
async fn test_field_delete_requires_confirm_flag() {
    print_test_header(
        "test_field_delete_requires_confirm_flag",
        &["DELETE without ?confirm=true answers 428 and keeps the field"],
    );
    let router = router().await;
    let (_, field_id) = article(&router).await;

    let (status, _) = call(&router, Method::DELETE, &format!("/fields/{field_id}"), None).await;
    assert_eq!(status, StatusCode::PRECONDITION_REQUIRED);

    let (status, _) = call(&router, Method::GET, &format!("/fields/{field_id}"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, impact) = call(
        &router,
        Method::DELETE,
        &format!("/fields/{field_id}?confirm=true"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(impact["values"], 0);

    let (status, _) = call(&router, Method::GET, &format!("/fields/{field_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_duplicate_slug_is_409() {
    let router = router().await;
    article(&router).await;
    let (status, problem) = call(&router, Method::POST, "/content-types", Some(json!({"name": "Article"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(problem["title"], "Duplicate Slug");
}

#[tokio::test]
async fn test_invalid_actor_header_is_400() {
    let router = router().await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/content-types")
        .header("content-type", "application/json")
        .header("x-user-id", "not-a-uuid")
        .body(Body::from(json!({"name": "Article"}).to_string()))
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let router = router().await;
    let (status, document) = call(&router, Method::GET, "/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(document["components"]["schemas"]["Problem"].is_object());
}
