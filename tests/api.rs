//! API endpoint integration tests

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;

mod common;
use common::{StubProvider, StubReply, build_test_router};

fn chat_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_chat_returns_reply() {
    let provider = StubProvider::text("You have two meetings today.");
    let app = build_test_router(Some(&provider));

    let body = json!({
        "messages": [
            { "role": "system", "content": "You are Uni-GPT" },
            { "role": "user", "content": "What meetings do I have today?" }
        ]
    });
    let response = app.oneshot(chat_request(&body.to_string())).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({ "message": "You have two meetings today." })
    );
}

#[tokio::test]
async fn test_chat_forwards_fixed_generation_params() {
    let provider = StubProvider::text("ok");
    let app = build_test_router(Some(&provider));

    let messages = json!([
        { "role": "system", "content": "prompt" },
        { "role": "user", "content": "hi", "name": "extra-field" }
    ]);
    let body = json!({ "messages": messages, "temperature": 0.2 });
    let response = app.oneshot(chat_request(&body.to_string())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let requests = provider.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.model, "gpt-4o-mini");
    assert_eq!(request.max_tokens, 500);
    assert!((request.presence_penalty - 0.6).abs() < f64::EPSILON);
    assert!((request.frequency_penalty - 0.3).abs() < f64::EPSILON);
    assert_eq!(request.temperature, json!(0.2));
    // Messages pass through untouched
    assert_eq!(Value::Array(request.messages.clone()), messages);
}

#[tokio::test]
async fn test_chat_defaults_temperature() {
    let provider = StubProvider::text("ok");
    let app = build_test_router(Some(&provider));

    let body = json!({ "messages": [{ "role": "user", "content": "hi" }] });
    app.oneshot(chat_request(&body.to_string())).await.unwrap();

    assert_eq!(provider.requests()[0].temperature, json!(0.7));
}

#[tokio::test]
async fn test_chat_forwards_non_numeric_temperature() {
    let provider = StubProvider::text("ok");
    let app = build_test_router(Some(&provider));

    let body = json!({
        "messages": [{ "role": "user", "content": "hi" }],
        "temperature": "hot"
    });
    let response = app.oneshot(chat_request(&body.to_string())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(provider.requests()[0].temperature, json!("hot"));
}

#[tokio::test]
async fn test_chat_rejects_missing_messages() {
    for body in [
        json!({ "temperature": 0.5 }),
        json!({ "messages": null }),
        json!({ "messages": "hello" }),
        json!({ "messages": { "role": "user" } }),
    ] {
        let provider = StubProvider::text("unused");
        let app = build_test_router(Some(&provider));

        let response = app.oneshot(chat_request(&body.to_string())).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
        assert_eq!(
            json_body(response).await,
            json!({ "error": "Messages array is required" })
        );
        assert!(provider.requests().is_empty());
    }
}

#[tokio::test]
async fn test_chat_provider_error_is_passed_through() {
    let provider = StubProvider::new(StubReply::Fail("429 Rate limit exceeded".to_string()));
    let app = build_test_router(Some(&provider));

    let body = json!({ "messages": [{ "role": "user", "content": "hi" }] });
    let response = app.oneshot(chat_request(&body.to_string())).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json_body(response).await,
        json!({ "error": "429 Rate limit exceeded" })
    );
}

#[tokio::test]
async fn test_chat_provider_error_without_message() {
    let provider = StubProvider::new(StubReply::Fail(String::new()));
    let app = build_test_router(Some(&provider));

    let body = json!({ "messages": [] });
    let response = app.oneshot(chat_request(&body.to_string())).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json_body(response).await,
        json!({ "error": "Internal server error" })
    );
}

#[tokio::test]
async fn test_chat_empty_completion() {
    let provider = StubProvider::new(StubReply::Empty);
    let app = build_test_router(Some(&provider));

    let body = json!({ "messages": [{ "role": "user", "content": "hi" }] });
    let response = app.oneshot(chat_request(&body.to_string())).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({ "message": "No response generated" })
    );
}

#[tokio::test]
async fn test_chat_without_provider() {
    let app = build_test_router(None);

    let body = json!({ "messages": [{ "role": "user", "content": "hi" }] });
    let response = app.oneshot(chat_request(&body.to_string())).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let error = json_body(response).await["error"].as_str().unwrap().to_string();
    assert!(error.contains("OPENAI_API_KEY"));
}

#[tokio::test]
async fn test_chat_malformed_json() {
    let provider = StubProvider::text("unused");
    let app = build_test_router(Some(&provider));

    let response = app.oneshot(chat_request("{not json")).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json_body(response).await["error"].is_string());
    assert!(provider.requests().is_empty());
}

#[tokio::test]
async fn test_chat_rejects_get() {
    let app = build_test_router(None);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/chat")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = build_test_router(None);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "ok");
}

#[tokio::test]
async fn test_ready_with_provider() {
    let provider = StubProvider::text("ok");
    let app = build_test_router(Some(&provider));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/ready")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["checks"]["provider"]["status"], "ok");
}

#[tokio::test]
async fn test_ready_without_provider() {
    let app = build_test_router(None);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/ready")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = json_body(response).await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["checks"]["provider"]["status"], "unavailable");
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let app = build_test_router(None);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header(header::ORIGIN, "http://pod.local")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}

#[tokio::test]
async fn test_serves_static_front_end() {
    let dir = std::env::temp_dir().join(format!("uni-gpt-static-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("index.html"), "<h1>Uni-GPT</h1>").unwrap();

    let app = uni_gpt::api::ApiServerBuilder::new(common::test_relay(None), 0)
        .static_dir(Some(dir.clone()))
        .build()
        .router();

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"<h1>Uni-GPT</h1>");

    let _ = std::fs::remove_dir_all(&dir);
}
