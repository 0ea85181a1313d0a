use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

mod common;

use common::{body_json, get, post_json, StubGateway};

const WELL_FORMED: &str = "---START_RESPONSE---\nCORRECTED_TEXT: I am happy.\nCHANGES_LIST:\n- Fixed tense.\n---END_RESPONSE---";

const VOCABULARY_REPLY: &str = "1. Word: diligent\nDefinition: careful and hard-working\nExample: She is a diligent analyst.\n2. Word: succinct\nDefinition: briefly and clearly expressed\nExample: Keep the summary succinct.\n";

#[tokio::test]
async fn test_root_message() {
    let app = common::create_uninitialized_app();

    let response = app.oneshot(get("/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["message"].as_str().unwrap().contains("is running"));
}

#[tokio::test]
async fn test_health_live() {
    let app = common::create_uninitialized_app();

    let response = app.oneshot(get("/health/live")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_health_reports_gateway_state() {
    let app = common::create_uninitialized_app();
    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let app = common::create_test_app(StubGateway::replying(WELL_FORMED));
    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["gatewayReady"], true);
    assert_eq!(body["provider"], "openai");
    assert_eq!(body["model"], "stub-model");
}

#[tokio::test]
async fn test_feedback_success() {
    let gateway = StubGateway::replying(WELL_FORMED);
    let app = common::create_test_app(gateway.clone());

    let response = app
        .oneshot(post_json("/api/v1/feedback", json!({ "text": "I am happy" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["corrected_text"], "I am happy.");
    assert_eq!(body["changes_list"], json!(["Fixed tense."]));
    assert_eq!(gateway.calls.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_feedback_passes_level_and_context_to_prompt() {
    let gateway = StubGateway::replying(WELL_FORMED);
    let app = common::create_test_app(gateway.clone());

    let response = app
        .oneshot(post_json(
            "/api/v1/feedback",
            json!({ "text": "Dear team", "level": "b1", "context": "an internal memo" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let prompts = gateway.prompts();
    assert!(prompts[0].contains("(B1)"));
    assert!(prompts[0].contains("an internal memo"));
    assert!(prompts[0].contains("\"Dear team\""));
}

#[tokio::test]
async fn test_feedback_malformed_reply_falls_back() {
    let raw = "Sorry, I cannot follow that format.";
    let app = common::create_test_app(StubGateway::replying(raw));

    let response = app
        .oneshot(post_json("/api/v1/feedback", json!({ "text": "Hello" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["corrected_text"], raw);
    let changes = body["changes_list"].as_array().unwrap();
    assert_eq!(changes.len(), 1);
    assert!(changes[0].as_str().unwrap().starts_with("Parsing failed"));
}

#[tokio::test]
async fn test_feedback_blank_text_is_bad_request() {
    let gateway = StubGateway::replying(WELL_FORMED);
    let app = common::create_test_app(gateway.clone());

    let response = app
        .oneshot(post_json("/api/v1/feedback", json!({ "text": "   " })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(gateway.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_feedback_missing_text_is_bad_request() {
    let app = common::create_test_app(StubGateway::replying(WELL_FORMED));

    let response = app
        .oneshot(post_json("/api/v1/feedback", json!({ "level": "B2" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_feedback_invalid_json_is_bad_request() {
    let app = common::create_test_app(StubGateway::replying(WELL_FORMED));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/feedback")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_feedback_long_text_reaches_gateway() {
    let gateway = StubGateway::replying(WELL_FORMED);
    let app = common::create_test_app(gateway.clone());

    let response = app
        .oneshot(post_json("/api/v1/feedback", json!({ "text": "word ".repeat(1200) })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(gateway.calls.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_feedback_text_is_forwarded_untrimmed() {
    let gateway = StubGateway::replying(WELL_FORMED);
    let app = common::create_test_app(gateway.clone());

    let response = app
        .oneshot(post_json(
            "/api/v1/feedback",
            json!({ "text": "  hello  ", "context": " a memo " }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let prompts = gateway.prompts();
    assert!(prompts[0].contains("\"  hello  \""));
    assert!(prompts[0].contains("this context:  a memo "));
}

#[tokio::test]
async fn test_feedback_without_gateway_is_unavailable() {
    let app = common::create_uninitialized_app();

    let response = app
        .oneshot(post_json("/api/v1/feedback", json!({ "text": "Hello" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "SERVICE_UNAVAILABLE");
}

#[tokio::test]
async fn test_feedback_generation_failure_is_server_error() {
    let app = common::create_test_app(StubGateway::failing("openai provider returned HTTP 500"));

    let response = app
        .oneshot(post_json("/api/v1/feedback", json!({ "text": "Hello" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["code"], "GENERATION_FAILED");
    assert!(body["detail"].as_str().unwrap().contains("HTTP 500"));
}

#[tokio::test]
async fn test_daily_task() {
    let gateway = StubGateway::replying("Write a 150-word email declining a meeting invitation.");
    let app = common::create_test_app(gateway.clone());

    let response = app
        .oneshot(get("/api/v1/daily-task?level=B2&context=sales"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(
        body["task"],
        "Write a 150-word email declining a meeting invitation."
    );
    assert!(gateway.prompts()[0].contains("relate to: sales"));
}

#[tokio::test]
async fn test_daily_task_without_gateway_is_unavailable() {
    let app = common::create_uninitialized_app();

    let response = app.oneshot(get("/api/v1/daily-task")).await.unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_daily_task_generation_failure() {
    let app = common::create_test_app(StubGateway::failing("gemini request timed out"));

    let response = app.oneshot(get("/api/v1/daily-task")).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_vocabulary_list() {
    let gateway = StubGateway::replying(VOCABULARY_REPLY);
    let app = common::create_test_app(gateway.clone());

    let response = app
        .oneshot(get("/api/v1/vocabulary-list?level=C1&topic=finance&count=2"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let vocabulary = body["vocabulary"].as_array().unwrap();
    assert_eq!(vocabulary.len(), 2);
    assert_eq!(vocabulary[0]["word"], "diligent");
    assert_eq!(vocabulary[1]["example"], "Keep the summary succinct.");
    assert!(gateway.prompts()[0].contains("List 2 words on the topic \"finance\""));
}

#[tokio::test]
async fn test_vocabulary_unparseable_reply_is_server_error() {
    let app = common::create_test_app(StubGateway::replying("Here is a vocabulary list!"));

    let response = app.oneshot(get("/api/v1/vocabulary-list")).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["code"], "PARSE_ERROR");
}

#[tokio::test]
async fn test_cors_preflight_allows_configured_origin() {
    let app = common::create_test_app(StubGateway::replying(WELL_FORMED));

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/v1/feedback")
                .header("origin", "http://localhost:5173")
                .header("access-control-request-method", "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "http://localhost:5173"
    );
}

#[tokio::test]
async fn test_404_not_found() {
    let app = common::create_uninitialized_app();

    let response = app.oneshot(get("/nonexistent/path")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_info() {
    let app = common::create_uninitialized_app();

    let response = app.oneshot(get("/health/info")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}
