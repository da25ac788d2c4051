mod common;

use axum::http::StatusCode;
use common::{body_json, json_request};
use pixelnova::provider::MockImageProvider;
use pixelnova::test_utils::{balance_of, seed_balance, seed_user, session_token, TestServerBuilder};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;

#[tokio::test]
async fn test_enhance_with_last_token_persists_and_zeroes_balance() {
    let provider = Arc::new(MockImageProvider::succeed_immediately(
        "data:image/png;base64,aGVsbG8=",
    ));
    let server = TestServerBuilder::new()
        .with_provider(provider.clone())
        .build()
        .await;
    let user = seed_user(&server, "lasttoken@example.com", false).await;
    seed_balance(&server, user.id, 1, 0).await;
    let token = session_token(&server, user.id);

    let response = server
        .create_app()
        .oneshot(json_request(
            "POST",
            "/api/enhance",
            &token,
            json!({
                "imageUrl": "https://cdn.example.com/input.jpg",
                "enhancements": ["skin smoothing"]
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["taskId"], "task-0001");
    assert!(body["generationId"].is_number());
    assert!(
        body["generatedImageUrl"]
            .as_str()
            .unwrap()
            .starts_with("memory://"),
        "persisted result must be served from the object store"
    );

    let balance = balance_of(&server, user.id).await.unwrap();
    assert_eq!(balance.subscription_tokens + balance.purchased_tokens, 0);

    let records = server
        .database
        .generations()
        .find_by_user(user.id)
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].enhancement_type, "skin smoothing");
    assert_eq!(records[0].original_image_path, "https://cdn.example.com/input.jpg");
    assert!(records[0].presigned_url.is_some());
}

#[tokio::test]
async fn test_enhance_with_zero_balance_never_reaches_provider() {
    let provider = Arc::new(MockImageProvider::succeed_immediately(
        "data:image/png;base64,aGVsbG8=",
    ));
    let server = TestServerBuilder::new()
        .with_provider(provider.clone())
        .build()
        .await;
    let user = seed_user(&server, "broke@example.com", false).await;
    let token = session_token(&server, user.id);

    let response = server
        .create_app()
        .oneshot(json_request(
            "POST",
            "/api/enhance",
            &token,
            json!({
                "imageUrl": "https://cdn.example.com/input.jpg",
                "enhancements": ["skin smoothing"]
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(provider.submit_count(), 0);

    let records = server
        .database
        .generations()
        .find_by_user(user.id)
        .await
        .unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn test_provider_failure_refunds_the_debit() {
    let provider = Arc::new(MockImageProvider::fail_on(3, "content policy violation"));
    let server = TestServerBuilder::new()
        .with_provider(provider.clone())
        .build()
        .await;
    let user = seed_user(&server, "unlucky@example.com", false).await;
    seed_balance(&server, user.id, 0, 1).await;
    let token = session_token(&server, user.id);

    let response = server
        .create_app()
        .oneshot(json_request(
            "POST",
            "/api/enhance",
            &token,
            json!({
                "imageUrl": "https://cdn.example.com/input.jpg",
                "enhancements": ["skin smoothing"]
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = body_json(response).await;
    assert!(
        body["message"].as_str().unwrap().contains("content policy violation"),
        "provider failure message must reach the caller"
    );
    assert_eq!(provider.poll_count(), 3);

    // The compensating credit restores the spendable total
    let balance = balance_of(&server, user.id).await.unwrap();
    assert_eq!(balance.subscription_tokens + balance.purchased_tokens, 1);

    let records = server
        .database
        .generations()
        .find_by_user(user.id)
        .await
        .unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn test_polling_budget_exhaustion_times_out_and_refunds() {
    let provider = Arc::new(MockImageProvider::never_complete());
    let server = TestServerBuilder::new()
        .with_provider(provider.clone())
        .with_config(|config| config.pipeline.max_poll_attempts = 5)
        .build()
        .await;
    let user = seed_user(&server, "stuck@example.com", false).await;
    seed_balance(&server, user.id, 1, 0).await;
    let token = session_token(&server, user.id);

    let response = server
        .create_app()
        .oneshot(json_request(
            "POST",
            "/api/enhance",
            &token,
            json!({
                "imageUrl": "https://cdn.example.com/input.jpg",
                "enhancements": ["skin smoothing"]
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(provider.poll_count(), 5, "exactly the attempt budget is spent");

    let balance = balance_of(&server, user.id).await.unwrap();
    assert_eq!(balance.subscription_tokens, 1);
}

#[tokio::test]
async fn test_submit_rejection_surfaces_provider_status() {
    use pixelnova::error::AppError;

    let provider = Arc::new(MockImageProvider::reject_submit(AppError::CreditsExhausted(
        "provider account out of credits".to_string(),
    )));
    let server = TestServerBuilder::new()
        .with_provider(provider.clone())
        .build()
        .await;
    let user = seed_user(&server, "upstream@example.com", false).await;
    seed_balance(&server, user.id, 1, 0).await;
    let token = session_token(&server, user.id);

    let response = server
        .create_app()
        .oneshot(json_request(
            "POST",
            "/api/enhance",
            &token,
            json!({
                "imageUrl": "https://cdn.example.com/input.jpg",
                "enhancements": ["skin smoothing"]
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
    assert_eq!(provider.submit_count(), 1);
    assert_eq!(provider.poll_count(), 0);

    let balance = balance_of(&server, user.id).await.unwrap();
    assert_eq!(balance.subscription_tokens, 1, "rejected submit is refunded");
}

#[tokio::test]
async fn test_empty_enhancement_list_rejected_before_debit() {
    let provider = Arc::new(MockImageProvider::succeed_immediately(
        "data:image/png;base64,aGVsbG8=",
    ));
    let server = TestServerBuilder::new()
        .with_provider(provider.clone())
        .build()
        .await;
    let user = seed_user(&server, "novalid@example.com", false).await;
    seed_balance(&server, user.id, 1, 0).await;
    let token = session_token(&server, user.id);

    let response = server
        .create_app()
        .oneshot(json_request(
            "POST",
            "/api/enhance",
            &token,
            json!({
                "imageUrl": "https://cdn.example.com/input.jpg",
                "enhancements": []
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(provider.submit_count(), 0);

    let balance = balance_of(&server, user.id).await.unwrap();
    assert_eq!(balance.subscription_tokens, 1);
}

#[tokio::test]
async fn test_too_many_enhancements_rejected() {
    let server = TestServerBuilder::new()
        .with_config(|config| config.pipeline.max_combined_enhancements = 2)
        .build()
        .await;
    let user = seed_user(&server, "greedy@example.com", false).await;
    seed_balance(&server, user.id, 1, 0).await;
    let token = session_token(&server, user.id);

    let response = server
        .create_app()
        .oneshot(json_request(
            "POST",
            "/api/enhance",
            &token,
            json!({
                "imageUrl": "https://cdn.example.com/input.jpg",
                "enhancements": ["a", "b", "c"]
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_combined_enhancements_cost_a_single_token() {
    let provider = Arc::new(MockImageProvider::succeed_immediately(
        "data:image/png;base64,aGVsbG8=",
    ));
    let server = TestServerBuilder::new()
        .with_provider(provider.clone())
        .build()
        .await;
    let user = seed_user(&server, "bundle@example.com", false).await;
    seed_balance(&server, user.id, 2, 0).await;
    let token = session_token(&server, user.id);

    let response = server
        .create_app()
        .oneshot(json_request(
            "POST",
            "/api/enhance",
            &token,
            json!({
                "imageUrl": "https://cdn.example.com/input.jpg",
                "enhancements": ["skin smoothing", "better lighting"]
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let balance = balance_of(&server, user.id).await.unwrap();
    assert_eq!(balance.subscription_tokens, 1);

    let prompt = provider.last_prompt().unwrap();
    assert!(prompt.contains("1."));
    assert!(prompt.contains("2."));
}

#[tokio::test]
async fn test_enhance_requires_authentication() {
    let server = TestServerBuilder::new().build().await;

    let request = axum::http::Request::builder()
        .uri("/api/enhance")
        .method("POST")
        .header("Content-Type", "application/json")
        .body(axum::body::Body::from(
            json!({ "imageUrl": "x", "enhancements": ["y"] }).to_string(),
        ))
        .unwrap();

    let response = server.create_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
