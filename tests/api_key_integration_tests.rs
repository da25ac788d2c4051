mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{body_json, get_request, json_request};
use pixelnova::database::entities::SubscriptionPlan;
use pixelnova::test_utils::{seed_balance, seed_user, session_token, TestServerBuilder};
use serde_json::json;
use tower::ServiceExt;

async fn upgrade(server: &pixelnova::Server, user_id: i32) {
    server
        .database
        .users()
        .update_plan(user_id, SubscriptionPlan::Basic, None)
        .await
        .unwrap();
}

async fn create_key(server: &pixelnova::Server, token: &str, name: &str) -> serde_json::Value {
    let response = server
        .create_app()
        .oneshot(json_request("POST", "/api/keys", token, json!({ "name": name })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

fn generate_request(api_key: &str) -> Request<Body> {
    Request::builder()
        .uri("/api/generate")
        .method("POST")
        .header("x-api-key", api_key)
        .header("Content-Type", "application/json")
        .body(Body::from(
            json!({
                "imageUrl": "https://cdn.example.com/input.jpg",
                "enhancement": "skin smoothing"
            })
            .to_string(),
        ))
        .unwrap()
}

#[tokio::test]
async fn test_key_creation_returns_raw_key_exactly_once() {
    let server = TestServerBuilder::new().build().await;
    let user = seed_user(&server, "dev@example.com", false).await;
    upgrade(&server, user.id).await;
    let token = session_token(&server, user.id);

    let created = create_key(&server, &token, "ci pipeline").await;
    let raw_key = created["key"].as_str().unwrap();
    assert!(raw_key.starts_with("PNVA_"));
    assert_eq!(created["name"], "ci pipeline");
    assert!(created["keyPreview"].as_str().unwrap().len() < raw_key.len());

    // Listing never repeats the raw key
    let response = server
        .create_app()
        .oneshot(get_request("/api/keys", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let listed = body_json(response).await;
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert!(listed[0].get("key").is_none());
    assert_eq!(listed[0]["isActive"], true);
}

#[tokio::test]
async fn test_free_plan_cannot_create_keys() {
    let server = TestServerBuilder::new().build().await;
    let user = seed_user(&server, "free@example.com", false).await;
    let token = session_token(&server, user.id);

    let response = server
        .create_app()
        .oneshot(json_request("POST", "/api/keys", &token, json!({ "name": "nope" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_key_limit_per_user() {
    let server = TestServerBuilder::new()
        .with_config(|config| config.api_keys.max_keys_per_user = 1)
        .build()
        .await;
    let user = seed_user(&server, "hoarder@example.com", false).await;
    upgrade(&server, user.id).await;
    let token = session_token(&server, user.id);

    create_key(&server, &token, "first").await;

    let response = server
        .create_app()
        .oneshot(json_request("POST", "/api/keys", &token, json!({ "name": "second" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_generate_authenticates_with_api_key() {
    let server = TestServerBuilder::new().build().await;
    let user = seed_user(&server, "dev@example.com", false).await;
    upgrade(&server, user.id).await;
    seed_balance(&server, user.id, 1, 0).await;
    let token = session_token(&server, user.id);

    let created = create_key(&server, &token, "prod").await;
    let raw_key = created["key"].as_str().unwrap();

    let response = server
        .create_app()
        .oneshot(generate_request(raw_key))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert!(body["generatedImageUrl"].as_str().unwrap().starts_with("memory://"));
}

#[tokio::test]
async fn test_generate_rejects_jwt_sessions() {
    let server = TestServerBuilder::new().build().await;
    let user = seed_user(&server, "browser@example.com", false).await;
    seed_balance(&server, user.id, 1, 0).await;
    let token = session_token(&server, user.id);

    // Bearer JWT is the interactive credential; the public surface
    // takes keys only.
    let response = server
        .create_app()
        .oneshot(json_request(
            "POST",
            "/api/generate",
            &token,
            json!({ "imageUrl": "x", "enhancement": "y" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_revoked_key_is_rejected() {
    let server = TestServerBuilder::new().build().await;
    let user = seed_user(&server, "dev@example.com", false).await;
    upgrade(&server, user.id).await;
    seed_balance(&server, user.id, 2, 0).await;
    let token = session_token(&server, user.id);

    let created = create_key(&server, &token, "leaked").await;
    let raw_key = created["key"].as_str().unwrap().to_string();
    let key_id = created["id"].as_i64().unwrap();

    let response = server
        .create_app()
        .oneshot(generate_request(&raw_key))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = server
        .create_app()
        .oneshot(json_request(
            "POST",
            &format!("/api/keys/{key_id}/revoke"),
            &token,
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = server
        .create_app()
        .oneshot(generate_request(&raw_key))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_api_key_works_as_bearer_on_interactive_surface() {
    let server = TestServerBuilder::new().build().await;
    let user = seed_user(&server, "dev@example.com", false).await;
    upgrade(&server, user.id).await;
    seed_balance(&server, user.id, 3, 2).await;
    let token = session_token(&server, user.id);

    let created = create_key(&server, &token, "scripts").await;
    let raw_key = created["key"].as_str().unwrap();

    let response = server
        .create_app()
        .oneshot(get_request("/api/tokens/balance", raw_key))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["subscriptionTokens"], 3);
    assert_eq!(body["purchasedTokens"], 2);
}

#[tokio::test]
async fn test_garbage_key_is_unauthorized() {
    let server = TestServerBuilder::new().build().await;

    let response = server
        .create_app()
        .oneshot(generate_request("PNVA_definitely-not-issued"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = server
        .create_app()
        .oneshot(generate_request("wrong-prefix"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_deleted_key_disappears_from_listing() {
    let server = TestServerBuilder::new().build().await;
    let user = seed_user(&server, "dev@example.com", false).await;
    upgrade(&server, user.id).await;
    let token = session_token(&server, user.id);

    let created = create_key(&server, &token, "temporary").await;
    let key_id = created["id"].as_i64().unwrap();

    let request = Request::builder()
        .uri(format!("/api/keys/{key_id}"))
        .method("DELETE")
        .header("Authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let response = server.create_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = server
        .create_app()
        .oneshot(get_request("/api/keys", &token))
        .await
        .unwrap();
    let listed = body_json(response).await;
    assert!(listed.as_array().unwrap().is_empty());
}
