mod common;

use axum::http::StatusCode;
use chrono::Utc;
use common::{body_json, get_request, json_request};
use pixelnova::database::entities::{PaymentRecord, PaymentStatus};
use pixelnova::test_utils::{balance_of, seed_user, session_token, TestServerBuilder};
use serde_json::json;
use tower::ServiceExt;

async fn seed_payment(
    server: &pixelnova::Server,
    user_id: i32,
    tokens: i64,
    unique_code: i64,
) -> i32 {
    let record = PaymentRecord {
        id: 0,
        user_id,
        amount: 50_000,
        unique_code,
        amount_with_code: 50_000 + unique_code,
        tokens_purchased: tokens,
        bonus_tokens: 0,
        payment_status: PaymentStatus::Pending,
        payment_proof_url: None,
        admin_notes: None,
        verified_by: None,
        verified_at: None,
        created_at: Utc::now(),
    };
    server.database.payments().store(&record).await.unwrap()
}

#[tokio::test]
async fn test_create_payment_assigns_unique_code() {
    let server = TestServerBuilder::new().build().await;
    let user = seed_user(&server, "buyer@example.com", false).await;
    let token = session_token(&server, user.id);

    let response = server
        .create_app()
        .oneshot(json_request(
            "POST",
            "/api/payments",
            &token,
            json!({ "amount": 50000, "tokensPurchased": 100 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "pending");
    assert_eq!(body["tokensPurchased"], 100);

    let code = body["uniqueCode"].as_i64().unwrap();
    assert!((100..=999).contains(&code));
    assert_eq!(body["amountWithCode"].as_i64().unwrap(), 50_000 + code);
}

#[tokio::test]
async fn test_create_payment_rejects_nonpositive_amounts() {
    let server = TestServerBuilder::new().build().await;
    let user = seed_user(&server, "cheap@example.com", false).await;
    let token = session_token(&server, user.id);

    let response = server
        .create_app()
        .oneshot(json_request(
            "POST",
            "/api/payments",
            &token,
            json!({ "amount": 0, "tokensPurchased": 100 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = server
        .create_app()
        .oneshot(json_request(
            "POST",
            "/api/payments",
            &token,
            json!({ "amount": 50000, "tokensPurchased": -5 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_approval_credits_purchased_pool_with_frozen_bonus() {
    let server = TestServerBuilder::new().build().await;
    let admin = seed_user(&server, "admin@example.com", true).await;
    let buyer = seed_user(&server, "buyer@example.com", false).await;
    let payment_id = seed_payment(&server, buyer.id, 100, 1456).await;
    let admin_token = session_token(&server, admin.id);

    let response = server
        .create_app()
        .oneshot(json_request(
            "POST",
            &format!("/api/admin/payments/{payment_id}/approve"),
            &admin_token,
            json!({ "notes": "transfer matched" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "approved");
    assert_eq!(body["bonusTokens"], 1);
    assert_eq!(body["adminNotes"], "transfer matched");

    let balance = balance_of(&server, buyer.id).await.unwrap();
    assert_eq!(balance.purchased_tokens, 101);
    assert_eq!(balance.subscription_tokens, 0);
}

#[tokio::test]
async fn test_double_approval_conflicts_and_credits_once() {
    let server = TestServerBuilder::new().build().await;
    let admin = seed_user(&server, "admin@example.com", true).await;
    let buyer = seed_user(&server, "buyer@example.com", false).await;
    let payment_id = seed_payment(&server, buyer.id, 50, 456).await;
    let admin_token = session_token(&server, admin.id);

    let first = server
        .create_app()
        .oneshot(json_request(
            "POST",
            &format!("/api/admin/payments/{payment_id}/approve"),
            &admin_token,
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = server
        .create_app()
        .oneshot(json_request(
            "POST",
            &format!("/api/admin/payments/{payment_id}/approve"),
            &admin_token,
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);

    let balance = balance_of(&server, buyer.id).await.unwrap();
    assert_eq!(balance.purchased_tokens, 50, "a repeat approval must not credit again");
}

#[tokio::test]
async fn test_rejection_requires_a_note_and_never_credits() {
    let server = TestServerBuilder::new().build().await;
    let admin = seed_user(&server, "admin@example.com", true).await;
    let buyer = seed_user(&server, "buyer@example.com", false).await;
    let payment_id = seed_payment(&server, buyer.id, 50, 456).await;
    let admin_token = session_token(&server, admin.id);

    // No note, no rejection
    let response = server
        .create_app()
        .oneshot(json_request(
            "POST",
            &format!("/api/admin/payments/{payment_id}/reject"),
            &admin_token,
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = server
        .create_app()
        .oneshot(json_request(
            "POST",
            &format!("/api/admin/payments/{payment_id}/reject"),
            &admin_token,
            json!({ "notes": "amount mismatch" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "rejected");
    assert_eq!(body["adminNotes"], "amount mismatch");

    assert!(balance_of(&server, buyer.id).await.is_none());

    // A rejected payment cannot be approved afterwards
    let response = server
        .create_app()
        .oneshot(json_request(
            "POST",
            &format!("/api/admin/payments/{payment_id}/approve"),
            &admin_token,
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_admin_routes_reject_non_admins() {
    let server = TestServerBuilder::new().build().await;
    let user = seed_user(&server, "plain@example.com", false).await;
    let token = session_token(&server, user.id);

    let response = server
        .create_app()
        .oneshot(get_request("/api/admin/payments/pending", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = server
        .create_app()
        .oneshot(json_request(
            "POST",
            "/api/admin/payments/1/approve",
            &token,
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_pending_queue_and_user_history() {
    let server = TestServerBuilder::new().build().await;
    let admin = seed_user(&server, "admin@example.com", true).await;
    let buyer = seed_user(&server, "buyer@example.com", false).await;
    let other = seed_user(&server, "other@example.com", false).await;
    let first = seed_payment(&server, buyer.id, 10, 111).await;
    seed_payment(&server, other.id, 20, 222).await;
    let admin_token = session_token(&server, admin.id);
    let buyer_token = session_token(&server, buyer.id);

    let response = server
        .create_app()
        .oneshot(get_request("/api/admin/payments/pending", &admin_token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let pending = body_json(response).await;
    assert_eq!(pending.as_array().unwrap().len(), 2);

    let response = server
        .create_app()
        .oneshot(get_request("/api/payments", &buyer_token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let history = body_json(response).await;
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["id"].as_i64().unwrap(), first as i64);

    // Approval drains the pending queue
    let response = server
        .create_app()
        .oneshot(json_request(
            "POST",
            &format!("/api/admin/payments/{first}/approve"),
            &admin_token,
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = server
        .create_app()
        .oneshot(get_request("/api/admin/payments/pending", &admin_token))
        .await
        .unwrap();
    let pending = body_json(response).await;
    assert_eq!(pending.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_approving_unknown_payment_is_not_found() {
    let server = TestServerBuilder::new().build().await;
    let admin = seed_user(&server, "admin@example.com", true).await;
    let admin_token = session_token(&server, admin.id);

    let response = server
        .create_app()
        .oneshot(json_request(
            "POST",
            "/api/admin/payments/9999/approve",
            &admin_token,
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
