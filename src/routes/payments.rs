use crate::auth::AuthenticatedUser;
use crate::database::entities::{PaymentRecord, PaymentStatus};
use crate::error::AppError;
use crate::metrics::track_payment;
use crate::server::Server;
use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    pub amount: i64,
    pub tokens_purchased: i64,
    #[serde(default)]
    pub payment_proof_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentRequest {
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentView {
    pub id: i32,
    pub user_id: i32,
    pub amount: i64,
    pub unique_code: i64,
    pub amount_with_code: i64,
    pub tokens_purchased: i64,
    pub bonus_tokens: i64,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<PaymentRecord> for PaymentView {
    fn from(p: PaymentRecord) -> Self {
        Self {
            id: p.id,
            user_id: p.user_id,
            amount: p.amount,
            unique_code: p.unique_code,
            amount_with_code: p.amount_with_code,
            tokens_purchased: p.tokens_purchased,
            bonus_tokens: p.bonus_tokens,
            status: match p.payment_status {
                PaymentStatus::Pending => "pending".to_string(),
                PaymentStatus::Approved => "approved".to_string(),
                PaymentStatus::Rejected => "rejected".to_string(),
            },
            admin_notes: p.admin_notes,
            verified_at: p.verified_at,
            created_at: p.created_at,
        }
    }
}

pub fn create_payment_routes() -> Router<Server> {
    Router::new()
        .route("/payments", post(create_payment))
        .route("/payments", get(list_my_payments))
}

pub fn create_admin_payment_routes() -> Router<Server> {
    Router::new()
        .route("/payments/pending", get(list_pending))
        .route("/payments/{payment_id}/approve", post(approve_payment))
        .route("/payments/{payment_id}/reject", post(reject_payment))
}

/// Create a pending payment; the response carries the unique code the
/// user must add to the transferred amount.
async fn create_payment(
    State(server): State<Server>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(request): Json<CreatePaymentRequest>,
) -> Result<Json<PaymentView>, AppError> {
    let payment = server
        .payments
        .create(
            user.id,
            request.amount,
            request.tokens_purchased,
            request.payment_proof_url,
        )
        .await?;

    track_payment("created");
    Ok(Json(payment.into()))
}

async fn list_my_payments(
    State(server): State<Server>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Vec<PaymentView>>, AppError> {
    let payments = server.payments.list_for_user(user.id).await?;
    Ok(Json(payments.into_iter().map(Into::into).collect()))
}

async fn list_pending(
    State(server): State<Server>,
    AuthenticatedUser(_admin): AuthenticatedUser,
) -> Result<Json<Vec<PaymentView>>, AppError> {
    let payments = server.payments.list_pending().await?;
    Ok(Json(payments.into_iter().map(Into::into).collect()))
}

async fn approve_payment(
    State(server): State<Server>,
    AuthenticatedUser(admin): AuthenticatedUser,
    Path(payment_id): Path<i32>,
    Json(request): Json<VerifyPaymentRequest>,
) -> Result<Json<PaymentView>, AppError> {
    let payment = server
        .payments
        .approve(payment_id, admin.id, request.notes)
        .await?;

    track_payment("approved");
    Ok(Json(payment.into()))
}

async fn reject_payment(
    State(server): State<Server>,
    AuthenticatedUser(admin): AuthenticatedUser,
    Path(payment_id): Path<i32>,
    Json(request): Json<VerifyPaymentRequest>,
) -> Result<Json<PaymentView>, AppError> {
    let notes = request
        .notes
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| AppError::Validation("rejection requires a non-empty note".to_string()))?;

    let payment = server.payments.reject(payment_id, admin.id, notes).await?;

    track_payment("rejected");
    Ok(Json(payment.into()))
}
