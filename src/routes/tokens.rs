use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::server::Server;
use axum::{extract::State, response::Json, routing::get, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    pub subscription_tokens: i64,
    pub purchased_tokens: i64,
    pub total: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

pub fn create_token_routes() -> Router<Server> {
    Router::new().route("/tokens/balance", get(get_balance))
}

async fn get_balance(
    State(server): State<Server>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<BalanceResponse>, AppError> {
    let balance = server.ledger.balance(user.id).await?;
    Ok(Json(BalanceResponse {
        subscription_tokens: balance.subscription_tokens,
        purchased_tokens: balance.purchased_tokens,
        total: balance.total,
        expires_at: balance.expires_at,
    }))
}
