use crate::auth::AuthenticatedUser;
use crate::database::entities::{SubscriptionPlan, UserRecord};
use crate::error::AppError;
use crate::server::Server;
use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post, put},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: i32,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub subscription_plan: String,
    pub monthly_generate_limit: i32,
    pub current_month_generates: i32,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl From<UserRecord> for UserView {
    fn from(u: UserRecord) -> Self {
        Self {
            id: u.id,
            email: u.email,
            display_name: u.display_name,
            subscription_plan: match u.subscription_plan {
                SubscriptionPlan::Free => "free".to_string(),
                SubscriptionPlan::Basic => "basic".to_string(),
                SubscriptionPlan::Pro => "pro".to_string(),
            },
            monthly_generate_limit: u.monthly_generate_limit,
            current_month_generates: u.current_month_generates,
            is_admin: u.is_admin,
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePlanRequest {
    pub plan: String,
    #[serde(default)]
    pub monthly_limit: Option<i32>,
}

pub fn create_admin_user_routes() -> Router<Server> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/{user_id}/plan", put(update_plan))
        .route("/users/{user_id}/reset-usage", post(reset_usage))
}

async fn list_users(
    State(server): State<Server>,
    AuthenticatedUser(_admin): AuthenticatedUser,
) -> Result<Json<Vec<UserView>>, AppError> {
    let users = server.database.users().list_all().await?;
    Ok(Json(users.into_iter().map(Into::into).collect()))
}

async fn update_plan(
    State(server): State<Server>,
    AuthenticatedUser(_admin): AuthenticatedUser,
    Path(user_id): Path<i32>,
    Json(request): Json<UpdatePlanRequest>,
) -> Result<Json<UserView>, AppError> {
    let plan = match request.plan.as_str() {
        "free" => SubscriptionPlan::Free,
        "basic" => SubscriptionPlan::Basic,
        "pro" => SubscriptionPlan::Pro,
        other => {
            return Err(AppError::Validation(format!(
                "unknown subscription plan: {other}"
            )));
        }
    };

    let updated = server
        .database
        .users()
        .update_plan(user_id, plan, request.monthly_limit)
        .await?;

    tracing::info!(user_id, plan = %request.plan, "subscription plan changed");
    Ok(Json(updated.into()))
}

async fn reset_usage(
    State(server): State<Server>,
    AuthenticatedUser(_admin): AuthenticatedUser,
    Path(user_id): Path<i32>,
) -> Result<Json<serde_json::Value>, AppError> {
    server.database.users().reset_monthly_usage(user_id).await?;
    Ok(Json(serde_json::json!({ "reset": true })))
}
