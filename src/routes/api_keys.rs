use crate::auth::AuthenticatedUser;
use crate::database::entities::ApiKeyRecord;
use crate::error::AppError;
use crate::server::Server;
use axum::{
    extract::{Path, State},
    response::Json,
    routing::{delete, get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CreateApiKeyRequest {
    pub name: String,
}

/// Creation response; the only place the raw key ever appears
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateApiKeyResponse {
    pub id: i32,
    pub name: String,
    pub key: String,
    pub key_preview: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyView {
    pub id: i32,
    pub name: String,
    pub key_preview: String,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_used: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revoked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<ApiKeyRecord> for ApiKeyView {
    fn from(k: ApiKeyRecord) -> Self {
        Self {
            id: k.id,
            name: k.name,
            key_preview: k.key_preview,
            is_active: k.is_active,
            last_used: k.last_used,
            revoked_at: k.revoked_at,
            created_at: k.created_at,
        }
    }
}

pub fn create_api_key_routes() -> Router<Server> {
    Router::new()
        .route("/keys", post(create_key))
        .route("/keys", get(list_keys))
        .route("/keys/{key_id}/revoke", post(revoke_key))
        .route("/keys/{key_id}", delete(delete_key))
}

async fn create_key(
    State(server): State<Server>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(request): Json<CreateApiKeyRequest>,
) -> Result<Json<CreateApiKeyResponse>, AppError> {
    let created = server.api_keys.create(&user, request.name).await?;

    Ok(Json(CreateApiKeyResponse {
        id: created.record.id,
        name: created.record.name,
        key: created.raw_key,
        key_preview: created.record.key_preview,
        created_at: created.record.created_at,
    }))
}

async fn list_keys(
    State(server): State<Server>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Vec<ApiKeyView>>, AppError> {
    let keys = server.api_keys.list(user.id).await?;
    Ok(Json(keys.into_iter().map(Into::into).collect()))
}

async fn revoke_key(
    State(server): State<Server>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(key_id): Path<i32>,
) -> Result<Json<serde_json::Value>, AppError> {
    server.api_keys.revoke(user.id, key_id).await?;
    Ok(Json(serde_json::json!({ "revoked": true })))
}

async fn delete_key(
    State(server): State<Server>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(key_id): Path<i32>,
) -> Result<Json<serde_json::Value>, AppError> {
    server.api_keys.delete(user.id, key_id).await?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}
