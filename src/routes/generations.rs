use crate::auth::AuthenticatedUser;
use crate::database::entities::GenerationRecord;
use crate::error::AppError;
use crate::server::Server;
use axum::{extract::State, response::Json, routing::get, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationView {
    pub id: i32,
    pub original_image_path: String,
    pub enhancement_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification_result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

pub fn create_generation_routes() -> Router<Server> {
    Router::new().route("/generations", get(list_generations))
}

/// A user's generation history, newest first. Stale presigned URLs are
/// re-issued on read so the history viewer always gets live links.
async fn list_generations(
    State(server): State<Server>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Vec<GenerationView>>, AppError> {
    let records = server.database.generations().find_by_user(user.id).await?;

    let mut views = Vec::with_capacity(records.len());
    for record in records {
        let image_url = refreshed_url(&server, &record).await;
        views.push(GenerationView {
            id: record.id,
            original_image_path: record.original_image_path,
            enhancement_type: record.enhancement_type,
            classification_result: record.classification_result,
            image_url,
            created_at: record.created_at,
        });
    }

    Ok(Json(views))
}

async fn refreshed_url(server: &Server, record: &GenerationRecord) -> Option<String> {
    let now = Utc::now();
    let still_valid = record
        .presigned_url_expires_at
        .map(|expires| expires > now)
        .unwrap_or(false);
    if still_valid {
        return record.presigned_url.clone();
    }

    let ttl = server.config.pipeline.interactive_presign_ttl_secs;
    match server
        .pipeline
        .presign_cached(&record.generated_image_path, ttl)
        .await
    {
        Ok(url) => {
            let expires_at = now + chrono::Duration::seconds(ttl as i64);
            if let Err(e) = server
                .database
                .generations()
                .update_presigned_url(record.id, url.clone(), expires_at)
                .await
            {
                tracing::warn!(generation_id = record.id, error = %e, "presign refresh not stored");
            }
            Some(url)
        }
        Err(e) => {
            tracing::warn!(generation_id = record.id, error = %e, "presign refresh failed");
            record.presigned_url.clone()
        }
    }
}
