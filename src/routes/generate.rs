use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::metrics::track_generation;
use crate::pipeline::EnhancementRequest;
use crate::server::Server;
use axum::{extract::State, response::Json, routing::post, Router};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Body of the public `POST /api/generate` call
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub image_url: String,
    /// A single enhancement label or stable key
    pub enhancement: String,
    /// Category hint; skips classification when present
    #[serde(default)]
    pub classification: Option<String>,
    #[serde(default)]
    pub watermark: Option<String>,
    #[serde(default)]
    pub custom_prompt: Option<String>,
}

/// Body of the interactive `POST /api/enhance` call
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhanceRequest {
    pub image_url: String,
    /// One or more enhancement selectors, combined into one prompt
    pub enhancements: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub watermark: Option<String>,
    #[serde(default)]
    pub custom_prompt: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub success: bool,
    pub generated_image_url: String,
    pub prompt: String,
    pub task_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_id: Option<i32>,
}

/// Public API surface, authenticated by API key only
pub fn create_generate_routes() -> Router<Server> {
    Router::new().route("/generate", post(generate))
}

/// Interactive surface, authenticated by JWT session
pub fn create_interactive_routes() -> Router<Server> {
    Router::new().route("/enhance", post(enhance))
}

async fn generate(
    State(server): State<Server>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, AppError> {
    let pipeline_request = EnhancementRequest {
        user_id: user.id,
        image_url: request.image_url,
        enhancements: vec![request.enhancement],
        category_hint: request.classification,
        watermark: request.watermark,
        custom_prompt: request.custom_prompt,
        interactive: false,
    };

    run_pipeline(&server, pipeline_request).await
}

async fn enhance(
    State(server): State<Server>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(request): Json<EnhanceRequest>,
) -> Result<Json<GenerateResponse>, AppError> {
    let pipeline_request = EnhancementRequest {
        user_id: user.id,
        image_url: request.image_url,
        enhancements: request.enhancements,
        category_hint: request.category,
        watermark: request.watermark,
        custom_prompt: request.custom_prompt,
        interactive: true,
    };

    run_pipeline(&server, pipeline_request).await
}

async fn run_pipeline(
    server: &Server,
    request: EnhancementRequest,
) -> Result<Json<GenerateResponse>, AppError> {
    let start = Instant::now();

    match server.pipeline.run(request).await {
        Ok(outcome) => {
            track_generation(
                if outcome.persisted { "persisted" } else { "unpersisted" },
                start.elapsed(),
            );
            Ok(Json(GenerateResponse {
                success: true,
                generated_image_url: outcome.generated_image_url,
                prompt: outcome.prompt,
                task_id: outcome.task_id,
                generation_id: outcome.generation_id,
            }))
        }
        Err(e) => {
            track_generation(
                match &e {
                    AppError::TimedOut(_) => "timed_out",
                    AppError::InsufficientTokens { .. } => "insufficient_tokens",
                    AppError::Validation(_) => "invalid",
                    _ => "failed",
                },
                start.elapsed(),
            );
            Err(e)
        }
    }
}
