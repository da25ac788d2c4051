use crate::database::DatabaseError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Application error taxonomy
///
/// Every terminal failure surfaces to the caller as a JSON body with a
/// machine-readable `error` field and a human-readable `message`.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Insufficient tokens: {subscription} subscription, {purchased} purchased available")]
    InsufficientTokens { subscription: i64, purchased: i64 },
    #[error("Provider error: {0}")]
    Provider(String),
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),
    #[error("Provider credits exhausted: {0}")]
    CreditsExhausted(String),
    #[error("Generation timed out: {0}")]
    TimedOut(String),
    #[error("Persistence error: {0}")]
    Persistence(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn error_code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_error",
            AppError::InsufficientTokens { .. } => "insufficient_tokens",
            AppError::Provider(_) => "provider_error",
            AppError::RateLimited(_) => "rate_limited",
            AppError::CreditsExhausted(_) => "credits_exhausted",
            AppError::TimedOut(_) => "timed_out",
            AppError::Persistence(_) => "persistence_error",
            AppError::Unauthorized(_) | AppError::Jwt(_) => "unauthorized",
            AppError::Forbidden(_) => "forbidden",
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::Config(_) => "configuration_error",
            AppError::Database(_) | AppError::Internal(_) => "internal_error",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) | AppError::Jwt(_) => StatusCode::UNAUTHORIZED,
            AppError::CreditsExhausted(_) => StatusCode::PAYMENT_REQUIRED,
            AppError::Forbidden(_) | AppError::InsufficientTokens { .. } => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Provider(_) => StatusCode::BAD_GATEWAY,
            AppError::TimedOut(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Persistence(_)
            | AppError::Config(_)
            | AppError::Database(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Insufficient-tokens responses carry the current balances so the
        // caller can act on them.
        let body = match &self {
            AppError::InsufficientTokens {
                subscription,
                purchased,
            } => Json(json!({
                "error": self.error_code(),
                "message": self.to_string(),
                "subscription_tokens": subscription,
                "purchased_tokens": purchased,
            })),
            _ => Json(json!({
                "error": self.error_code(),
                "message": self.to_string(),
            })),
        };

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Unauthorized("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::CreditsExhausted("x".into()).status_code(),
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(
            AppError::InsufficientTokens {
                subscription: 0,
                purchased: 0
            }
            .status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::RateLimited("x".into()).status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AppError::TimedOut("x".into()).status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            AppError::Provider("x".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_display_includes_detail() {
        let err = AppError::Provider("upstream said no".to_string());
        assert!(err.to_string().contains("upstream said no"));

        let err = AppError::InsufficientTokens {
            subscription: 2,
            purchased: 1,
        };
        assert!(err.to_string().contains("2 subscription"));
    }

    #[test]
    fn test_into_response_status() {
        let response = AppError::TimedOut("poll budget exhausted".into()).into_response();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);

        let response = AppError::Internal("boom".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
