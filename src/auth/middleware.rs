use crate::database::entities::api_keys::{
    hash_api_key, validate_api_key_format, API_KEY_PREFIX,
};
use crate::database::entities::UserRecord;
use crate::error::AppError;
use crate::server::Server;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderName},
    middleware::Next,
    response::Response,
};

static X_API_KEY: HeaderName = HeaderName::from_static("x-api-key");

/// Hash of the API key a request authenticated with, for per-key rate
/// limiting downstream
#[derive(Debug, Clone)]
pub struct ApiKeyIdentity(pub String);

/// Unified authentication: Bearer JWT, Bearer API key, or `x-api-key`
/// header. Puts the authenticated [`UserRecord`] into extensions.
pub async fn auth_middleware(
    State(server): State<Server>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = if let Some(auth_header) = request.headers().get(AUTHORIZATION) {
        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid Authorization header".to_string()))?;
        let token = auth_str
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Unauthorized("Invalid Authorization format".to_string()))?;

        if token.starts_with(API_KEY_PREFIX) {
            let (user, key_hash) = authenticate_with_api_key(token, &server).await?;
            request.extensions_mut().insert(ApiKeyIdentity(key_hash));
            user
        } else {
            authenticate_with_jwt(token, &server).await?
        }
    } else if let Some(header) = request.headers().get(&X_API_KEY) {
        let api_key = header
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid API key header".to_string()))?;
        let (user, key_hash) = authenticate_with_api_key(api_key, &server).await?;
        request.extensions_mut().insert(ApiKeyIdentity(key_hash));
        user
    } else {
        return Err(AppError::Unauthorized(
            "Missing authentication credentials".to_string(),
        ));
    };

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// API-key-only authentication for the public `/api/generate` surface.
/// JWT sessions are rejected here: third-party callers hold keys, not
/// browser sessions.
pub async fn api_key_only_middleware(
    State(server): State<Server>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let api_key = request
        .headers()
        .get(&X_API_KEY)
        .and_then(|header| header.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing x-api-key header".to_string()))?;

    let (user, key_hash) = authenticate_with_api_key(api_key, &server).await?;

    request.extensions_mut().insert(ApiKeyIdentity(key_hash));
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Requires an already-authenticated user with the admin flag
pub async fn admin_middleware(request: Request, next: Next) -> Result<Response, AppError> {
    let user = request
        .extensions()
        .get::<UserRecord>()
        .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;

    if !user.is_admin {
        tracing::warn!(user_id = user.id, "non-admin attempted admin route");
        return Err(AppError::Forbidden("Admin access required".to_string()));
    }

    Ok(next.run(request).await)
}

async fn authenticate_with_jwt(token: &str, server: &Server) -> Result<UserRecord, AppError> {
    let claims = server.jwt_service.validate_token(token)?;
    get_user_record(claims.sub, server).await
}

async fn authenticate_with_api_key(
    api_key: &str,
    server: &Server,
) -> Result<(UserRecord, String), AppError> {
    if !server.config.api_keys.enabled {
        return Err(AppError::Unauthorized(
            "API key authentication is disabled".to_string(),
        ));
    }

    validate_api_key_format(api_key, API_KEY_PREFIX)?;

    let key_hash = hash_api_key(api_key);
    let stored_key = server
        .database
        .api_keys()
        .find_by_hash(&key_hash)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid API key".to_string()))?;

    if !stored_key.is_usable() {
        tracing::warn!(user_id = stored_key.user_id, "inactive or revoked API key used");
        return Err(AppError::Forbidden("API key is not active".to_string()));
    }

    // Usage stamp is best-effort; never fail auth over it
    if let Err(e) = server.database.api_keys().update_last_used(stored_key.id).await {
        tracing::debug!(key_id = stored_key.id, error = %e, "last_used stamp failed");
    }

    let user = get_user_record(stored_key.user_id, server).await?;
    Ok((user, key_hash))
}

async fn get_user_record(user_id: i32, server: &Server) -> Result<UserRecord, AppError> {
    server
        .database
        .users()
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))
}

/// Extractor for the authenticated user placed by the middleware
pub struct AuthenticatedUser(pub UserRecord);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<UserRecord>()
            .cloned()
            .map(AuthenticatedUser)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }
}
