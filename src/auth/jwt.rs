use crate::config::AuthConfig;
use crate::error::AppError;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub fn parse_algorithm(alg: &str) -> Result<Algorithm, AppError> {
    Algorithm::from_str(alg)
        .map_err(|_| AppError::Validation(format!("Unsupported JWT algorithm: {alg}")))
}

/// Claims carried by session tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Database user id
    pub sub: i32,
    pub iat: usize,
    pub exp: usize,
}

impl Claims {
    pub fn new(user_id: i32, ttl_secs: u64) -> Self {
        let now = Utc::now().timestamp() as usize;
        Self {
            sub: user_id,
            iat: now,
            exp: now + ttl_secs as usize,
        }
    }
}

/// Session token service. Only symmetric algorithms are expected in
/// deployment; the algorithm is still configurable for key rotation
/// experiments.
pub struct JwtService {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl_secs: u64,
}

impl JwtService {
    pub fn new(config: &AuthConfig) -> Result<Self, AppError> {
        let algorithm = parse_algorithm(&config.jwt_algorithm)?;

        match algorithm {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(Self {
                algorithm,
                encoding_key: EncodingKey::from_secret(config.jwt_secret.as_ref()),
                decoding_key: DecodingKey::from_secret(config.jwt_secret.as_ref()),
                token_ttl_secs: config.token_ttl_secs,
            }),
            other => Err(AppError::Validation(format!(
                "JWT algorithm {other:?} requires asymmetric keys, which are not configured"
            ))),
        }
    }

    pub fn create_token(&self, user_id: i32) -> Result<String, AppError> {
        let claims = Claims::new(user_id, self.token_ttl_secs);
        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding_key)?;
        Ok(token)
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, AppError> {
        let validation = Validation::new(self.algorithm);
        let data = decode::<Claims>(token, &self.decoding_key, &validation)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> JwtService {
        JwtService::new(&AuthConfig {
            jwt_secret: "test-secret".to_string(),
            jwt_algorithm: "HS256".to_string(),
            token_ttl_secs: 3600,
        })
        .unwrap()
    }

    #[test]
    fn test_round_trip() {
        let service = test_service();
        let token = service.create_token(42).unwrap();
        let claims = service.validate_token(&token).unwrap();
        assert_eq!(claims.sub, 42);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let service = test_service();
        let token = service.create_token(42).unwrap();

        let other = JwtService::new(&AuthConfig {
            jwt_secret: "different-secret".to_string(),
            jwt_algorithm: "HS256".to_string(),
            token_ttl_secs: 3600,
        })
        .unwrap();
        assert!(other.validate_token(&token).is_err());
    }

    #[test]
    fn test_garbage_token_rejected() {
        let service = test_service();
        assert!(service.validate_token("not-a-jwt").is_err());
    }

    #[test]
    fn test_asymmetric_algorithm_rejected() {
        let result = JwtService::new(&AuthConfig {
            jwt_secret: "secret".to_string(),
            jwt_algorithm: "RS256".to_string(),
            token_ttl_secs: 3600,
        });
        assert!(result.is_err());
    }
}
