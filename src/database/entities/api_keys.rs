use chrono::{DateTime, Utc};
use rand::{Rng, distr::Alphanumeric};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub const API_KEY_PREFIX: &str = "PNVA_";
const API_KEY_LENGTH: usize = 32;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "api_keys")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub name: String,
    #[sea_orm(unique)]
    pub key_hash: String,
    /// Truncated preview shown in listings; the raw key is never persisted
    pub key_preview: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_used: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Create a new API key; returns the record and the raw secret.
    /// The raw key is shown exactly once and only its hash is stored.
    pub fn new(user_id: i32, name: String) -> (Self, String) {
        let raw_key = generate_api_key(API_KEY_PREFIX, API_KEY_LENGTH);
        let key_hash = hash_api_key(&raw_key);
        let key_preview = format!("{}...{}", &raw_key[..9], &raw_key[raw_key.len() - 4..]);

        let api_key = Self {
            id: 0, // assigned by the database
            user_id,
            name,
            key_hash,
            key_preview,
            is_active: true,
            created_at: Utc::now(),
            last_used: None,
            revoked_at: None,
        };

        (api_key, raw_key)
    }

    /// A key authenticates only while active and not revoked
    pub fn is_usable(&self) -> bool {
        self.is_active && self.revoked_at.is_none()
    }
}

fn generate_api_key(prefix: &str, length: usize) -> String {
    let random_part: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect();

    format!("{}{}", prefix, random_part)
}

/// Hash an API key using SHA-256
pub fn hash_api_key(api_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(api_key.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Validate API key shape before touching the database
pub fn validate_api_key_format(
    api_key: &str,
    expected_prefix: &str,
) -> Result<(), crate::error::AppError> {
    if !api_key.starts_with(expected_prefix) {
        return Err(crate::error::AppError::Unauthorized(
            "Invalid API key format".to_string(),
        ));
    }

    if api_key.len() < expected_prefix.len() + 16 {
        return Err(crate::error::AppError::Unauthorized(
            "Invalid API key format".to_string(),
        ));
    }

    let key_part = &api_key[expected_prefix.len()..];
    if !key_part.chars().all(|c| c.is_alphanumeric()) {
        return Err(crate::error::AppError::Unauthorized(
            "Invalid API key format".to_string(),
        ));
    }

    Ok(())
}
