use crate::config::ApiKeysConfig;
use crate::database::dao::ApiKeysDao;
use crate::database::entities::{ApiKeyRecord, UserRecord};
use crate::error::AppError;

/// A freshly minted key: the raw secret exists only in this value and
/// is never reconstructable afterwards.
pub struct CreatedApiKey {
    pub record: ApiKeyRecord,
    pub raw_key: String,
}

#[derive(Clone)]
pub struct ApiKeyService {
    dao: ApiKeysDao,
    config: ApiKeysConfig,
}

impl ApiKeyService {
    pub fn new(dao: ApiKeysDao, config: ApiKeysConfig) -> Self {
        Self { dao, config }
    }

    /// Create a key for a paid-plan user, subject to the per-user cap
    pub async fn create(&self, user: &UserRecord, name: String) -> Result<CreatedApiKey, AppError> {
        if !self.config.enabled {
            return Err(AppError::Forbidden("API keys are disabled".to_string()));
        }
        if !user.subscription_plan.is_paid() {
            return Err(AppError::Forbidden(
                "API keys require a paid subscription plan".to_string(),
            ));
        }
        if name.trim().is_empty() {
            return Err(AppError::Validation("key name is required".to_string()));
        }

        let active = self.dao.count_active_for_user(user.id).await?;
        if active >= self.config.max_keys_per_user as u64 {
            return Err(AppError::Conflict(format!(
                "at most {} API keys per user",
                self.config.max_keys_per_user
            )));
        }

        let (mut record, raw_key) = ApiKeyRecord::new(user.id, name.trim().to_string());
        record.id = self.dao.store(&record).await?;

        tracing::info!(user_id = user.id, key_id = record.id, "API key created");
        Ok(CreatedApiKey { record, raw_key })
    }

    pub async fn list(&self, user_id: i32) -> Result<Vec<ApiKeyRecord>, AppError> {
        Ok(self.dao.find_by_user(user_id).await?)
    }

    pub async fn set_active(&self, user_id: i32, key_id: i32, active: bool) -> Result<(), AppError> {
        if !self.dao.set_active(key_id, user_id, active).await? {
            return Err(AppError::NotFound(format!("API key {key_id} not found")));
        }
        Ok(())
    }

    pub async fn revoke(&self, user_id: i32, key_id: i32) -> Result<(), AppError> {
        if !self.dao.revoke(key_id, user_id).await? {
            return Err(AppError::NotFound(format!("API key {key_id} not found")));
        }
        tracing::info!(user_id, key_id, "API key revoked");
        Ok(())
    }

    pub async fn delete(&self, user_id: i32, key_id: i32) -> Result<(), AppError> {
        if !self.dao.delete(key_id, user_id).await? {
            return Err(AppError::NotFound(format!("API key {key_id} not found")));
        }
        tracing::info!(user_id, key_id, "API key deleted");
        Ok(())
    }
}
