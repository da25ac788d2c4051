use crate::database::entities::{ApiKeyRecord, api_keys};
use crate::database::{DatabaseError, DatabaseResult};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};

/// API keys DAO. Only hashes are stored; lookup is always by hash.
#[derive(Clone)]
pub struct ApiKeysDao {
    db: DatabaseConnection,
}

impl ApiKeysDao {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn store(&self, key: &ApiKeyRecord) -> DatabaseResult<i32> {
        let active_model = api_keys::ActiveModel {
            id: ActiveValue::NotSet,
            user_id: Set(key.user_id),
            name: Set(key.name.clone()),
            key_hash: Set(key.key_hash.clone()),
            key_preview: Set(key.key_preview.clone()),
            is_active: Set(key.is_active),
            last_used: Set(key.last_used),
            revoked_at: Set(key.revoked_at),
            created_at: Set(key.created_at),
        };

        let result = active_model
            .insert(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(result.id)
    }

    pub async fn find_by_hash(&self, key_hash: &str) -> DatabaseResult<Option<ApiKeyRecord>> {
        let key = api_keys::Entity::find()
            .filter(api_keys::Column::KeyHash.eq(key_hash))
            .one(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(key)
    }

    pub async fn find_by_id(&self, key_id: i32) -> DatabaseResult<Option<ApiKeyRecord>> {
        let key = api_keys::Entity::find_by_id(key_id)
            .one(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(key)
    }

    pub async fn find_by_user(&self, user_id: i32) -> DatabaseResult<Vec<ApiKeyRecord>> {
        let keys = api_keys::Entity::find()
            .filter(api_keys::Column::UserId.eq(user_id))
            .order_by_desc(api_keys::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(keys)
    }

    /// Count non-revoked keys for per-user key limits
    pub async fn count_active_for_user(&self, user_id: i32) -> DatabaseResult<u64> {
        let count = api_keys::Entity::find()
            .filter(api_keys::Column::UserId.eq(user_id))
            .filter(api_keys::Column::RevokedAt.is_null())
            .count(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(count)
    }

    /// Best-effort usage stamp; authentication must not fail on it
    pub async fn update_last_used(&self, key_id: i32) -> DatabaseResult<()> {
        api_keys::Entity::update_many()
            .col_expr(
                api_keys::Column::LastUsed,
                sea_orm::sea_query::Expr::value(Utc::now()),
            )
            .filter(api_keys::Column::Id.eq(key_id))
            .exec(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(())
    }

    pub async fn set_active(&self, key_id: i32, user_id: i32, active: bool) -> DatabaseResult<bool> {
        let result = api_keys::Entity::update_many()
            .col_expr(
                api_keys::Column::IsActive,
                sea_orm::sea_query::Expr::value(active),
            )
            .filter(api_keys::Column::Id.eq(key_id))
            .filter(api_keys::Column::UserId.eq(user_id))
            .filter(api_keys::Column::RevokedAt.is_null())
            .exec(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(result.rows_affected == 1)
    }

    /// Hard delete on explicit user request; history is lost
    pub async fn delete(&self, key_id: i32, user_id: i32) -> DatabaseResult<bool> {
        let result = api_keys::Entity::delete_many()
            .filter(api_keys::Column::Id.eq(key_id))
            .filter(api_keys::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(result.rows_affected == 1)
    }

    /// Revocation is permanent; a revoked key never authenticates again
    pub async fn revoke(&self, key_id: i32, user_id: i32) -> DatabaseResult<bool> {
        let result = api_keys::Entity::update_many()
            .col_expr(
                api_keys::Column::IsActive,
                sea_orm::sea_query::Expr::value(false),
            )
            .col_expr(
                api_keys::Column::RevokedAt,
                sea_orm::sea_query::Expr::value(Utc::now()),
            )
            .filter(api_keys::Column::Id.eq(key_id))
            .filter(api_keys::Column::UserId.eq(user_id))
            .filter(api_keys::Column::RevokedAt.is_null())
            .exec(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(result.rows_affected == 1)
    }
}
