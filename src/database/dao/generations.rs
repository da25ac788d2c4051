use crate::database::entities::{GenerationRecord, generations};
use crate::database::{DatabaseError, DatabaseResult};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};

/// Generation records DAO
#[derive(Clone)]
pub struct GenerationsDao {
    db: DatabaseConnection,
}

impl GenerationsDao {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn store(&self, record: &GenerationRecord) -> DatabaseResult<i32> {
        let active_model = generations::ActiveModel {
            id: ActiveValue::NotSet,
            user_id: Set(record.user_id),
            original_image_path: Set(record.original_image_path.clone()),
            generated_image_path: Set(record.generated_image_path.clone()),
            enhancement_type: Set(record.enhancement_type.clone()),
            classification_result: Set(record.classification_result.clone()),
            prompt_used: Set(record.prompt_used.clone()),
            presigned_url: Set(record.presigned_url.clone()),
            presigned_url_expires_at: Set(record.presigned_url_expires_at),
            created_at: Set(record.created_at),
        };

        let result = active_model
            .insert(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(result.id)
    }

    pub async fn find_by_id(&self, id: i32) -> DatabaseResult<Option<GenerationRecord>> {
        let record = generations::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(record)
    }

    /// A user's generation history, newest first
    pub async fn find_by_user(&self, user_id: i32) -> DatabaseResult<Vec<GenerationRecord>> {
        let records = generations::Entity::find()
            .filter(generations::Column::UserId.eq(user_id))
            .order_by_desc(generations::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(records)
    }

    pub async fn count_by_user(&self, user_id: i32) -> DatabaseResult<u64> {
        let count = generations::Entity::find()
            .filter(generations::Column::UserId.eq(user_id))
            .count(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(count)
    }

    pub async fn count_all(&self) -> DatabaseResult<u64> {
        let count = generations::Entity::find()
            .count(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(count)
    }

    /// Records are immutable except for presigned-URL refresh
    pub async fn update_presigned_url(
        &self,
        id: i32,
        url: String,
        expires_at: DateTime<Utc>,
    ) -> DatabaseResult<GenerationRecord> {
        let active_model = generations::ActiveModel {
            id: Set(id),
            presigned_url: Set(Some(url)),
            presigned_url_expires_at: Set(Some(expires_at)),
            ..Default::default()
        };

        let updated = active_model
            .update(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(updated)
    }
}
