use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One row per completed enhancement job.
///
/// Created only after the generated artifact has been persisted;
/// immutable thereafter except for presigned-URL refresh.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "generations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub original_image_path: String,
    pub generated_image_path: String,
    pub enhancement_type: String,
    pub classification_result: Option<String>,
    pub prompt_used: String,
    pub presigned_url: Option<String>,
    pub presigned_url_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
