use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A named transformation mapped to a prompt template.
///
/// Static reference data, editable by admins; immutable during the
/// lifetime of a request that resolved it.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "enhancements")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Stable key, e.g. "remove_background"
    #[sea_orm(unique)]
    pub enhancement_type: String,
    /// User-facing label, e.g. "Remove Background"
    pub display_name: String,
    pub prompt_template: String,
    pub category: String,
    pub is_active: bool,
    pub sort_order: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
