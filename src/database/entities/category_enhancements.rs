use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Beauty subcategory qualifiers for the category/enhancement join
pub const SUBCATEGORY_HAIR_MALE: &str = "hair_style_male";
pub const SUBCATEGORY_HAIR_FEMALE: &str = "hair_style_female";
pub const SUBCATEGORY_MAKEUP: &str = "makeup";

/// Join table associating enhancements with image categories.
///
/// `subcategory` is only populated for the beauty category, where the
/// hair-style bucket is gender qualified and makeup is gender neutral.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "category_enhancements")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub category_code: String,
    pub enhancement_id: i32,
    pub subcategory: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::enhancements::Entity",
        from = "Column::EnhancementId",
        to = "super::enhancements::Column::Id"
    )]
    Enhancement,
}

impl Related<super::enhancements::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Enhancement.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
