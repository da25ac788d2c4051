use crate::database::entities::{
    CategoryEnhancement, Enhancement, category_enhancements, enhancements,
};
use crate::database::{DatabaseError, DatabaseResult};
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};

/// An enhancement joined with its category mapping
#[derive(Debug, Clone)]
pub struct CategoryEntry {
    pub enhancement: Enhancement,
    pub subcategory: Option<String>,
}

/// Enhancement catalog DAO
#[derive(Clone)]
pub struct EnhancementsDao {
    db: DatabaseConnection,
}

impl EnhancementsDao {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn store(&self, enhancement: &Enhancement) -> DatabaseResult<i32> {
        let active_model = enhancements::ActiveModel {
            id: ActiveValue::NotSet,
            enhancement_type: Set(enhancement.enhancement_type.clone()),
            display_name: Set(enhancement.display_name.clone()),
            prompt_template: Set(enhancement.prompt_template.clone()),
            category: Set(enhancement.category.clone()),
            is_active: Set(enhancement.is_active),
            sort_order: Set(enhancement.sort_order),
        };

        let result = active_model
            .insert(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(result.id)
    }

    pub async fn map_to_category(
        &self,
        category_code: &str,
        enhancement_id: i32,
        subcategory: Option<String>,
    ) -> DatabaseResult<()> {
        let active_model = category_enhancements::ActiveModel {
            id: ActiveValue::NotSet,
            category_code: Set(category_code.to_string()),
            enhancement_id: Set(enhancement_id),
            subcategory: Set(subcategory),
        };

        active_model
            .insert(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(())
    }

    /// Lookup by user-facing label (callers often only know the label)
    pub async fn find_by_display_name(&self, name: &str) -> DatabaseResult<Option<Enhancement>> {
        let enhancement = enhancements::Entity::find()
            .filter(enhancements::Column::DisplayName.eq(name))
            .filter(enhancements::Column::IsActive.eq(true))
            .one(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(enhancement)
    }

    /// Lookup by stable key
    pub async fn find_by_type(&self, enhancement_type: &str) -> DatabaseResult<Option<Enhancement>> {
        let enhancement = enhancements::Entity::find()
            .filter(enhancements::Column::EnhancementType.eq(enhancement_type))
            .filter(enhancements::Column::IsActive.eq(true))
            .one(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(enhancement)
    }

    /// All distinct category codes present in the mapping table
    pub async fn list_category_codes(&self) -> DatabaseResult<Vec<String>> {
        let mappings: Vec<CategoryEnhancement> = category_enhancements::Entity::find()
            .all(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        let mut codes: Vec<String> = mappings.into_iter().map(|m| m.category_code).collect();
        codes.sort();
        codes.dedup();
        Ok(codes)
    }

    /// Active enhancements mapped to a category, with subcategory
    /// qualifiers, ordered by sort order
    pub async fn list_for_category(&self, category_code: &str) -> DatabaseResult<Vec<CategoryEntry>> {
        let rows = category_enhancements::Entity::find()
            .filter(category_enhancements::Column::CategoryCode.eq(category_code))
            .find_also_related(enhancements::Entity)
            .all(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        let mut entries: Vec<CategoryEntry> = rows
            .into_iter()
            .filter_map(|(mapping, enhancement)| {
                enhancement
                    .filter(|e| e.is_active)
                    .map(|enhancement| CategoryEntry {
                        enhancement,
                        subcategory: mapping.subcategory,
                    })
            })
            .collect();

        entries.sort_by_key(|e| e.enhancement.sort_order);
        Ok(entries)
    }

    /// Count of active enhancements per category (for catalog listings)
    pub async fn count_for_category(&self, category_code: &str) -> DatabaseResult<u64> {
        Ok(self.list_for_category(category_code).await?.len() as u64)
    }

    pub async fn list_all_active(&self) -> DatabaseResult<Vec<Enhancement>> {
        let rows = enhancements::Entity::find()
            .filter(enhancements::Column::IsActive.eq(true))
            .order_by_asc(enhancements::Column::SortOrder)
            .all(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(rows)
    }
}
