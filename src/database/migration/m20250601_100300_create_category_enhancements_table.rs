use super::CategoryEnhancements;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CategoryEnhancements::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CategoryEnhancements::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CategoryEnhancements::CategoryCode)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CategoryEnhancements::EnhancementId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CategoryEnhancements::Subcategory)
                            .string()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_category_enhancements_category")
                    .table(CategoryEnhancements::Table)
                    .col(CategoryEnhancements::CategoryCode)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_category_enhancements_pair")
                    .table(CategoryEnhancements::Table)
                    .col(CategoryEnhancements::CategoryCode)
                    .col(CategoryEnhancements::EnhancementId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CategoryEnhancements::Table).to_owned())
            .await
    }
}
