use super::Enhancements;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Enhancements::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Enhancements::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Enhancements::EnhancementType)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Enhancements::DisplayName).string().not_null())
                    .col(
                        ColumnDef::new(Enhancements::PromptTemplate)
                            .text()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Enhancements::Category).string().not_null())
                    .col(
                        ColumnDef::new(Enhancements::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Enhancements::SortOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_enhancements_type")
                    .table(Enhancements::Table)
                    .col(Enhancements::EnhancementType)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Enhancements::Table).to_owned())
            .await
    }
}
