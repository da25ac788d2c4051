use super::Generations;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Generations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Generations::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Generations::UserId).integer().not_null())
                    .col(
                        ColumnDef::new(Generations::OriginalImagePath)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Generations::GeneratedImagePath)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Generations::EnhancementType)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Generations::ClassificationResult)
                            .string()
                            .null(),
                    )
                    .col(ColumnDef::new(Generations::PromptUsed).text().not_null())
                    .col(ColumnDef::new(Generations::PresignedUrl).text().null())
                    .col(
                        ColumnDef::new(Generations::PresignedUrlExpiresAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Generations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_generations_user_created")
                    .table(Generations::Table)
                    .col(Generations::UserId)
                    .col(Generations::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Generations::Table).to_owned())
            .await
    }
}
