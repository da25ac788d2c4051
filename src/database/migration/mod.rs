use sea_orm_migration::prelude::*;

pub use sea_orm_migration::MigratorTrait;

mod m20250601_100000_create_users_table;
mod m20250601_100100_create_token_balances_table;
mod m20250601_100200_create_enhancements_table;
mod m20250601_100300_create_category_enhancements_table;
mod m20250601_100400_create_generations_table;
mod m20250601_100500_create_payments_table;
mod m20250601_100600_create_api_keys_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_100000_create_users_table::Migration),
            Box::new(m20250601_100100_create_token_balances_table::Migration),
            Box::new(m20250601_100200_create_enhancements_table::Migration),
            Box::new(m20250601_100300_create_category_enhancements_table::Migration),
            Box::new(m20250601_100400_create_generations_table::Migration),
            Box::new(m20250601_100500_create_payments_table::Migration),
            Box::new(m20250601_100600_create_api_keys_table::Migration),
        ]
    }
}

/// Common table and column identifiers
#[derive(Iden)]
pub enum Users {
    Table,
    Id,
    Email,
    DisplayName,
    SubscriptionPlan,
    MonthlyGenerateLimit,
    CurrentMonthGenerates,
    IsAdmin,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
pub enum TokenBalances {
    Table,
    Id,
    UserId,
    SubscriptionTokens,
    PurchasedTokens,
    ExpiresAt,
    ExpiryWarnedAt,
    UpdatedAt,
}

#[derive(Iden)]
pub enum Enhancements {
    Table,
    Id,
    EnhancementType,
    DisplayName,
    PromptTemplate,
    Category,
    IsActive,
    SortOrder,
}

#[derive(Iden)]
pub enum CategoryEnhancements {
    Table,
    Id,
    CategoryCode,
    EnhancementId,
    Subcategory,
}

#[derive(Iden)]
pub enum Generations {
    Table,
    Id,
    UserId,
    OriginalImagePath,
    GeneratedImagePath,
    EnhancementType,
    ClassificationResult,
    PromptUsed,
    PresignedUrl,
    PresignedUrlExpiresAt,
    CreatedAt,
}

#[derive(Iden)]
pub enum Payments {
    Table,
    Id,
    UserId,
    Amount,
    UniqueCode,
    AmountWithCode,
    TokensPurchased,
    BonusTokens,
    PaymentStatus,
    PaymentProofUrl,
    AdminNotes,
    VerifiedBy,
    VerifiedAt,
    CreatedAt,
}

#[derive(Iden)]
pub enum ApiKeys {
    Table,
    Id,
    UserId,
    Name,
    KeyHash,
    KeyPreview,
    IsActive,
    CreatedAt,
    LastUsed,
    RevokedAt,
}
