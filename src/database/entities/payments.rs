use chrono::{DateTime, Utc};
use sea_orm::{entity::prelude::*, sea_query::StringLen};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Payment verification states.
///
/// `Pending` is the only non-terminal state; a record transitions to
/// `Approved` or `Rejected` exactly once.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[derive(Default)]
pub enum PaymentStatus {
    #[sea_orm(string_value = "pending")]
    #[serde(rename = "pending")]
    #[default]
    Pending,
    #[sea_orm(string_value = "approved")]
    #[serde(rename = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    #[serde(rename = "rejected")]
    Rejected,
}

impl PaymentStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub amount: i64,
    /// Randomized surcharge disambiguating bank transfers
    pub unique_code: i64,
    pub amount_with_code: i64,
    pub tokens_purchased: i64,
    /// Frozen at approval time from `unique_code`; never recomputed
    pub bonus_tokens: i64,
    #[sea_orm(column_type = "String(StringLen::N(16))", default_value = "pending")]
    pub payment_status: PaymentStatus,
    pub payment_proof_url: Option<String>,
    pub admin_notes: Option<String>,
    pub verified_by: Option<i32>,
    pub verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

///// Bonus-token rule: the thousands component of the unique code.
///
/// Computed once at approval time from the stored code and persisted.
pub fn bonus_tokens_for_code(unique_code: i64) -> i64 {
    unique_code / 1000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bonus_token_rule() {
        assert_eq!(bonus_tokens_for_code(1456), 1);
        assert_eq!(bonus_tokens_for_code(456), 0);
        assert_eq!(bonus_tokens_for_code(1999), 1);
        assert_eq!(bonus_tokens_for_code(2000), 2);
        assert_eq!(bonus_tokens_for_code(0), 0);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!PaymentStatus::Pending.is_terminal());
        assert!(PaymentStatus::Approved.is_terminal());
        assert!(PaymentStatus::Rejected.is_terminal());
    }
}
