use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Per-user token pools.
///
/// Subscription tokens replenish on a billing cycle and expire;
/// purchased tokens never expire. Both counters are invariantly >= 0.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "token_balances")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub user_id: i32,
    pub subscription_tokens: i64,
    pub purchased_tokens: i64,
    pub expires_at: Option<DateTime<Utc>>,
    /// Set once an expiry warning has gone out for the current cycle
    pub expiry_warned_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn total(&self) -> i64 {
        self.subscription_tokens + self.purchased_tokens
    }
}
