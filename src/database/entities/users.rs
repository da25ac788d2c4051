use chrono::{DateTime, Utc};
use sea_orm::{entity::prelude::*, sea_query::StringLen};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Subscription plan tiers
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
pub enum SubscriptionPlan {
    #[sea_orm(string_value = "free")]
    #[serde(rename = "free")]
    #[default]
    Free,
    #[sea_orm(string_value = "basic")]
    #[serde(rename = "basic")]
    Basic,
    #[sea_orm(string_value = "pro")]
    #[serde(rename = "pro")]
    Pro,
}

impl SubscriptionPlan {
    /// Paid plans unlock the public API (key creation)
    pub fn is_paid(&self) -> bool {
        !matches!(self, SubscriptionPlan::Free)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionPlan::Free => "free",
            SubscriptionPlan::Basic => "basic",
            SubscriptionPlan::Pro => "pro",
        }
    }

    /// Default monthly generation allowance per plan
    pub fn default_monthly_limit(&self) -> i32 {
        match self {
            SubscriptionPlan::Free => 5,
            SubscriptionPlan::Basic => 100,
            SubscriptionPlan::Pro => 500,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub email: String,
    pub display_name: Option<String>,
    #[sea_orm(column_type = "String(StringLen::N(16))", default_value = "free")]
    pub subscription_plan: SubscriptionPlan,
    pub monthly_generate_limit: i32,
    pub current_month_generates: i32,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Default for Model {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: 0, // assigned by the database
            email: String::new(),
            display_name: None,
            subscription_plan: SubscriptionPlan::Free,
            monthly_generate_limit: SubscriptionPlan::Free.default_monthly_limit(),
            current_month_generates: 0,
            is_admin: false,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Model {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            ..Default::default()
        }
    }

    pub fn with_plan(mut self, plan: SubscriptionPlan) -> Self {
        self.monthly_generate_limit = plan.default_monthly_limit();
        self.subscription_plan = plan;
        self
    }

    pub fn with_admin(mut self, is_admin: bool) -> Self {
        self.is_admin = is_admin;
        self
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_gating() {
        assert!(!SubscriptionPlan::Free.is_paid());
        assert!(SubscriptionPlan::Basic.is_paid());
        assert!(SubscriptionPlan::Pro.is_paid());
    }

    #[test]
    fn test_with_plan_sets_limit() {
        let user = Model::new("a@b.c").with_plan(SubscriptionPlan::Pro);
        assert_eq!(user.subscription_plan, SubscriptionPlan::Pro);
        assert_eq!(user.monthly_generate_limit, 500);
    }
}
