use crate::database::entities::{SubscriptionPlan, UserRecord, users};
use crate::database::{DatabaseError, DatabaseResult};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};

/// Users DAO for database operations
#[derive(Clone)]
pub struct UsersDao {
    db: DatabaseConnection,
}

impl UsersDao {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn store(&self, user: &UserRecord) -> DatabaseResult<i32> {
        let active_model = users::ActiveModel {
            id: ActiveValue::NotSet,
            email: Set(user.email.clone()),
            display_name: Set(user.display_name.clone()),
            subscription_plan: Set(user.subscription_plan),
            monthly_generate_limit: Set(user.monthly_generate_limit),
            current_month_generates: Set(user.current_month_generates),
            is_admin: Set(user.is_admin),
            created_at: Set(user.created_at),
            updated_at: Set(user.updated_at),
        };

        let result = active_model
            .insert(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(result.id)
    }

    pub async fn find_by_id(&self, user_id: i32) -> DatabaseResult<Option<UserRecord>> {
        let user = users::Entity::find_by_id(user_id)
            .one(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<UserRecord>> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(user)
    }

    pub async fn list_all(&self) -> DatabaseResult<Vec<UserRecord>> {
        let users = users::Entity::find()
            .order_by_asc(users::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(users)
    }

    /// Admin action: move a user to a new plan, resetting the monthly
    /// allowance to the plan default unless an explicit limit is given
    pub async fn update_plan(
        &self,
        user_id: i32,
        plan: SubscriptionPlan,
        monthly_limit: Option<i32>,
    ) -> DatabaseResult<UserRecord> {
        let active_model = users::ActiveModel {
            id: Set(user_id),
            subscription_plan: Set(plan),
            monthly_generate_limit: Set(monthly_limit.unwrap_or_else(|| plan.default_monthly_limit())),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };

        let updated = active_model
            .update(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(updated)
    }

    /// Bump the monthly usage counter after a completed generation
    pub async fn increment_monthly_usage(&self, user_id: i32) -> DatabaseResult<()> {
        users::Entity::update_many()
            .col_expr(
                users::Column::CurrentMonthGenerates,
                Expr::col(users::Column::CurrentMonthGenerates).add(1),
            )
            .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(users::Column::Id.eq(user_id))
            .exec(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(())
    }

    /// Admin action: reset one user's monthly usage counter
    pub async fn reset_monthly_usage(&self, user_id: i32) -> DatabaseResult<()> {
        users::Entity::update_many()
            .col_expr(users::Column::CurrentMonthGenerates, Expr::value(0))
            .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(users::Column::Id.eq(user_id))
            .exec(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(())
    }

    /// Monthly reset job: zero every user's usage counter.
    /// Returns the number of users affected.
    pub async fn reset_all_monthly_usage(&self) -> DatabaseResult<u64> {
        let result = users::Entity::update_many()
            .col_expr(users::Column::CurrentMonthGenerates, Expr::value(0))
            .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(users::Column::CurrentMonthGenerates.gt(0))
            .exec(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }
}
