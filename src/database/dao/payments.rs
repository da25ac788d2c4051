use crate::database::entities::{PaymentRecord, PaymentStatus, payments};
use crate::database::{DatabaseError, DatabaseResult};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};

/// Payments DAO.
///
/// State transitions out of `pending` are guarded at the data layer:
/// the update carries a `payment_status = 'pending'` precondition, so a
/// transition can win at most once regardless of concurrent callers.
#[derive(Clone)]
pub struct PaymentsDao {
    db: DatabaseConnection,
}

impl PaymentsDao {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn store(&self, payment: &PaymentRecord) -> DatabaseResult<i32> {
        let active_model = payments::ActiveModel {
            id: ActiveValue::NotSet,
            user_id: Set(payment.user_id),
            amount: Set(payment.amount),
            unique_code: Set(payment.unique_code),
            amount_with_code: Set(payment.amount_with_code),
            tokens_purchased: Set(payment.tokens_purchased),
            bonus_tokens: Set(payment.bonus_tokens),
            payment_status: Set(payment.payment_status),
            payment_proof_url: Set(payment.payment_proof_url.clone()),
            admin_notes: Set(payment.admin_notes.clone()),
            verified_by: Set(payment.verified_by),
            verified_at: Set(payment.verified_at),
            created_at: Set(payment.created_at),
        };

        let result = active_model
            .insert(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(result.id)
    }

    pub async fn find_by_id(&self, payment_id: i32) -> DatabaseResult<Option<PaymentRecord>> {
        let payment = payments::Entity::find_by_id(payment_id)
            .one(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(payment)
    }

    pub async fn find_by_user(&self, user_id: i32) -> DatabaseResult<Vec<PaymentRecord>> {
        let payments = payments::Entity::find()
            .filter(payments::Column::UserId.eq(user_id))
            .order_by_desc(payments::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(payments)
    }

    pub async fn list_by_status(&self, status: PaymentStatus) -> DatabaseResult<Vec<PaymentRecord>> {
        let payments = payments::Entity::find()
            .filter(payments::Column::PaymentStatus.eq(status))
            .order_by_asc(payments::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(payments)
    }

    /// Transition `pending -> approved`, stamping verifier fields and the
    /// frozen bonus. Returns false when the payment was already terminal
    /// (the caller must then not credit tokens).
    pub async fn approve_pending(
        &self,
        payment_id: i32,
        admin_id: i32,
        bonus_tokens: i64,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> DatabaseResult<bool> {
        let result = payments::Entity::update_many()
            .col_expr(
                payments::Column::PaymentStatus,
                Expr::value(PaymentStatus::Approved),
            )
            .col_expr(payments::Column::BonusTokens, Expr::value(bonus_tokens))
            .col_expr(payments::Column::VerifiedBy, Expr::value(admin_id))
            .col_expr(payments::Column::VerifiedAt, Expr::value(now))
            .col_expr(payments::Column::AdminNotes, Expr::value(notes))
            .filter(payments::Column::Id.eq(payment_id))
            .filter(payments::Column::PaymentStatus.eq(PaymentStatus::Pending))
            .exec(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(result.rows_affected == 1)
    }

    /// Transition `pending -> rejected`. Same guard as approval.
    pub async fn reject_pending(
        &self,
        payment_id: i32,
        admin_id: i32,
        notes: String,
        now: DateTime<Utc>,
    ) -> DatabaseResult<bool> {
        let result = payments::Entity::update_many()
            .col_expr(
                payments::Column::PaymentStatus,
                Expr::value(PaymentStatus::Rejected),
            )
            .col_expr(payments::Column::VerifiedBy, Expr::value(admin_id))
            .col_expr(payments::Column::VerifiedAt, Expr::value(now))
            .col_expr(payments::Column::AdminNotes, Expr::value(Some(notes)))
            .filter(payments::Column::Id.eq(payment_id))
            .filter(payments::Column::PaymentStatus.eq(PaymentStatus::Pending))
            .exec(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(result.rows_affected == 1)
    }
}
