use crate::database::entities::{TokenBalance, token_balances};
use crate::database::{DatabaseError, DatabaseResult};
use chrono::{DateTime, Duration, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};

/// Compare-and-swap attempts before giving up on a contended debit
const MAX_CAS_ATTEMPTS: u32 = 8;

/// Result of an atomic debit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebitOutcome {
    Debited(DebitReceipt),
    Insufficient { subscription: i64, purchased: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebitReceipt {
    pub subscription_used: i64,
    pub purchased_used: i64,
    pub remaining_subscription: i64,
    pub remaining_purchased: i64,
}

/// A balance row whose subscription pool expires within the warning horizon
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiryWarning {
    pub user_id: i32,
    pub subscription_tokens: i64,
    pub days_until_expiry: i64,
}

/// Token balances DAO for database operations.
///
/// All balance mutations happen here as conditional updates; callers
/// never read-then-write balances from application code.
#[derive(Clone)]
pub struct TokenBalancesDao {
    db: DatabaseConnection,
}

impl TokenBalancesDao {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Read a user's balance; missing rows read as zero
    pub async fn find_by_user(&self, user_id: i32) -> DatabaseResult<Option<TokenBalance>> {
        let balance = token_balances::Entity::find()
            .filter(token_balances::Column::UserId.eq(user_id))
            .one(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(balance)
    }

    /// Atomically debit `amount` tokens, drawing from the subscription pool
    /// first and the purchased pool second.
    ///
    /// The check and the decrement are one effective operation: the update
    /// only applies while both counters still hold their snapshotted values,
    /// so a concurrent debit that raced us simply forces a re-read. Two
    /// parallel debits against a balance of one token can never both win.
    pub async fn debit(&self, user_id: i32, amount: i64) -> DatabaseResult<DebitOutcome> {
        if amount <= 0 {
            return Err(DatabaseError::Constraint(
                "debit amount must be positive".to_string(),
            ));
        }

        for _ in 0..MAX_CAS_ATTEMPTS {
            let Some(balance) = self.find_by_user(user_id).await? else {
                return Ok(DebitOutcome::Insufficient {
                    subscription: 0,
                    purchased: 0,
                });
            };

            if balance.total() < amount {
                return Ok(DebitOutcome::Insufficient {
                    subscription: balance.subscription_tokens,
                    purchased: balance.purchased_tokens,
                });
            }

            let subscription_used = balance.subscription_tokens.min(amount);
            let purchased_used = amount - subscription_used;
            let new_subscription = balance.subscription_tokens - subscription_used;
            let new_purchased = balance.purchased_tokens - purchased_used;

            let result = token_balances::Entity::update_many()
                .col_expr(
                    token_balances::Column::SubscriptionTokens,
                    Expr::value(new_subscription),
                )
                .col_expr(
                    token_balances::Column::PurchasedTokens,
                    Expr::value(new_purchased),
                )
                .col_expr(token_balances::Column::UpdatedAt, Expr::value(Utc::now()))
                .filter(token_balances::Column::UserId.eq(user_id))
                .filter(
                    token_balances::Column::SubscriptionTokens.eq(balance.subscription_tokens),
                )
                .filter(token_balances::Column::PurchasedTokens.eq(balance.purchased_tokens))
                .exec(&self.db)
                .await
                .map_err(|e| DatabaseError::Database(e.to_string()))?;

            if result.rows_affected == 1 {
                return Ok(DebitOutcome::Debited(DebitReceipt {
                    subscription_used,
                    purchased_used,
                    remaining_subscription: new_subscription,
                    remaining_purchased: new_purchased,
                }));
            }
            // Lost the race against a concurrent writer; re-read and retry.
        }

        Err(DatabaseError::Contention(format!(
            "debit for user {user_id} kept losing the balance race"
        )))
    }

    /// Add tokens to one or both pools, creating the row if absent.
    ///
    /// `new_expiry` only overwrites `expires_at` when the subscription pool
    /// actually received tokens; a fresh expiry also clears the
    /// expiry-warning flag for the new cycle.
    pub async fn credit(
        &self,
        user_id: i32,
        subscription_delta: i64,
        purchased_delta: i64,
        new_expiry: Option<DateTime<Utc>>,
    ) -> DatabaseResult<()> {
        if subscription_delta < 0 || purchased_delta < 0 {
            return Err(DatabaseError::Constraint(
                "credit deltas must be non-negative".to_string(),
            ));
        }

        let mut update = token_balances::Entity::update_many()
            .col_expr(
                token_balances::Column::SubscriptionTokens,
                Expr::col(token_balances::Column::SubscriptionTokens).add(subscription_delta),
            )
            .col_expr(
                token_balances::Column::PurchasedTokens,
                Expr::col(token_balances::Column::PurchasedTokens).add(purchased_delta),
            )
            .col_expr(token_balances::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(token_balances::Column::UserId.eq(user_id));

        if subscription_delta > 0 {
            if let Some(expiry) = new_expiry {
                update = update
                    .col_expr(token_balances::Column::ExpiresAt, Expr::value(expiry))
                    .col_expr(
                        token_balances::Column::ExpiryWarnedAt,
                        Expr::value(Option::<DateTime<Utc>>::None),
                    );
            }
        }

        let result = update
            .exec(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            // First credit for this user; create the row.
            let active_model = token_balances::ActiveModel {
                id: ActiveValue::NotSet,
                user_id: Set(user_id),
                subscription_tokens: Set(subscription_delta),
                purchased_tokens: Set(purchased_delta),
                expires_at: Set(if subscription_delta > 0 {
                    new_expiry
                } else {
                    None
                }),
                expiry_warned_at: Set(None),
                updated_at: Set(Utc::now()),
            };

            active_model
                .insert(&self.db)
                .await
                .map_err(|e| DatabaseError::Database(e.to_string()))?;
        }

        Ok(())
    }

    /// Zero expired subscription pools; purchased tokens are untouched.
    /// Returns the number of users affected. Idempotent.
    pub async fn expire_sweep(&self, now: DateTime<Utc>) -> DatabaseResult<u64> {
        let result = token_balances::Entity::update_many()
            .col_expr(token_balances::Column::SubscriptionTokens, Expr::value(0i64))
            .col_expr(token_balances::Column::UpdatedAt, Expr::value(now))
            .filter(token_balances::Column::SubscriptionTokens.gt(0))
            .filter(token_balances::Column::ExpiresAt.is_not_null())
            .filter(token_balances::Column::ExpiresAt.lt(now))
            .exec(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Pure read: balances whose subscription pool expires within the
    /// horizon and which have not been warned yet this cycle.
    pub async fn find_expiring_soon(
        &self,
        now: DateTime<Utc>,
        horizon_days: i64,
    ) -> DatabaseResult<Vec<ExpiryWarning>> {
        let horizon = now + Duration::days(horizon_days);

        let rows = token_balances::Entity::find()
            .filter(token_balances::Column::SubscriptionTokens.gt(0))
            .filter(token_balances::Column::ExpiresAt.is_not_null())
            .filter(token_balances::Column::ExpiresAt.gte(now))
            .filter(token_balances::Column::ExpiresAt.lt(horizon))
            .filter(token_balances::Column::ExpiryWarnedAt.is_null())
            .all(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                row.expires_at.map(|expires_at| ExpiryWarning {
                    user_id: row.user_id,
                    subscription_tokens: row.subscription_tokens,
                    days_until_expiry: (expires_at - now).num_days(),
                })
            })
            .collect())
    }

    /// Flag a balance as warned; setting the flag twice is harmless
    pub async fn mark_warned(&self, user_id: i32, now: DateTime<Utc>) -> DatabaseResult<()> {
        token_balances::Entity::update_many()
            .col_expr(token_balances::Column::ExpiryWarnedAt, Expr::value(now))
            .filter(token_balances::Column::UserId.eq(user_id))
            .filter(token_balances::Column::ExpiryWarnedAt.is_null())
            .exec(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(())
    }
}
