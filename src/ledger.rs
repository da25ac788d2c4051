//! Token ledger service
//!
//! Thin policy layer over the balance DAO: maps data-layer debit
//! outcomes onto API errors and owns the compensation (refund) path
//! used when a generation fails after its tokens were already taken.

use crate::database::dao::{DebitOutcome, DebitReceipt, ExpiryWarning, TokenBalancesDao};
use crate::database::entities::TokenBalance;
use crate::error::AppError;
use chrono::{DateTime, Utc};

/// Tokens charged for a single generation
pub const TOKENS_PER_GENERATION: i64 = 1;

/// A user's balance as reported to callers; missing rows read as zero
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceView {
    pub subscription_tokens: i64,
    pub purchased_tokens: i64,
    pub total: i64,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct TokenLedger {
    balances: TokenBalancesDao,
}

impl TokenLedger {
    pub fn new(balances: TokenBalancesDao) -> Self {
        Self { balances }
    }

    pub async fn balance(&self, user_id: i32) -> Result<BalanceView, AppError> {
        let row = self.balances.find_by_user(user_id).await?;
        Ok(match row {
            Some(TokenBalance {
                subscription_tokens,
                purchased_tokens,
                expires_at,
                ..
            }) => BalanceView {
                subscription_tokens,
                purchased_tokens,
                total: subscription_tokens + purchased_tokens,
                expires_at,
            },
            None => BalanceView {
                subscription_tokens: 0,
                purchased_tokens: 0,
                total: 0,
                expires_at: None,
            },
        })
    }

    /// Debit tokens ahead of provider submission. Subscription pool
    /// drains first; an insufficient balance surfaces both pool values
    /// so the client can render an exact shortfall.
    pub async fn debit(&self, user_id: i32, amount: i64) -> Result<DebitReceipt, AppError> {
        match self.balances.debit(user_id, amount).await? {
            DebitOutcome::Debited(receipt) => Ok(receipt),
            DebitOutcome::Insufficient {
                subscription,
                purchased,
            } => Err(AppError::InsufficientTokens {
                subscription,
                purchased,
            }),
        }
    }

    /// Grant subscription tokens, stamping a fresh expiry for the cycle
    pub async fn grant_subscription(
        &self,
        user_id: i32,
        amount: i64,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        self.balances
            .credit(user_id, amount, 0, Some(expires_at))
            .await?;
        Ok(())
    }

    /// Grant purchased tokens (payment approval); these never expire
    pub async fn grant_purchased(&self, user_id: i32, amount: i64) -> Result<(), AppError> {
        self.balances.credit(user_id, 0, amount, None).await?;
        Ok(())
    }

    /// Compensate a failed generation. The refund always lands in the
    /// subscription pool regardless of which pool the debit drew from,
    /// and never resurrects an expiry that the sweep may have cleared.
    pub async fn refund(&self, user_id: i32, amount: i64) -> Result<(), AppError> {
        self.balances.credit(user_id, amount, 0, None).await?;
        Ok(())
    }

    /// Zero expired subscription pools; returns users affected
    pub async fn expire_sweep(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        Ok(self.balances.expire_sweep(now).await?)
    }

    pub async fn find_expiring_soon(
        &self,
        now: DateTime<Utc>,
        horizon_days: i64,
    ) -> Result<Vec<ExpiryWarning>, AppError> {
        Ok(self.balances.find_expiring_soon(now, horizon_days).await?)
    }

    pub async fn mark_warned(&self, user_id: i32, now: DateTime<Utc>) -> Result<(), AppError> {
        self.balances.mark_warned(user_id, now).await?;
        Ok(())
    }
}
