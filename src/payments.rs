//! Payment approval workflow
//!
//! Payments are bank transfers disambiguated by a small random
//! surcharge (the unique code). An admin moves each record from
//! pending to approved or rejected exactly once; approval credits the
//! purchased token pool including a bonus frozen from the code.

use crate::database::dao::PaymentsDao;
use crate::database::entities::payments::bonus_tokens_for_code;
use crate::database::entities::{PaymentRecord, PaymentStatus};
use crate::error::AppError;
use crate::ledger::TokenLedger;
use chrono::Utc;
use rand::Rng;

/// Unique codes are three digits so they read as a surcharge in the
/// transferred amount
const UNIQUE_CODE_MIN: i64 = 100;
const UNIQUE_CODE_MAX: i64 = 999;

#[derive(Clone)]
pub struct PaymentService {
    payments: PaymentsDao,
    ledger: TokenLedger,
}

impl PaymentService {
    pub fn new(payments: PaymentsDao, ledger: TokenLedger) -> Self {
        Self { payments, ledger }
    }

    /// Create a pending payment with a fresh unique code
    pub async fn create(
        &self,
        user_id: i32,
        amount: i64,
        tokens_purchased: i64,
        payment_proof_url: Option<String>,
    ) -> Result<PaymentRecord, AppError> {
        if amount <= 0 {
            return Err(AppError::Validation("amount must be positive".to_string()));
        }
        if tokens_purchased <= 0 {
            return Err(AppError::Validation(
                "tokens_purchased must be positive".to_string(),
            ));
        }

        let unique_code = rand::rng().random_range(UNIQUE_CODE_MIN..=UNIQUE_CODE_MAX);

        let mut record = PaymentRecord {
            id: 0,
            user_id,
            amount,
            unique_code,
            amount_with_code: amount + unique_code,
            tokens_purchased,
            bonus_tokens: 0,
            payment_status: PaymentStatus::Pending,
            payment_proof_url,
            admin_notes: None,
            verified_by: None,
            verified_at: None,
            created_at: Utc::now(),
        };

        record.id = self.payments.store(&record).await?;
        Ok(record)
    }

    /// Approve a pending payment and credit the purchased pool.
    ///
    /// The bonus is computed here, once, from the stored unique code
    /// and persisted with the approval. The pending-only transition
    /// guard makes a concurrent or repeated approval a conflict, so
    /// tokens are credited at most once per payment.
    pub async fn approve(
        &self,
        payment_id: i32,
        admin_id: i32,
        notes: Option<String>,
    ) -> Result<PaymentRecord, AppError> {
        let payment = self
            .payments
            .find_by_id(payment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("payment {payment_id} not found")))?;

        let bonus = bonus_tokens_for_code(payment.unique_code);

        let transitioned = self
            .payments
            .approve_pending(payment_id, admin_id, bonus, notes, Utc::now())
            .await?;
        if !transitioned {
            return Err(AppError::Conflict(format!(
                "payment {payment_id} is no longer pending"
            )));
        }

        self.ledger
            .grant_purchased(payment.user_id, payment.tokens_purchased + bonus)
            .await?;

        tracing::info!(
            payment_id,
            user_id = payment.user_id,
            tokens = payment.tokens_purchased,
            bonus,
            "payment approved, tokens credited"
        );

        self.payments
            .find_by_id(payment_id)
            .await?
            .ok_or_else(|| AppError::Internal("approved payment disappeared".to_string()))
    }

    /// Reject a pending payment; requires a non-empty admin note
    pub async fn reject(
        &self,
        payment_id: i32,
        admin_id: i32,
        notes: String,
    ) -> Result<PaymentRecord, AppError> {
        if notes.trim().is_empty() {
            return Err(AppError::Validation(
                "rejection requires a non-empty note".to_string(),
            ));
        }

        let transitioned = self
            .payments
            .reject_pending(payment_id, admin_id, notes, Utc::now())
            .await?;
        if !transitioned {
            let exists = self.payments.find_by_id(payment_id).await?.is_some();
            return Err(if exists {
                AppError::Conflict(format!("payment {payment_id} is no longer pending"))
            } else {
                AppError::NotFound(format!("payment {payment_id} not found"))
            });
        }

        self.payments
            .find_by_id(payment_id)
            .await?
            .ok_or_else(|| AppError::Internal("rejected payment disappeared".to_string()))
    }

    pub async fn list_pending(&self) -> Result<Vec<PaymentRecord>, AppError> {
        Ok(self.payments.list_by_status(PaymentStatus::Pending).await?)
    }

    pub async fn list_for_user(&self, user_id: i32) -> Result<Vec<PaymentRecord>, AppError> {
        Ok(self.payments.find_by_user(user_id).await?)
    }

    pub async fn find(&self, payment_id: i32) -> Result<PaymentRecord, AppError> {
        self.payments
            .find_by_id(payment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("payment {payment_id} not found")))
    }
}
