use super::{Job, JobResult};
use crate::error::AppError;
use crate::ledger::TokenLedger;
use async_trait::async_trait;
use chrono::Utc;

/// Flags users whose subscription tokens expire within the horizon.
/// The warned flag keeps a user from being notified twice in a cycle.
pub struct ExpiryWarningsJob {
    ledger: TokenLedger,
    horizon_days: i64,
}

impl ExpiryWarningsJob {
    pub fn new(ledger: TokenLedger, horizon_days: i64) -> Self {
        Self {
            ledger,
            horizon_days,
        }
    }
}

#[async_trait]
impl Job for ExpiryWarningsJob {
    fn name(&self) -> &str {
        "expiry_warnings"
    }

    async fn execute(&self) -> Result<JobResult, AppError> {
        let now = Utc::now();
        let expiring = self.ledger.find_expiring_soon(now, self.horizon_days).await?;

        let mut warned = 0u64;
        for entry in expiring {
            tracing::info!(
                user_id = entry.user_id,
                tokens = entry.subscription_tokens,
                days = entry.days_until_expiry,
                "subscription tokens expiring soon"
            );
            self.ledger.mark_warned(entry.user_id, now).await?;
            warned += 1;
        }

        Ok(JobResult::success_with_count(warned))
    }
}
