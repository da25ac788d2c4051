use super::{Job, JobResult};
use crate::error::AppError;
use crate::ledger::TokenLedger;
use async_trait::async_trait;
use chrono::Utc;

/// Zeroes expired subscription token pools. Purchased tokens are never
/// touched; the sweep is idempotent so an extra run is harmless.
pub struct TokenExpiryJob {
    ledger: TokenLedger,
}

impl TokenExpiryJob {
    pub fn new(ledger: TokenLedger) -> Self {
        Self { ledger }
    }
}

#[async_trait]
impl Job for TokenExpiryJob {
    fn name(&self) -> &str {
        "token_expiry"
    }

    async fn execute(&self) -> Result<JobResult, AppError> {
        let swept = self.ledger.expire_sweep(Utc::now()).await?;
        if swept > 0 {
            tracing::info!(users = swept, "expired subscription token pools");
        }
        Ok(JobResult::success_with_count(swept))
    }
}
