use super::{Job, JobResult};
use crate::database::dao::UsersDao;
use crate::error::AppError;
use async_trait::async_trait;

/// Resets every user's monthly generation counter at the start of a
/// billing month.
pub struct MonthlyResetJob {
    users: UsersDao,
}

impl MonthlyResetJob {
    pub fn new(users: UsersDao) -> Self {
        Self { users }
    }
}

#[async_trait]
impl Job for MonthlyResetJob {
    fn name(&self) -> &str {
        "monthly_reset"
    }

    async fn execute(&self) -> Result<JobResult, AppError> {
        let reset = self.users.reset_all_monthly_usage().await?;
        tracing::info!(users = reset, "monthly generation counters reset");
        Ok(JobResult::success_with_count(reset))
    }
}
