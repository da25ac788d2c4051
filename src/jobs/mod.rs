//! Background jobs: token expiry sweep, expiry warnings and the
//! monthly usage-counter reset, driven by a cron-style scheduler.

pub mod expiry_warnings;
pub mod monthly_reset;
pub mod scheduler;
pub mod token_expiry;

use crate::error::AppError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use expiry_warnings::ExpiryWarningsJob;
pub use monthly_reset::MonthlyResetJob;
pub use scheduler::JobScheduler;
pub use token_expiry::TokenExpiryJob;

/// Configuration for the job system
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsConfig {
    /// Enable/disable internal job scheduler
    pub enabled: bool,

    pub token_expiry: TokenExpiryConfig,
    pub expiry_warnings: ExpiryWarningsConfig,
    pub monthly_reset: MonthlyResetConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenExpiryConfig {
    /// Cron schedule expression (6-field: sec min hour day month dow)
    pub schedule: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpiryWarningsConfig {
    pub schedule: String,
    /// Days before expiry at which users get warned
    pub horizon_days: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyResetConfig {
    pub schedule: String,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            token_expiry: TokenExpiryConfig {
                schedule: "0 0 1 * * *".to_string(), // daily at 1 AM
            },
            expiry_warnings: ExpiryWarningsConfig {
                schedule: "0 0 9 * * *".to_string(), // daily at 9 AM
                horizon_days: 7,
            },
            monthly_reset: MonthlyResetConfig {
                schedule: "0 0 0 1 * *".to_string(), // first of the month
            },
        }
    }
}

/// Result of job execution
#[derive(Debug, Clone)]
pub struct JobResult {
    pub success: bool,
    pub message: String,
    pub items_processed: u64,
}

impl JobResult {
    pub fn success_with_count(count: u64) -> Self {
        Self {
            success: true,
            message: format!("Successfully processed {count} items"),
            items_processed: count,
        }
    }

    pub fn failure(message: String) -> Self {
        Self {
            success: false,
            message,
            items_processed: 0,
        }
    }
}

/// Trait for executable jobs
#[async_trait]
pub trait Job: Send + Sync {
    /// Get the job name for logging and schedule lookup
    fn name(&self) -> &str;

    /// Execute the job and return the result
    async fn execute(&self) -> Result<JobResult, AppError>;
}
