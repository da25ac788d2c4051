//! Generative image provider adapter
//!
//! Submission and polling are separate calls against the provider's
//! async task API. Submission failures are terminal at this layer (no
//! retry); poll failures are the pipeline's business to budget.

pub mod http;
pub mod mock;

use crate::error::AppError;
use async_trait::async_trait;

pub use http::HttpImageProvider;
pub use mock::MockImageProvider;

/// A generation job to submit
#[derive(Debug, Clone)]
pub struct GenerationJob {
    pub prompt: String,
    pub image_urls: Vec<String>,
}

/// Provider-reported task state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Queued,
    Running,
    Success { image_urls: Vec<String> },
    Failed { message: String },
}

#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Submit a job; returns the provider task id
    async fn submit(&self, job: &GenerationJob) -> Result<String, AppError>;

    /// Poll a task's status once
    async fn poll(&self, task_id: &str) -> Result<TaskStatus, AppError>;
}
