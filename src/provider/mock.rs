use crate::error::AppError;
use crate::provider::{GenerationJob, ImageProvider, TaskStatus};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

enum Script {
    /// Queued/Running until the nth poll, then Success with these URLs
    SucceedAfter { polls: usize, image_urls: Vec<String> },
    /// Queued/Running until the nth poll, then Failed with this message
    FailOn { polls: usize, message: String },
    /// Running forever (exercises the attempt budget)
    NeverComplete,
    /// Submission itself fails
    RejectSubmit(AppError),
}

/// Scripted provider for tests. Counts submissions and polls so tests
/// can assert "no provider call was made" or "exactly N polls ran".
pub struct MockImageProvider {
    script: Script,
    submit_calls: AtomicUsize,
    poll_calls: AtomicUsize,
    last_job: Mutex<Option<GenerationJob>>,
}

impl MockImageProvider {
    fn with_script(script: Script) -> Self {
        Self {
            script,
            submit_calls: AtomicUsize::new(0),
            poll_calls: AtomicUsize::new(0),
            last_job: Mutex::new(None),
        }
    }

    pub fn succeed_after(polls: usize, image_urls: Vec<String>) -> Self {
        Self::with_script(Script::SucceedAfter { polls, image_urls })
    }

    pub fn succeed_immediately(image_url: &str) -> Self {
        Self::succeed_after(1, vec![image_url.to_string()])
    }

    pub fn fail_on(polls: usize, message: &str) -> Self {
        Self::with_script(Script::FailOn {
            polls,
            message: message.to_string(),
        })
    }

    pub fn never_complete() -> Self {
        Self::with_script(Script::NeverComplete)
    }

    pub fn reject_submit(error: AppError) -> Self {
        Self::with_script(Script::RejectSubmit(error))
    }

    pub fn submit_count(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn poll_count(&self) -> usize {
        self.poll_calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_job
            .lock()
            .expect("mock lock poisoned")
            .as_ref()
            .map(|job| job.prompt.clone())
    }
}

#[async_trait]
impl ImageProvider for MockImageProvider {
    async fn submit(&self, job: &GenerationJob) -> Result<String, AppError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_job.lock().expect("mock lock poisoned") = Some(job.clone());

        if let Script::RejectSubmit(error) = &self.script {
            return Err(match error {
                AppError::RateLimited(m) => AppError::RateLimited(m.clone()),
                AppError::CreditsExhausted(m) => AppError::CreditsExhausted(m.clone()),
                other => AppError::Provider(other.to_string()),
            });
        }

        Ok("task-0001".to_string())
    }

    async fn poll(&self, _task_id: &str) -> Result<TaskStatus, AppError> {
        let call = self.poll_calls.fetch_add(1, Ordering::SeqCst) + 1;

        Ok(match &self.script {
            Script::SucceedAfter { polls, image_urls } if call >= *polls => TaskStatus::Success {
                image_urls: image_urls.clone(),
            },
            Script::FailOn { polls, message } if call >= *polls => TaskStatus::Failed {
                message: message.clone(),
            },
            Script::RejectSubmit(_) => TaskStatus::Running,
            _ if call == 1 => TaskStatus::Queued,
            _ => TaskStatus::Running,
        })
    }
}
