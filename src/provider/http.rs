use crate::config::ProviderConfig;
use crate::error::AppError;
use crate::provider::{GenerationJob, ImageProvider, TaskStatus};
use async_trait::async_trait;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Serialize)]
struct SubmitRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    image_urls: &'a [String],
    output_format: &'a str,
    image_size: &'a str,
}

#[derive(Deserialize)]
struct SubmitResponse {
    #[serde(alias = "taskId", alias = "task_id")]
    task_id: String,
}

#[derive(Deserialize)]
struct PollResponse {
    state: String,
    #[serde(default, alias = "resultJson")]
    result_json: Option<String>,
    #[serde(default, alias = "failMsg")]
    fail_msg: Option<String>,
}

#[derive(Deserialize, Default)]
struct TaskResult {
    #[serde(default, alias = "resultUrls")]
    result_urls: Vec<String>,
}

/// HTTP adapter for the external generation API
pub struct HttpImageProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    output_format: String,
    image_size: String,
}

impl HttpImageProvider {
    pub fn new(config: &ProviderConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            output_format: config.output_format.clone(),
            image_size: config.image_size.clone(),
        }
    }

    fn map_submit_error(status: StatusCode, body: String) -> AppError {
        match status {
            StatusCode::TOO_MANY_REQUESTS => {
                AppError::RateLimited("provider rate limit hit".to_string())
            }
            StatusCode::PAYMENT_REQUIRED => {
                AppError::CreditsExhausted("provider account out of credits".to_string())
            }
            _ => AppError::Provider(format!("provider returned {status}: {body}")),
        }
    }
}

#[async_trait]
impl ImageProvider for HttpImageProvider {
    async fn submit(&self, job: &GenerationJob) -> Result<String, AppError> {
        let url = format!("{}/tasks", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&SubmitRequest {
                model: &self.model,
                prompt: &job.prompt,
                image_urls: &job.image_urls,
                output_format: &self.output_format,
                image_size: &self.image_size,
            })
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("provider request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::map_submit_error(status, body));
        }

        let submit: SubmitResponse = response
            .json()
            .await
            .map_err(|e| AppError::Provider(format!("malformed submit response: {e}")))?;

        Ok(submit.task_id)
    }

    async fn poll(&self, task_id: &str) -> Result<TaskStatus, AppError> {
        let url = format!("{}/tasks/{}", self.base_url, task_id);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("poll request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Provider(format!(
                "poll returned {status}: {body}"
            )));
        }

        let poll: PollResponse = response
            .json()
            .await
            .map_err(|e| AppError::Provider(format!("malformed poll response: {e}")))?;

        Ok(match poll.state.as_str() {
            "queued" | "waiting" => TaskStatus::Queued,
            "running" | "generating" => TaskStatus::Running,
            "success" => {
                let result: TaskResult = poll
                    .result_json
                    .as_deref()
                    .and_then(|json| serde_json::from_str(json).ok())
                    .unwrap_or_default();
                TaskStatus::Success {
                    image_urls: result.result_urls,
                }
            }
            "fail" => TaskStatus::Failed {
                message: poll
                    .fail_msg
                    .unwrap_or_else(|| "provider reported failure".to_string()),
            },
            other => {
                return Err(AppError::Provider(format!(
                    "unknown provider task state: {other}"
                )));
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_error_mapping() {
        assert!(matches!(
            HttpImageProvider::map_submit_error(StatusCode::TOO_MANY_REQUESTS, String::new()),
            AppError::RateLimited(_)
        ));
        assert!(matches!(
            HttpImageProvider::map_submit_error(StatusCode::PAYMENT_REQUIRED, String::new()),
            AppError::CreditsExhausted(_)
        ));
        assert!(matches!(
            HttpImageProvider::map_submit_error(StatusCode::INTERNAL_SERVER_ERROR, String::new()),
            AppError::Provider(_)
        ));
    }
}
