use crate::classifier::{Classification, VisionClassifier};
use crate::config::ClassifierConfig;
use crate::error::AppError;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

#[derive(Serialize)]
struct ClassifyRequest<'a> {
    image_url: &'a str,
}

/// HTTP adapter for the external vision classification API
pub struct HttpClassifier {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpClassifier {
    pub fn new(config: &ClassifierConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl VisionClassifier for HttpClassifier {
    async fn classify(&self, image_url: &str) -> Result<Classification, AppError> {
        let url = format!("{}/classify", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&ClassifyRequest { image_url })
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("classifier request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Provider(format!(
                "classifier returned {status}: {body}"
            )));
        }

        let classification: Classification = response
            .json()
            .await
            .map_err(|e| AppError::Provider(format!("malformed classifier response: {e}")))?;

        if classification.category.is_empty() {
            return Err(AppError::Provider(
                "classifier returned empty category".to_string(),
            ));
        }

        Ok(classification)
    }
}
