use crate::config::StorageConfig;
use crate::error::AppError;
use crate::storage::ObjectStore;
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Serialize)]
struct SignRequest {
    #[serde(rename = "expiresIn")]
    expires_in: u64,
}

#[derive(Deserialize)]
struct SignResponse {
    #[serde(alias = "signedURL", alias = "signed_url")]
    signed_url: String,
}

/// Object store backed by an HTTP storage gateway. Uploads go through
/// the gateway's object endpoint with a service key; presigning asks
/// the gateway to mint a time-limited public URL.
pub struct HttpObjectStore {
    client: reqwest::Client,
    base_url: String,
    bucket: String,
    service_key: String,
}

impl HttpObjectStore {
    pub fn new(config: &StorageConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            bucket: config.bucket.clone(),
            service_key: config.service_key.clone(),
        }
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> Result<(), AppError> {
        let url = format!("{}/object/{}/{}", self.base_url, self.bucket, key);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.service_key)
            .header("content-type", content_type)
            .header("x-upsert", "true")
            .body(data)
            .send()
            .await
            .map_err(|e| AppError::Persistence(format!("upload request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Persistence(format!(
                "upload returned {status}: {body}"
            )));
        }

        Ok(())
    }

    async fn presign(&self, key: &str, ttl_secs: u64) -> Result<String, AppError> {
        let url = format!("{}/object/sign/{}/{}", self.base_url, self.bucket, key);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.service_key)
            .json(&SignRequest {
                expires_in: ttl_secs,
            })
            .send()
            .await
            .map_err(|e| AppError::Persistence(format!("presign request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Persistence(format!(
                "presign returned {status}: {body}"
            )));
        }

        let signed: SignResponse = response
            .json()
            .await
            .map_err(|e| AppError::Persistence(format!("malformed presign response: {e}")))?;

        // Gateways return the signed path relative to the storage root
        if signed.signed_url.starts_with("http") {
            Ok(signed.signed_url)
        } else {
            Ok(format!(
                "{}/{}",
                self.base_url,
                signed.signed_url.trim_start_matches('/')
            ))
        }
    }
}
