//! Image enhancement request pipeline
//!
//! Strictly sequential per request, no branching back:
//! validate -> classify -> compose -> debit -> submit -> poll ->
//! persist. The token debit happens once, before the provider is
//! contacted, and is compensated with a credit whenever the provider
//! run ends without a delivered artifact.

pub mod prompt;

use crate::catalog::{Catalog, Gender};
use crate::classifier::ClassifierWithDefault;
use crate::config::PipelineConfig;
use crate::database::dao::{GenerationsDao, UsersDao};
use crate::database::entities::GenerationRecord;
use crate::error::AppError;
use crate::ledger::{TokenLedger, TOKENS_PER_GENERATION};
use crate::provider::{GenerationJob, ImageProvider, TaskStatus};
use crate::storage::{generated_image_key, ObjectStore, PresignCache};
use base64::Engine;
use bytes::Bytes;
use chrono::{Duration, Utc};
use std::sync::Arc;

/// An inbound enhancement request after authentication
#[derive(Debug, Clone)]
pub struct EnhancementRequest {
    pub user_id: i32,
    pub image_url: String,
    /// Display labels or stable keys, one per selected enhancement
    pub enhancements: Vec<String>,
    /// Skips classification when the caller already knows the domain
    pub category_hint: Option<String>,
    pub watermark: Option<String>,
    pub custom_prompt: Option<String>,
    /// Interactive requests get short-lived presigned URLs
    pub interactive: bool,
}

/// Terminal success payload
#[derive(Debug, Clone)]
pub struct EnhancementOutcome {
    pub generated_image_url: String,
    pub prompt: String,
    pub task_id: String,
    pub generation_id: Option<i32>,
    /// False when storage failed and the URL is the provider's own
    pub persisted: bool,
    pub category: String,
}

pub struct Pipeline {
    provider: Arc<dyn ImageProvider>,
    store: Arc<dyn ObjectStore>,
    classifier: ClassifierWithDefault,
    catalog: Catalog,
    ledger: TokenLedger,
    generations: GenerationsDao,
    users: UsersDao,
    presign_cache: Arc<PresignCache>,
    config: PipelineConfig,
    http: reqwest::Client,
}

impl Pipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        provider: Arc<dyn ImageProvider>,
        store: Arc<dyn ObjectStore>,
        classifier: ClassifierWithDefault,
        catalog: Catalog,
        ledger: TokenLedger,
        generations: GenerationsDao,
        users: UsersDao,
        presign_cache: Arc<PresignCache>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            provider,
            store,
            classifier,
            catalog,
            ledger,
            generations,
            users,
            presign_cache,
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Run one request end to end. Blocks for up to the full polling
    /// budget; callers must tolerate a long synchronous call.
    pub async fn run(&self, request: EnhancementRequest) -> Result<EnhancementOutcome, AppError> {
        self.validate(&request)?;

        let (category, gender) = self
            .classifier
            .classify_or_default(&request.image_url, request.category_hint.as_deref())
            .await;

        let (prompt, image_urls, primary_type) =
            self.compose(&request, gender).await?;

        // One token per request regardless of how many enhancements
        // were combined; combining is a pricing decision.
        let receipt = self
            .ledger
            .debit(request.user_id, TOKENS_PER_GENERATION)
            .await?;
        tracing::debug!(
            user_id = request.user_id,
            subscription_used = receipt.subscription_used,
            purchased_used = receipt.purchased_used,
            "debited generation tokens"
        );

        let job = GenerationJob {
            prompt: prompt.clone(),
            image_urls,
        };

        let task_id = match self.provider.submit(&job).await {
            Ok(task_id) => task_id,
            Err(e) => {
                self.refund(request.user_id).await;
                return Err(e);
            }
        };

        let provider_url = match self.poll_until_terminal(&task_id).await {
            Ok(url) => url,
            Err(e) => {
                self.refund(request.user_id).await;
                return Err(e);
            }
        };

        match self
            .persist(&request, &category, &primary_type, &prompt, &provider_url)
            .await
        {
            Ok((generation_id, presigned_url)) => Ok(EnhancementOutcome {
                generated_image_url: presigned_url,
                prompt,
                task_id,
                generation_id: Some(generation_id),
                persisted: true,
                category,
            }),
            Err(e) => {
                // The pixels exist at the provider; degrade the response
                // instead of discarding a paid-for generation.
                tracing::error!(
                    user_id = request.user_id,
                    error = %e,
                    "persistence failed, returning provider URL as fallback"
                );
                Ok(EnhancementOutcome {
                    generated_image_url: provider_url,
                    prompt,
                    task_id,
                    generation_id: None,
                    persisted: false,
                    category,
                })
            }
        }
    }

    fn validate(&self, request: &EnhancementRequest) -> Result<(), AppError> {
        if request.image_url.trim().is_empty() {
            return Err(AppError::Validation("imageUrl is required".to_string()));
        }
        if request.enhancements.is_empty() {
            return Err(AppError::Validation(
                "at least one enhancement must be selected".to_string(),
            ));
        }
        if request.enhancements.len() > self.config.max_combined_enhancements {
            return Err(AppError::Validation(format!(
                "at most {} enhancements may be combined",
                self.config.max_combined_enhancements
            )));
        }
        Ok(())
    }

    /// Resolve selectors to templates and build the final prompt plus
    /// the input image list (one or two URLs).
    async fn compose(
        &self,
        request: &EnhancementRequest,
        gender: Gender,
    ) -> Result<(String, Vec<String>, String), AppError> {
        let mut templates = Vec::with_capacity(request.enhancements.len());
        let mut primary_type = String::new();
        let mut model_reference: Option<&'static str> = None;

        for selector in &request.enhancements {
            let resolved = self.catalog.resolve_template(selector).await?;

            if prompt::is_model_shot(&resolved.display_name) {
                let noun = prompt::product_noun(&resolved.display_name);
                model_reference = Some(prompt::select_model_reference(
                    &resolved.display_name,
                    gender,
                ));
                templates.push(prompt::rewrite_for_model_shot(&resolved.template, noun));
            } else {
                templates.push(resolved.template);
            }

            if primary_type.is_empty() {
                primary_type = resolved.enhancement_type;
            }
        }

        let mut prompt_text = Catalog::combine_prompts(&templates);

        if let Some(custom) = request.custom_prompt.as_deref() {
            if !custom.trim().is_empty() {
                prompt_text.push_str("\nAdditional styling: ");
                prompt_text.push_str(custom.trim());
            }
        }

        prompt_text.push('\n');
        prompt_text.push_str(&prompt::watermark_instruction(request.watermark.as_deref()));

        let mut image_urls = vec![request.image_url.clone()];
        if let Some(reference) = model_reference {
            image_urls.push(reference.to_string());
        }

        Ok((prompt_text, image_urls, primary_type))
    }

    /// Fixed-interval polling with a hard attempt ceiling. Transient
    /// poll errors burn an attempt rather than failing the request;
    /// only a provider-reported failure or an exhausted budget is
    /// terminal.
    async fn poll_until_terminal(&self, task_id: &str) -> Result<String, AppError> {
        let interval = std::time::Duration::from_millis(self.config.poll_interval_ms);

        for attempt in 1..=self.config.max_poll_attempts {
            match self.provider.poll(task_id).await {
                Ok(TaskStatus::Success { image_urls }) => {
                    return image_urls.into_iter().next().ok_or_else(|| {
                        AppError::Provider("provider reported success with no result URL".to_string())
                    });
                }
                Ok(TaskStatus::Failed { message }) => {
                    return Err(AppError::Provider(message));
                }
                Ok(TaskStatus::Queued | TaskStatus::Running) => {}
                Err(e) => {
                    tracing::debug!(task_id, attempt, error = %e, "transient poll failure");
                }
            }

            if attempt < self.config.max_poll_attempts {
                tokio::time::sleep(interval).await;
            }
        }

        Err(AppError::TimedOut(format!(
            "generation did not complete within {} polls",
            self.config.max_poll_attempts
        )))
    }

    /// Download the result, upload it to the object store, presign a
    /// read URL and write the generation record.
    async fn persist(
        &self,
        request: &EnhancementRequest,
        category: &str,
        enhancement_type: &str,
        prompt_used: &str,
        provider_url: &str,
    ) -> Result<(i32, String), AppError> {
        let data = self.download(provider_url).await?;

        let now = Utc::now();
        let key = generated_image_key(request.user_id, now.timestamp_millis());
        self.store.put(&key, data, "image/png").await?;

        let ttl_secs = if request.interactive {
            self.config.interactive_presign_ttl_secs
        } else {
            self.config.api_presign_ttl_secs
        };
        let presigned_url = self.presign_cached(&key, ttl_secs).await?;
        let presigned_expires = now + Duration::seconds(ttl_secs as i64);

        let record = GenerationRecord {
            id: 0,
            user_id: request.user_id,
            original_image_path: request.image_url.clone(),
            generated_image_path: key,
            enhancement_type: enhancement_type.to_string(),
            classification_result: Some(category.to_string()),
            prompt_used: prompt_used.to_string(),
            presigned_url: Some(presigned_url.clone()),
            presigned_url_expires_at: Some(presigned_expires),
            created_at: now,
        };
        let generation_id = self.generations.store(&record).await?;

        if let Err(e) = self.users.increment_monthly_usage(request.user_id).await {
            tracing::warn!(user_id = request.user_id, error = %e, "usage counter bump failed");
        }

        Ok((generation_id, presigned_url))
    }

    pub async fn presign_cached(&self, key: &str, ttl_secs: u64) -> Result<String, AppError> {
        if let Some(url) = self.presign_cache.get(key) {
            return Ok(url);
        }
        let url = self.store.presign(key, ttl_secs).await?;
        self.presign_cache.insert(
            key.to_string(),
            url.clone(),
            Utc::now() + Duration::seconds(ttl_secs as i64),
        );
        Ok(url)
    }

    /// Result images arrive either as data URIs or as remote URLs
    async fn download(&self, url: &str) -> Result<Bytes, AppError> {
        if let Some(rest) = url.strip_prefix("data:") {
            let payload = rest
                .split_once("base64,")
                .map(|(_, data)| data)
                .ok_or_else(|| {
                    AppError::Persistence("data URI without base64 payload".to_string())
                })?;
            let decoded = base64::engine::general_purpose::STANDARD
                .decode(payload)
                .map_err(|e| AppError::Persistence(format!("invalid data URI: {e}")))?;
            return Ok(Bytes::from(decoded));
        }

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::Persistence(format!("result download failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Persistence(format!(
                "result download returned {status}"
            )));
        }

        response
            .bytes()
            .await
            .map_err(|e| AppError::Persistence(format!("result download failed: {e}")))
    }

    /// Compensating credit after a debit with no delivered artifact.
    /// Best-effort: a failed refund is logged, not surfaced, so the
    /// original provider error stays the caller-visible failure.
    async fn refund(&self, user_id: i32) {
        if let Err(e) = self.ledger.refund(user_id, TOKENS_PER_GENERATION).await {
            tracing::error!(user_id, error = %e, "token refund failed");
        }
    }
}
