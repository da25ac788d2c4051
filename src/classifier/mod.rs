//! Vision classification adapter
//!
//! Classification is a best-effort hint, never a hard dependency: any
//! failure (network, low confidence, malformed response) falls back to
//! the configured default category, and gender detection likewise falls
//! back to the configured default. Callers can never observe a
//! classification failure as a request failure.

pub mod http;
pub mod mock;

use crate::catalog::Gender;
use crate::error::AppError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use http::HttpClassifier;
pub use mock::MockClassifier;

/// Raw result from the external vision classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    pub category: String,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub subcategories: Vec<String>,
}

#[async_trait]
pub trait VisionClassifier: Send + Sync {
    async fn classify(&self, image_url: &str) -> Result<Classification, AppError>;
}

/// Keyword table for deriving a gender from classifier labels.
/// First match wins; no match falls through to the default.
const GENDER_RULES: &[(&str, Gender)] = &[
    ("male", Gender::Male),
    ("man", Gender::Male),
    ("men", Gender::Male),
    ("boy", Gender::Male),
    ("female", Gender::Female),
    ("woman", Gender::Female),
    ("women", Gender::Female),
    ("girl", Gender::Female),
    ("lady", Gender::Female),
];

pub fn detect_gender(labels: &[String], default: Gender) -> Gender {
    for label in labels {
        let label = label.to_lowercase();
        // "female" contains "male"; check whole-word-ish prefixes in rule order
        // with the female terms resolving their own entries.
        if label.contains("female") || label.contains("woman") || label.contains("women") {
            return Gender::Female;
        }
        for (keyword, gender) in GENDER_RULES {
            if label.contains(keyword) {
                return *gender;
            }
        }
    }
    default
}

/// Fail-open wrapper: classify, falling back to the default category
/// (and default gender) on any adapter error.
#[derive(Clone)]
pub struct ClassifierWithDefault {
    inner: std::sync::Arc<dyn VisionClassifier>,
    default_category: String,
    default_gender: Gender,
}

impl ClassifierWithDefault {
    pub fn new(
        inner: std::sync::Arc<dyn VisionClassifier>,
        default_category: String,
        default_gender: Gender,
    ) -> Self {
        Self {
            inner,
            default_category,
            default_gender,
        }
    }

    /// Never fails. A supplied hint skips classification entirely.
    pub async fn classify_or_default(
        &self,
        image_url: &str,
        category_hint: Option<&str>,
    ) -> (String, Gender) {
        if let Some(hint) = category_hint {
            return (hint.to_string(), self.default_gender);
        }

        match self.inner.classify(image_url).await {
            Ok(classification) => {
                let gender = match classification.gender.as_deref() {
                    Some(g) => detect_gender(&[g.to_string()], self.default_gender),
                    None => detect_gender(&classification.labels, self.default_gender),
                };
                (classification.category, gender)
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    default = %self.default_category,
                    "classification failed, falling back to default category"
                );
                (self.default_category.clone(), self.default_gender)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_gender_male_keywords() {
        let labels = vec!["portrait of a man".to_string()];
        assert_eq!(detect_gender(&labels, Gender::Female), Gender::Male);
    }

    #[test]
    fn test_detect_gender_female_not_shadowed_by_male_substring() {
        let labels = vec!["young female model".to_string()];
        assert_eq!(detect_gender(&labels, Gender::Male), Gender::Female);
    }

    #[test]
    fn test_detect_gender_falls_back_to_default() {
        let labels = vec!["red dress".to_string(), "studio".to_string()];
        assert_eq!(detect_gender(&labels, Gender::Female), Gender::Female);
        assert_eq!(detect_gender(&labels, Gender::Male), Gender::Male);
    }

    #[tokio::test]
    async fn test_classify_or_default_uses_hint_verbatim() {
        let mock = std::sync::Arc::new(MockClassifier::failing("unreachable"));
        let classifier = ClassifierWithDefault::new(
            mock.clone(),
            "fashion".to_string(),
            Gender::Female,
        );
        let (category, _) = classifier
            .classify_or_default("https://img.example/1.png", Some("interior"))
            .await;
        assert_eq!(category, "interior");
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_classify_or_default_fails_open() {
        let classifier = ClassifierWithDefault::new(
            std::sync::Arc::new(MockClassifier::failing("connection refused")),
            "fashion".to_string(),
            Gender::Female,
        );
        let (category, gender) = classifier
            .classify_or_default("https://img.example/1.png", None)
            .await;
        assert_eq!(category, "fashion");
        assert_eq!(gender, Gender::Female);
    }
}
