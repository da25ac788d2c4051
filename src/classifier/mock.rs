use crate::classifier::{Classification, VisionClassifier};
use crate::error::AppError;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Scripted classifier for tests: returns a fixed classification or a
/// fixed error, counting calls either way.
pub struct MockClassifier {
    result: Result<Classification, String>,
    calls: AtomicUsize,
}

impl MockClassifier {
    pub fn returning(classification: Classification) -> Self {
        Self {
            result: Ok(classification),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_category(category: &str) -> Self {
        Self::returning(Classification {
            category: category.to_string(),
            labels: Vec::new(),
            gender: None,
            subcategories: Vec::new(),
        })
    }

    pub fn failing(message: &str) -> Self {
        Self {
            result: Err(message.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VisionClassifier for MockClassifier {
    async fn classify(&self, _image_url: &str) -> Result<Classification, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.result {
            Ok(classification) => Ok(classification.clone()),
            Err(message) => Err(AppError::Provider(message.clone())),
        }
    }
}
