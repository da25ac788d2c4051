//! Builders for wiring test servers around in-memory backends and
//! scripted adapters.

use crate::{
    classifier::{MockClassifier, VisionClassifier},
    config::Config,
    database::Database,
    database::entities::{TokenBalance, UserRecord},
    provider::{ImageProvider, MockImageProvider},
    server::Server,
    storage::{MemoryObjectStore, ObjectStore},
};
use chrono::Utc;
use std::sync::Arc;

/// Test server builder: in-memory SQLite, mock provider/classifier and
/// memory object store unless overridden.
pub struct TestServerBuilder {
    config: Config,
    provider: Option<Arc<dyn ImageProvider>>,
    store: Option<Arc<dyn ObjectStore>>,
    classifier: Option<Arc<dyn VisionClassifier>>,
}

impl TestServerBuilder {
    pub fn new() -> Self {
        let mut config = Config::default();
        config.database.url = "sqlite::memory:".to_string();
        config.auth.jwt_secret = "test-secret".to_string();
        config.metrics.enabled = false;
        config.jobs.enabled = false;
        config.rate_limit.enabled = false;
        // Keep polling fast in tests
        config.pipeline.poll_interval_ms = 1;

        Self {
            config,
            provider: None,
            store: None,
            classifier: None,
        }
    }

    pub fn with_config(mut self, f: impl FnOnce(&mut Config)) -> Self {
        f(&mut self.config);
        self
    }

    pub fn with_provider(mut self, provider: Arc<dyn ImageProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_store(mut self, store: Arc<dyn ObjectStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn VisionClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub async fn build(self) -> Server {
        let database = Database::connect(&self.config.database.url)
            .await
            .expect("test database connect");
        database.migrate().await.expect("test migrations");

        let provider = self
            .provider
            .unwrap_or_else(|| Arc::new(MockImageProvider::succeed_immediately("data:image/png;base64,aGVsbG8=")));
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryObjectStore::new()));
        let classifier = self
            .classifier
            .unwrap_or_else(|| Arc::new(MockClassifier::with_category("fashion")));

        Server::with_adapters(self.config, database, provider, store, classifier)
            .expect("test server build")
    }
}

impl Default for TestServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Insert a user and return the stored record
pub async fn seed_user(server: &Server, email: &str, is_admin: bool) -> UserRecord {
    let mut user = UserRecord::new(email.to_string());
    user.is_admin = is_admin;
    let user_id = server.database.users().store(&user).await.expect("seed user");
    server
        .database
        .users()
        .find_by_id(user_id)
        .await
        .expect("seed user lookup")
        .expect("seeded user exists")
}

/// Give a user an exact balance in both pools
pub async fn seed_balance(server: &Server, user_id: i32, subscription: i64, purchased: i64) {
    let expiry = if subscription > 0 {
        Some(Utc::now() + chrono::Duration::days(30))
    } else {
        None
    };
    if subscription > 0 || purchased > 0 {
        server
            .database
            .token_balances()
            .credit(user_id, subscription, purchased, expiry)
            .await
            .expect("seed balance");
    }
}

/// Read a user's balance row directly
pub async fn balance_of(server: &Server, user_id: i32) -> Option<TokenBalance> {
    server
        .database
        .token_balances()
        .find_by_user(user_id)
        .await
        .expect("balance lookup")
}

/// Bearer token for a seeded user
pub fn session_token(server: &Server, user_id: i32) -> String {
    server
        .jwt_service
        .create_token(user_id)
        .expect("session token")
}
