//! Health checking for liveness and readiness endpoints

use crate::database::Database;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthCheckResult {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub duration_ms: u64,
}

#[async_trait]
pub trait HealthChecker: Send + Sync {
    fn name(&self) -> &str;
    async fn check(&self) -> Result<(), String>;
}

/// Database connectivity check
pub struct DatabaseHealthChecker {
    database: Database,
}

impl DatabaseHealthChecker {
    pub fn new(database: Database) -> Self {
        Self { database }
    }
}

#[async_trait]
impl HealthChecker for DatabaseHealthChecker {
    fn name(&self) -> &str {
        "database"
    }

    async fn check(&self) -> Result<(), String> {
        self.database.health_check().await.map_err(|e| e.to_string())
    }
}

/// Aggregate report over all registered checkers
#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub components: HashMap<String, HealthCheckResult>,
}

#[derive(Default)]
pub struct HealthRegistry {
    checkers: Vec<Arc<dyn HealthChecker>>,
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, checker: Arc<dyn HealthChecker>) {
        self.checkers.push(checker);
    }

    pub async fn check_all(&self) -> HealthReport {
        let mut components = HashMap::new();
        let mut overall = HealthStatus::Healthy;

        for checker in &self.checkers {
            let start = Instant::now();
            let result = match checker.check().await {
                Ok(()) => HealthCheckResult {
                    status: HealthStatus::Healthy,
                    message: None,
                    duration_ms: start.elapsed().as_millis() as u64,
                },
                Err(message) => {
                    overall = HealthStatus::Unhealthy;
                    HealthCheckResult {
                        status: HealthStatus::Unhealthy,
                        message: Some(message),
                        duration_ms: start.elapsed().as_millis() as u64,
                    }
                }
            };
            components.insert(checker.name().to_string(), result);
        }

        HealthReport {
            status: overall,
            components,
        }
    }
}
