use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub api_keys: ApiKeysConfig,
    pub provider: ProviderConfig,
    pub classifier: ClassifierConfig,
    pub storage: StorageConfig,
    pub pipeline: PipelineConfig,
    pub rate_limit: RateLimitConfig,
    pub jobs: crate::jobs::JobsConfig,
    pub metrics: MetricsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://pixelnova.db?mode=rwc".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_algorithm: String,
    /// Session token lifetime in seconds
    pub token_ttl_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "change-me".to_string(),
            jwt_algorithm: "HS256".to_string(),
            token_ttl_secs: 3600,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeysConfig {
    pub enabled: bool,
    pub max_keys_per_user: u32,
}

impl Default for ApiKeysConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_keys_per_user: 5,
        }
    }
}

/// External generative-image API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub output_format: String,
    pub image_size: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.imagegen.example.com".to_string(),
            api_key: String::new(),
            model: "nano-banana-edit".to_string(),
            output_format: "png".to_string(),
            image_size: "auto".to_string(),
        }
    }
}

/// External vision classification API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    pub base_url: String,
    pub api_key: String,
    /// Category used when classification fails or is inconclusive
    pub default_category: String,
    pub default_gender: String,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.vision.example.com".to_string(),
            api_key: String::new(),
            default_category: "fashion".to_string(),
            default_gender: "female".to_string(),
        }
    }
}

/// Object storage gateway for generated images
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub base_url: String,
    pub bucket: String,
    pub service_key: String,
    /// Presigned-URL cache capacity
    pub url_cache_capacity: usize,
    /// Seconds shaved off a cached URL's lifetime before it is considered stale
    pub url_cache_margin_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_url: "https://storage.example.com".to_string(),
            bucket: "generated-images".to_string(),
            service_key: String::new(),
            url_cache_capacity: 256,
            url_cache_margin_secs: 600, // cache ~50 min of a 1 h URL
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Fixed delay between status polls, in milliseconds
    pub poll_interval_ms: u64,
    /// Hard ceiling on poll attempts; the budget is interval * attempts
    pub max_poll_attempts: u32,
    /// Presign TTL for API-key requests, in seconds
    pub api_presign_ttl_secs: u64,
    /// Presign TTL for interactive requests, in seconds
    pub interactive_presign_ttl_secs: u64,
    /// Maximum enhancements combined into one prompt
    pub max_combined_enhancements: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 2000,
            max_poll_attempts: 60,
            api_presign_ttl_secs: 7 * 24 * 3600,
            interactive_presign_ttl_secs: 3600,
            max_combined_enhancements: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub enabled: bool,
    /// Requests per minute per API key
    pub api_key_rpm: u32,
    /// Requests per hour per user
    pub user_rph: u32,
    /// Requests per hour per IP address
    pub ip_rph: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key_rpm: 60,
            user_rph: 100,
            ip_rph: 200,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: 9090,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder =
            ConfigBuilder::builder().add_source(config::Config::try_from(&Config::default())?);

        if Path::new("config.yaml").exists() {
            builder = builder.add_source(File::with_name("config"));
        }

        builder = builder.add_source(
            Environment::with_prefix("PIXELNOVA")
                .prefix_separator("_")
                .separator("__"),
        );

        builder.build()?.try_deserialize()
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut builder =
            ConfigBuilder::builder().add_source(config::Config::try_from(&Config::default())?);

        if path.as_ref().exists() {
            builder = builder.add_source(File::from(path.as_ref()));
        }

        builder = builder.add_source(
            Environment::with_prefix("PIXELNOVA")
                .prefix_separator("_")
                .separator("__"),
        );

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.pipeline.poll_interval_ms, 2000);
        assert_eq!(config.pipeline.max_poll_attempts, 60);
        assert_eq!(config.rate_limit.api_key_rpm, 60);
        assert_eq!(config.classifier.default_category, "fashion");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    #[serial]
    fn test_config_load_from_yaml_file() {
        let yaml_content = r#"
server:
  host: "127.0.0.1"
  port: 4000
provider:
  base_url: "https://gen.example.net"
  model: "edit-v2"
pipeline:
  max_poll_attempts: 10
logging:
  level: "warn"
"#;

        let mut temp_file = NamedTempFile::with_suffix(".yaml").unwrap();
        temp_file.write_all(yaml_content.as_bytes()).unwrap();

        let config = Config::load_from_file(temp_file.path()).unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.provider.base_url, "https://gen.example.net");
        assert_eq!(config.provider.model, "edit-v2");
        assert_eq!(config.pipeline.max_poll_attempts, 10);
        assert_eq!(config.logging.level, "warn");
        // Untouched sections keep their defaults
        assert_eq!(config.pipeline.poll_interval_ms, 2000);
    }

    #[test]
    #[serial]
    fn test_config_load_nonexistent_file() {
        let config = Config::load_from_file("nonexistent.yaml").unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.storage.bucket, "generated-images");
    }

    #[test]
    #[serial]
    fn test_env_overrides_take_precedence() {
        std::env::set_var("PIXELNOVA_SERVER__PORT", "8123");
        std::env::set_var("PIXELNOVA_PIPELINE__MAX_POLL_ATTEMPTS", "7");

        let config = Config::load().unwrap();
        assert_eq!(config.server.port, 8123);
        assert_eq!(config.pipeline.max_poll_attempts, 7);

        std::env::remove_var("PIXELNOVA_SERVER__PORT");
        std::env::remove_var("PIXELNOVA_PIPELINE__MAX_POLL_ATTEMPTS");
    }
}
