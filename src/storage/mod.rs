//! Object storage adapter
//!
//! Generated images land in an external object store behind a narrow
//! put/presign interface. Presigned URLs are cached with an expiry
//! margin so hot paths do not re-issue links on every read.

pub mod http;
pub mod memory;
pub mod url_cache;

use crate::error::AppError;
use async_trait::async_trait;
use bytes::Bytes;

pub use http::HttpObjectStore;
pub use memory::MemoryObjectStore;
pub use url_cache::PresignCache;

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload an object, overwriting any existing one at the key
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> Result<(), AppError>;

    /// Issue a time-limited read URL for an object
    async fn presign(&self, key: &str, ttl_secs: u64) -> Result<String, AppError>;
}

/// Storage key for a generated image: scoped by user, unique by time
pub fn generated_image_key(user_id: i32, epoch_millis: i64) -> String {
    format!("{user_id}/{epoch_millis}-enhanced.png")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_image_key_layout() {
        assert_eq!(generated_image_key(42, 1700000000000), "42/1700000000000-enhanced.png");
    }
}
