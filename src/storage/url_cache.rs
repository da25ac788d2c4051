use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Clone)]
struct CacheEntry {
    url: String,
    expires_at: DateTime<Utc>,
    inserted_at: DateTime<Utc>,
}

/// Capacity-bounded cache of presigned URLs keyed by storage path.
///
/// Entries self-invalidate a safety margin before the URL actually
/// expires, so a hit always has usable remaining lifetime. When the
/// cache fills, the oldest half of the entries is evicted.
pub struct PresignCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    capacity: usize,
    margin: Duration,
}

impl PresignCache {
    pub fn new(capacity: usize, margin_secs: i64) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            capacity: capacity.max(2),
            margin: Duration::seconds(margin_secs),
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().expect("presign cache lock poisoned");
        let entry = entries.get(key)?;
        if entry.expires_at - self.margin <= Utc::now() {
            return None;
        }
        Some(entry.url.clone())
    }

    pub fn insert(&self, key: String, url: String, expires_at: DateTime<Utc>) {
        let mut entries = self.entries.lock().expect("presign cache lock poisoned");

        if entries.len() >= self.capacity && !entries.contains_key(&key) {
            Self::evict_oldest_half(&mut entries);
        }

        entries.insert(
            key,
            CacheEntry {
                url,
                expires_at,
                inserted_at: Utc::now(),
            },
        );
    }

    pub fn remove(&self, key: &str) {
        self.entries
            .lock()
            .expect("presign cache lock poisoned")
            .remove(key);
    }

    /// Drop entries past their (margin-adjusted) expiry
    pub fn cleanup(&self) -> usize {
        let mut entries = self.entries.lock().expect("presign cache lock poisoned");
        let now = Utc::now();
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at - self.margin > now);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("presign cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn evict_oldest_half(entries: &mut HashMap<String, CacheEntry>) {
        let mut by_age: Vec<(String, DateTime<Utc>)> = entries
            .iter()
            .map(|(key, entry)| (key.clone(), entry.inserted_at))
            .collect();
        by_age.sort_by_key(|(_, inserted_at)| *inserted_at);

        let to_evict = by_age.len() / 2;
        for (key, _) in by_age.into_iter().take(to_evict) {
            entries.remove(&key);
        }
    }
}
