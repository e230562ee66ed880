use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Time source so expiry can be exercised deterministically.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Lifetimes for memoized lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CachePolicy {
    /// How long a found value is trusted.
    pub positive_ttl_secs: i64,
    /// How long a confirmed "no data" answer is trusted. Zero disables negative caching.
    pub negative_ttl_secs: i64,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            positive_ttl_secs: 7 * 24 * 60 * 60,
            negative_ttl_secs: 15 * 60,
        }
    }
}

impl CachePolicy {
    /// Longest lifetime any memoized lookup may have (ten years).
    pub const MAX_TTL_SECS: i64 = 10 * 365 * 24 * 60 * 60;

    pub fn positive_ttl(&self) -> Duration {
        ttl_from_secs(self.positive_ttl_secs)
    }

    pub fn negative_ttl(&self) -> Duration {
        ttl_from_secs(self.negative_ttl_secs)
    }
}

fn ttl_from_secs(secs: i64) -> Duration {
    Duration::try_seconds(secs.clamp(0, CachePolicy::MAX_TTL_SECS)).unwrap_or_else(Duration::zero)
}

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    expires_at: DateTime<Utc>,
}

/// Typed-key cache with per-entry expiry.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    entries: Mutex<HashMap<K, Entry<V>>>,
}

impl<K, V> Default for TtlCache<K, V> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Live value for `key`; expired entries are evicted on read.
    pub fn get(&self, key: &K, now: DateTime<Utc>) -> Option<V> {
        let mut entries = self.lock();
        match entries.get(key) {
            Some(entry) if entry.expires_at > now => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Store `value` for `ttl`. A non-positive ttl, or one that overflows the calendar, stores nothing.
    pub fn insert(&self, key: K, value: V, ttl: Duration, now: DateTime<Utc>) {
        if ttl <= Duration::zero() {
            return;
        }
        let Some(expires_at) = now.checked_add_signed(ttl) else {
            return;
        };
        self.lock().insert(key, Entry { value, expires_at });
    }

    pub fn invalidate(&self, key: &K) -> bool {
        self.lock().remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<K, Entry<V>>> {
        // a poisoned cache only loses memoized values; keep serving
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
