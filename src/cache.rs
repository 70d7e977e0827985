use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::models::user::User;

/// Verdict stored per user, tied to the key it was computed for.
#[derive(Clone)]
struct CacheEntry {
    api_key: String,
    active: bool,
    expires_at: Instant,
}

/// Short-lived memory of key liveness verdicts.
///
/// With a zero TTL the cache is disabled and every protected request
/// re-validates its key upstream. Entries are keyed by user id and only
/// match while the stored key is unchanged, so a rotated key is always
/// checked afresh. Expired entries are evicted lazily on read.
#[derive(Clone)]
pub struct LivenessCache {
    local: Arc<DashMap<i64, CacheEntry>>,
    ttl: Duration,
}

impl LivenessCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            local: Arc::new(DashMap::new()),
            ttl,
        }
    }

    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    pub fn get(&self, user: &User) -> Option<bool> {
        if !self.is_enabled() {
            return None;
        }
        if let Some(entry) = self.local.get(&user.id) {
            if Instant::now() < entry.expires_at && entry.api_key == user.api_key {
                return Some(entry.active);
            }
            // stale: release the shard lock before removing
            drop(entry);
            self.local.remove(&user.id);
        }
        None
    }

    pub fn put(&self, user: &User, active: bool) {
        if !self.is_enabled() {
            return;
        }
        self.local.insert(
            user.id,
            CacheEntry {
                api_key: user.api_key.clone(),
                active,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    pub fn invalidate(&self, user_id: i64) {
        self.local.remove(&user_id);
    }

    /// Remove all expired entries. Call this periodically from a
    /// background task to bound memory usage.
    pub fn evict_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.local.len();
        self.local.retain(|_, entry| entry.expires_at > now);
        before - self.local.len()
    }

    pub fn len(&self) -> usize {
        self.local.len()
    }

    pub fn is_empty(&self) -> bool {
        self.local.is_empty()
    }
}
