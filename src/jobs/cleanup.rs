//! Background job: evict expired key-liveness verdicts.
//!
//! Only started when verdict caching is enabled. Runs once per minute.

use std::time::Duration;
use tokio::time;

use crate::cache::LivenessCache;

/// Spawn the background sweep task. Call this once at startup.
pub fn spawn(cache: LivenessCache) {
    if !cache.is_enabled() {
        return;
    }
    tokio::spawn(async move {
        let mut interval = time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            let evicted = cache.evict_expired();
            if evicted > 0 {
                tracing::debug!(evicted, remaining = cache.len(), "evicted expired key verdicts");
            }
        }
    });
}
