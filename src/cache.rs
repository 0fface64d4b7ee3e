use crate::domain::{Event, EventType};
use crate::kv::KvStore;
use std::sync::Arc;
use tracing::{debug, warn};

const CACHE_PREFIX: &str = "bot:events-cache";

/// Time-boxed cache of upstream result sets, one entry per category plus
/// one for the unscoped listing. Strictly best-effort: a backend error on
/// read is a miss, a backend error on write is dropped, and neither is ever
/// surfaced to the caller.
pub struct EventCache {
    kv: Option<Arc<dyn KvStore>>,
    ttl_seconds: u64,
}

impl EventCache {
    pub fn new(kv: Option<Arc<dyn KvStore>>, ttl_seconds: u64) -> Self {
        Self { kv, ttl_seconds }
    }

    /// Whether a backend is configured at all. Without one every `get` is a
    /// miss and every `set` is a no-op.
    pub fn is_enabled(&self) -> bool {
        self.kv.is_some()
    }

    pub async fn get(&self, event_type: Option<EventType>) -> Option<Vec<Event>> {
        let kv = self.kv.as_ref()?;
        let key = cache_key(event_type);
        let raw = match kv.get(&key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("Cache read failed for {}: {}", key, e);
                return None;
            }
        };
        match serde_json::from_str::<Vec<Event>>(&raw) {
            Ok(events) => Some(events),
            Err(e) => {
                warn!("Discarding unreadable cache entry {}: {}", key, e);
                None
            }
        }
    }

    pub async fn set(&self, events: &[Event], event_type: Option<EventType>) {
        let Some(kv) = self.kv.as_ref() else {
            return;
        };
        let key = cache_key(event_type);
        let raw = match serde_json::to_string(events) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Failed to serialize events for cache key {}: {}", key, e);
                return;
            }
        };
        match kv.set_ex(&key, &raw, self.ttl_seconds).await {
            Ok(()) => debug!(
                "Cached {} events with key: {}, TTL: {}s",
                events.len(),
                key,
                self.ttl_seconds
            ),
            Err(e) => warn!("Cache write failed for {}: {}", key, e),
        }
    }
}

fn cache_key(event_type: Option<EventType>) -> String {
    match event_type {
        Some(t) => format!("{}:{}", CACHE_PREFIX, t.as_str()),
        None => format!("{}:all", CACHE_PREFIX),
    }
}
