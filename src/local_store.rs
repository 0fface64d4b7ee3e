use crate::domain::{Event, EventPatch, EventType};
use crate::error::{EventsError, Result};
use crate::kv::KvStore;
use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};
use uuid::Uuid;

const STORE_KEY: &str = "bot:local-events";

/// Operator-writable table of events keyed by uuid, kept in memory and
/// mirrored to the key-value backend as a full JSON snapshot on every
/// mutation. The in-memory write is authoritative; persistence failures
/// are logged and swallowed. Entries keep insertion order.
pub struct LocalEventStore {
    events: Mutex<Vec<Event>>,
    kv: Option<Arc<dyn KvStore>>,
}

/// Per-item outcome report for a batch insert. A batch never aborts:
/// every element lands in exactly one of these three lists.
#[derive(Debug, Default, Serialize)]
pub struct BatchReport {
    pub created: Vec<Uuid>,
    pub skipped: Vec<BatchSkip>,
    pub failed: Vec<BatchFailure>,
}

#[derive(Debug, Serialize)]
pub struct BatchSkip {
    pub uuid: Uuid,
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct BatchFailure {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<Uuid>,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct StoreStats {
    pub total: usize,
    pub by_type: HashMap<String, usize>,
}

impl LocalEventStore {
    /// Creates the store and, when a backend is configured, attempts to
    /// restore the previously persisted snapshot. A load failure leaves the
    /// store empty; startup never aborts over it.
    pub async fn open(kv: Option<Arc<dyn KvStore>>) -> Self {
        let store = Self {
            events: Mutex::new(Vec::new()),
            kv,
        };
        store.restore().await;
        store
    }

    async fn restore(&self) {
        let Some(kv) = self.kv.as_ref() else {
            debug!("No key-value backend configured, local events are in-memory only");
            return;
        };
        match kv.get(STORE_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<Event>>(&raw) {
                Ok(events) => {
                    info!("Loaded {} local events from backend", events.len());
                    *self.events.lock().unwrap() = events;
                }
                Err(e) => warn!("Failed to deserialize persisted local events: {}", e),
            },
            Ok(None) => {}
            Err(e) => warn!("Failed to load local events from backend: {}", e),
        }
    }

    /// Serializes the whole current set to the backend. Best-effort.
    async fn persist(&self) {
        let Some(kv) = self.kv.as_ref() else {
            return;
        };
        let snapshot = self.events.lock().unwrap().clone();
        let raw = match serde_json::to_string(&snapshot) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Failed to serialize local events: {}", e);
                return;
            }
        };
        match kv.set(STORE_KEY, &raw).await {
            Ok(()) => debug!("Saved {} local events to backend", snapshot.len()),
            Err(e) => warn!("Failed to save local events to backend: {}", e),
        }
    }

    fn validate(event: &Event) -> Result<()> {
        if event.uuid.is_nil() {
            return Err(EventsError::Validation("missing uuid".to_string()));
        }
        if event.title.is_empty() {
            return Err(EventsError::Validation("missing title".to_string()));
        }
        if event.event_type.is_empty() {
            return Err(EventsError::Validation("missing event_type".to_string()));
        }
        Ok(())
    }

    /// Insert without persistence; shared by `insert` and `insert_batch`.
    fn insert_in_memory(&self, mut event: Event) -> Result<Event> {
        Self::validate(&event)?;
        let mut events = self.events.lock().unwrap();
        if events.iter().any(|e| e.uuid == event.uuid) {
            return Err(EventsError::Conflict(event.uuid));
        }
        if event.created_at.is_none() {
            event.created_at = Some(Utc::now());
        }
        events.push(event.clone());
        Ok(event)
    }

    pub async fn insert(&self, event: Event) -> Result<Event> {
        let stored = self.insert_in_memory(event)?;
        self.persist().await;
        debug!("Added local event {} ({})", stored.uuid, stored.title);
        Ok(stored)
    }

    /// Applies `insert` semantics per element and reports each outcome.
    /// The snapshot is persisted once, after the whole batch.
    pub async fn insert_batch(&self, events: Vec<Event>) -> BatchReport {
        let mut report = BatchReport::default();
        for event in events {
            let uuid = event.uuid;
            match self.insert_in_memory(event) {
                Ok(stored) => report.created.push(stored.uuid),
                Err(EventsError::Conflict(uuid)) => report.skipped.push(BatchSkip {
                    uuid,
                    reason: "already_exists".to_string(),
                }),
                Err(e) => report.failed.push(BatchFailure {
                    uuid: if uuid.is_nil() { None } else { Some(uuid) },
                    error: e.to_string(),
                }),
            }
        }
        self.persist().await;
        debug!(
            "Batch added: {} created, {} skipped, {} failed",
            report.created.len(),
            report.skipped.len(),
            report.failed.len()
        );
        report
    }

    pub fn get(&self, uuid: Uuid) -> Option<Event> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.uuid == uuid)
            .cloned()
    }

    /// All stored events in insertion order, optionally scoped to one
    /// category.
    pub fn list(&self, event_type: Option<EventType>) -> Vec<Event> {
        let events = self.events.lock().unwrap();
        match event_type {
            Some(t) => events.iter().filter(|e| e.matches_type(t)).cloned().collect(),
            None => events.clone(),
        }
    }

    pub async fn update(&self, uuid: Uuid, patch: EventPatch) -> Result<Event> {
        let updated = {
            let mut events = self.events.lock().unwrap();
            let event = events
                .iter_mut()
                .find(|e| e.uuid == uuid)
                .ok_or(EventsError::NotFound(uuid))?;
            patch.apply(event);
            event.clone()
        };
        self.persist().await;
        debug!("Updated local event {}", uuid);
        Ok(updated)
    }

    pub async fn delete(&self, uuid: Uuid) -> Result<()> {
        {
            let mut events = self.events.lock().unwrap();
            let before = events.len();
            events.retain(|e| e.uuid != uuid);
            if events.len() == before {
                return Err(EventsError::NotFound(uuid));
            }
        }
        self.persist().await;
        debug!("Deleted local event {}", uuid);
        Ok(())
    }

    pub fn count(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn stats(&self) -> StoreStats {
        let events = self.events.lock().unwrap();
        let mut by_type: HashMap<String, usize> = HashMap::new();
        for event in events.iter() {
            *by_type.entry(event.event_type.clone()).or_insert(0) += 1;
        }
        StoreStats {
            total: events.len(),
            by_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::InMemoryKv;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};

    /// Backend whose every call fails; persistence must degrade to
    /// memory-only without surfacing errors.
    struct FailingKv;

    #[async_trait]
    impl KvStore for FailingKv {
        async fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(EventsError::Backend("connection refused".to_string()))
        }

        async fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Err(EventsError::Backend("connection refused".to_string()))
        }

        async fn set_ex(&self, _key: &str, _value: &str, _ttl_seconds: u64) -> Result<()> {
            Err(EventsError::Backend("connection refused".to_string()))
        }

        async fn delete(&self, _key: &str) -> Result<()> {
            Err(EventsError::Backend("connection refused".to_string()))
        }
    }

    fn event(uuid: Uuid, title: &str, event_type: &str) -> Event {
        Event {
            id: 0,
            uuid,
            source_id: None,
            title: title.to_string(),
            description: String::new(),
            price: 0.0,
            date_preview: Utc.with_ymd_and_hms(2026, 10, 1, 19, 0, 0).unwrap(),
            date_list: vec![],
            place: String::new(),
            event_type: event_type.to_string(),
            genre: String::new(),
            age: None,
            image_url: String::new(),
            url: String::new(),
            created_at: None,
        }
    }

    #[tokio::test]
    async fn test_count_tracks_distinct_inserts() {
        let store = LocalEventStore::open(None).await;
        for i in 0..5 {
            store
                .insert(event(Uuid::new_v4(), &format!("Event {}", i), "concert"))
                .await
                .unwrap();
        }
        assert_eq!(store.count(), 5);
    }

    #[tokio::test]
    async fn test_insert_backfills_created_at() {
        let store = LocalEventStore::open(None).await;
        let stored = store
            .insert(event(Uuid::new_v4(), "A", "concert"))
            .await
            .unwrap();
        assert!(stored.created_at.is_some());
    }

    #[tokio::test]
    async fn test_conflict_leaves_stored_record_unchanged() {
        let store = LocalEventStore::open(None).await;
        let uuid = Uuid::new_v4();
        store.insert(event(uuid, "Original", "concert")).await.unwrap();

        let result = store.insert(event(uuid, "Imposter", "sport")).await;
        assert!(matches!(result, Err(EventsError::Conflict(u)) if u == uuid));
        assert_eq!(store.get(uuid).unwrap().title, "Original");
        assert_eq!(store.count(), 1);
    }

    #[tokio::test]
    async fn test_batch_reports_per_item_outcomes() {
        let store = LocalEventStore::open(None).await;
        let existing = Uuid::new_v4();
        store.insert(event(existing, "Existing", "concert")).await.unwrap();

        let invalid = event(Uuid::new_v4(), "", "concert");

        let report = store
            .insert_batch(vec![
                event(Uuid::new_v4(), "Fresh", "sport"),
                event(existing, "Duplicate", "concert"),
                invalid,
            ])
            .await;

        assert_eq!(report.created.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].reason, "already_exists");
        assert_eq!(report.failed.len(), 1);
        assert_eq!(store.count(), 2);
    }

    #[tokio::test]
    async fn test_list_preserves_insertion_order_and_filters() {
        let store = LocalEventStore::open(None).await;
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        store.insert(event(a, "A", "concert")).await.unwrap();
        store.insert(event(b, "B", "sport")).await.unwrap();
        store.insert(event(c, "C", "concert")).await.unwrap();

        let all: Vec<Uuid> = store.list(None).into_iter().map(|e| e.uuid).collect();
        assert_eq!(all, vec![a, b, c]);

        let concerts = store.list(Some(EventType::Concert));
        assert_eq!(concerts.len(), 2);
        assert!(concerts.iter().all(|e| e.event_type == "concert"));
    }

    #[tokio::test]
    async fn test_update_merges_partial_fields() {
        let store = LocalEventStore::open(None).await;
        let uuid = Uuid::new_v4();
        store.insert(event(uuid, "A", "concert")).await.unwrap();

        let patch = EventPatch {
            price: Some(750.0),
            ..Default::default()
        };
        let updated = store.update(uuid, patch).await.unwrap();
        assert_eq!(updated.price, 750.0);
        assert_eq!(updated.title, "A");
        assert_eq!(updated.uuid, uuid);

        let missing = store.update(Uuid::new_v4(), EventPatch::default()).await;
        assert!(matches!(missing, Err(EventsError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete() {
        let store = LocalEventStore::open(None).await;
        let uuid = Uuid::new_v4();
        store.insert(event(uuid, "A", "concert")).await.unwrap();
        store.delete(uuid).await.unwrap();
        assert_eq!(store.count(), 0);
        assert!(matches!(
            store.delete(uuid).await,
            Err(EventsError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_snapshot_survives_restart() {
        let kv: Arc<dyn KvStore> = Arc::new(InMemoryKv::new());
        let uuid = Uuid::new_v4();
        {
            let store = LocalEventStore::open(Some(kv.clone())).await;
            store.insert(event(uuid, "Persisted", "concert")).await.unwrap();
        }
        let reopened = LocalEventStore::open(Some(kv)).await;
        assert_eq!(reopened.count(), 1);
        assert_eq!(reopened.get(uuid).unwrap().title, "Persisted");
    }

    #[tokio::test]
    async fn test_broken_backend_leaves_memory_authoritative() {
        // Load fails at open, every persist fails afterwards; none of it
        // reaches the caller and the in-memory table keeps working.
        let store = LocalEventStore::open(Some(Arc::new(FailingKv))).await;
        let uuid = Uuid::new_v4();

        store.insert(event(uuid, "Unpersisted", "concert")).await.unwrap();
        assert_eq!(store.count(), 1);
        assert_eq!(store.get(uuid).unwrap().title, "Unpersisted");

        let patch = EventPatch {
            title: Some("Still here".to_string()),
            ..Default::default()
        };
        store.update(uuid, patch).await.unwrap();
        assert_eq!(store.get(uuid).unwrap().title, "Still here");

        store.delete(uuid).await.unwrap();
        assert_eq!(store.count(), 0);
    }

    #[tokio::test]
    async fn test_stats_counts_per_type() {
        let store = LocalEventStore::open(None).await;
        store.insert(event(Uuid::new_v4(), "A", "concert")).await.unwrap();
        store.insert(event(Uuid::new_v4(), "B", "concert")).await.unwrap();
        store.insert(event(Uuid::new_v4(), "C", "sport")).await.unwrap();

        let stats = store.stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.by_type["concert"], 2);
        assert_eq!(stats.by_type["sport"], 1);
    }
}
