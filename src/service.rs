use crate::cache::EventCache;
use crate::domain::{Event, EventType};
use crate::error::{EventsError, Result};
use crate::local_store::LocalEventStore;
use crate::mock_data;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Data source mode, fixed for the lifetime of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataMode {
    /// Serve the bundled static dataset; the cache is never consulted.
    Mock,
    /// Fetch from the upstream catalog through the cache.
    Live,
}

/// The central orchestrator: resolves the event list for an optional
/// category from the highest-priority available source, merges local
/// overrides on top, and degrades instead of failing — `get_events` always
/// returns a list, never an error.
pub struct EventService {
    client: reqwest::Client,
    gateway_url: String,
    mode: DataMode,
    mock_fallback: bool,
    cache: EventCache,
    local: Arc<LocalEventStore>,
}

impl EventService {
    pub fn new(
        gateway_url: String,
        timeout: Duration,
        mode: DataMode,
        mock_fallback: bool,
        cache: EventCache,
        local: Arc<LocalEventStore>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            gateway_url,
            mode,
            mock_fallback,
            cache,
            local,
        })
    }

    /// The authoritative event list for an optional category. Source
    /// precedence in live mode: cache, upstream, override store, static
    /// dataset (when permitted), empty list.
    pub async fn get_events(&self, event_type: Option<EventType>) -> Vec<Event> {
        match self.mode {
            DataMode::Mock => {
                debug!(
                    "Using mock data mode{}",
                    event_type.map(|t| format!(" (type: {})", t)).unwrap_or_default()
                );
                self.merge_local(filter_by_type(mock_data::mock_events(), event_type), event_type)
            }
            DataMode::Live => self.get_live_events(event_type).await,
        }
    }

    async fn get_live_events(&self, event_type: Option<EventType>) -> Vec<Event> {
        if let Some(cached) = self.cache.get(event_type).await {
            debug!(
                "Found {} cached events{}",
                cached.len(),
                event_type.map(|t| format!(" (type: {})", t)).unwrap_or_default()
            );
            return self.merge_local(cached, event_type);
        }
        debug!(
            "Cache miss{}",
            event_type.map(|t| format!(" (type: {})", t)).unwrap_or_default()
        );

        match self.fetch_upstream(event_type).await {
            Ok(events) => {
                // Cache the raw upstream result only; the override-merged
                // view must never leak into the shared cache.
                self.cache.set(&events, event_type).await;
                debug!("Fetched {} events from gateway", events.len());
                self.merge_local(events, event_type)
            }
            Err(e) => {
                warn!("Error fetching events from gateway, trying local events: {}", e);
                if self.local.count() > 0 {
                    let local_events = self.local.list(event_type);
                    if !local_events.is_empty() {
                        info!("Using {} local events as fallback", local_events.len());
                        return local_events;
                    }
                }
                if self.mock_fallback {
                    debug!("Using mock data as fallback");
                    return filter_by_type(mock_data::mock_events(), event_type);
                }
                warn!("Gateway unavailable and mock fallback disabled, returning empty list");
                Vec::new()
            }
        }
    }

    async fn fetch_upstream(&self, event_type: Option<EventType>) -> Result<Vec<Event>> {
        let url = match event_type {
            Some(t) => format!("{}/catalog/events/{}", self.gateway_url, t.as_str()),
            None => format!("{}/catalog/events", self.gateway_url),
        };
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| EventsError::Upstream(e.to_string()))?;
        if !response.status().is_success() {
            return Err(EventsError::Upstream(format!(
                "gateway returned {}",
                response.status()
            )));
        }
        let events = response
            .json::<Vec<Event>>()
            .await
            .map_err(|e| EventsError::Upstream(e.to_string()))?;
        Ok(events)
    }

    /// Merge local overrides on top of `events`, skipping the merge pass
    /// entirely when the store is empty.
    fn merge_local(&self, events: Vec<Event>, event_type: Option<EventType>) -> Vec<Event> {
        if self.local.count() == 0 {
            return events;
        }
        let local_events = self.local.list(event_type);
        debug!(
            "Merging {} local events with {} source events",
            local_events.len(),
            events.len()
        );
        merge_events(local_events, events)
    }
}

/// Local entries first and winning every uuid collision; `other` entries
/// keep their relative order. No field-level reconciliation.
pub fn merge_events(local: Vec<Event>, other: Vec<Event>) -> Vec<Event> {
    let local_uuids: HashSet<Uuid> = local.iter().map(|e| e.uuid).collect();
    let mut merged = local;
    merged.extend(other.into_iter().filter(|e| !local_uuids.contains(&e.uuid)));
    merged
}

fn filter_by_type(events: Vec<Event>, event_type: Option<EventType>) -> Vec<Event> {
    match event_type {
        Some(t) => events.into_iter().filter(|e| e.matches_type(t)).collect(),
        None => events,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

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

    #[test]
    fn merge_puts_local_first_and_wins_collisions() {
        let shared = Uuid::new_v4();
        let local = vec![event(shared, "Local A", "concert")];
        let other = vec![
            event(shared, "Upstream A", "concert"),
            event(Uuid::new_v4(), "Upstream B", "concert"),
        ];

        let merged = merge_events(local, other);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].title, "Local A");
        assert_eq!(merged[1].title, "Upstream B");
    }

    #[test]
    fn merge_is_idempotent_under_re_merge() {
        let shared = Uuid::new_v4();
        let local = vec![event(shared, "Local A", "concert")];
        let other = vec![
            event(shared, "Upstream A", "concert"),
            event(Uuid::new_v4(), "Upstream B", "sport"),
        ];

        let once = merge_events(local.clone(), other);
        let twice = merge_events(local, once.clone());

        let once_uuids: Vec<Uuid> = once.iter().map(|e| e.uuid).collect();
        let twice_uuids: Vec<Uuid> = twice.iter().map(|e| e.uuid).collect();
        assert_eq!(once_uuids, twice_uuids);

        let distinct: HashSet<Uuid> = once_uuids.iter().copied().collect();
        assert_eq!(distinct.len(), once.len());
    }

    #[test]
    fn type_filter_scopes_the_static_dataset() {
        let events = vec![
            event(Uuid::new_v4(), "A", "concert"),
            event(Uuid::new_v4(), "B", "sport"),
            event(Uuid::new_v4(), "C", "unrecognized_type"),
        ];
        let concerts = filter_by_type(events.clone(), Some(EventType::Concert));
        assert_eq!(concerts.len(), 1);
        // Unknown upstream categories survive unscoped queries but never
        // match a scoped one.
        assert_eq!(filter_by_type(events, None).len(), 3);
    }
}
